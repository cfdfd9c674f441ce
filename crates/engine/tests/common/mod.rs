#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use uuid::Uuid;

use engine::{
    BookingRule, Engine, Filter, MembershipRole, MultipleCategoriesBooking, NewBankTransaction,
    Target,
};
use migration::MigratorTrait;

pub async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for username in ["alice", "bob", "carol", "mallory"] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username) VALUES (?)",
            vec![username.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

pub fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

/// alice's household ledger: one bank account and a small category forest.
///
/// ```text
/// Checking
/// Expense
///   Food
///   Transport
/// Income
/// ```
///
/// bob is an editor, carol a viewer; mallory has no access.
pub struct Household {
    pub ledger_id: Uuid,
    pub account_id: Uuid,
    pub checking: Uuid,
    pub expense: Uuid,
    pub food: Uuid,
    pub transport: Uuid,
    pub income: Uuid,
}

impl Household {
    pub async fn create(engine: &Engine) -> Self {
        Self::create_for(engine, "Home").await
    }

    pub async fn create_for(engine: &Engine, ledger_name: &str) -> Self {
        let ledger_id = engine.new_ledger(ledger_name, "alice").await.unwrap();
        engine
            .upsert_ledger_member(ledger_id, "bob", MembershipRole::Editor, "alice")
            .await
            .unwrap();
        engine
            .upsert_ledger_member(ledger_id, "carol", MembershipRole::Viewer, "alice")
            .await
            .unwrap();
        let account_id = engine
            .new_bank_account(ledger_id, "Checking", "alice")
            .await
            .unwrap();

        let checking = new_category(engine, ledger_id, "Checking", None).await;
        let expense = new_category(engine, ledger_id, "Expense", None).await;
        let food = new_category(engine, ledger_id, "Food", Some(expense)).await;
        let transport = new_category(engine, ledger_id, "Transport", Some(expense)).await;
        let income = new_category(engine, ledger_id, "Income", None).await;

        Self {
            ledger_id,
            account_id,
            checking,
            expense,
            food,
            transport,
            income,
        }
    }

    pub async fn record(
        &self,
        engine: &Engine,
        amount_minor: i64,
        description: &str,
        occurred_at: DateTime<Utc>,
    ) -> Uuid {
        engine
            .record_bank_transaction(
                self.ledger_id,
                self.account_id,
                NewBankTransaction {
                    occurred_at,
                    amount_minor,
                    description: description.to_string(),
                    counterparty: None,
                },
                "alice",
            )
            .await
            .unwrap()
    }

    /// Outgoing payments containing `text`, booked on `category` against
    /// the checking account.
    pub async fn expense_matcher(&self, engine: &Engine, text: &str, category: Uuid) -> Uuid {
        engine
            .new_matcher(
                self.ledger_id,
                text,
                vec![
                    Filter::DescriptionContains {
                        text: text.to_string(),
                    },
                    Filter::Direction {
                        direction: engine::Direction::Outgoing,
                    },
                ],
                split(
                    vec![BookingRule::remaining(category)],
                    vec![BookingRule::remaining(self.checking)],
                ),
                "alice",
            )
            .await
            .unwrap()
    }

    pub async fn match_with(&self, engine: &Engine, transaction_id: Uuid, matcher_id: Uuid) -> Uuid {
        engine
            .execute_match(
                "alice",
                self.ledger_id,
                self.account_id,
                transaction_id,
                matcher_id,
            )
            .await
            .unwrap()
    }
}

pub async fn new_category(
    engine: &Engine,
    ledger_id: Uuid,
    name: &str,
    parent: Option<Uuid>,
) -> Uuid {
    engine
        .new_category(ledger_id, name, None, parent, "alice")
        .await
        .unwrap()
}

pub fn split(debit_rules: Vec<BookingRule>, credit_rules: Vec<BookingRule>) -> Target {
    Target::MultipleCategoriesBooking(MultipleCategoriesBooking {
        debit_rules,
        credit_rules,
    })
}
