//! Bank transactions.
//!
//! A [`BankTransaction`] is a single movement on a bank account as reported
//! by the bank. It is turned into a booking by a matcher; once matched it
//! carries the booking id in `matched_booking_id` and can never be matched
//! again.
//!
//! Amounts are signed integer **minor units**: positive values are money
//! coming in, negative values money going out.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub amount_minor: i64,
    pub description: String,
    pub counterparty: Option<String>,
    pub matched_booking_id: Option<Uuid>,
}

impl BankTransaction {
    pub fn new(bank_account_id: Uuid, tx: NewBankTransaction) -> Self {
        Self {
            id: Uuid::new_v4(),
            bank_account_id,
            occurred_at: tx.occurred_at,
            amount_minor: tx.amount_minor,
            description: tx.description,
            counterparty: tx.counterparty,
            matched_booking_id: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_booking_id.is_some()
    }
}

/// Input for recording a bank transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBankTransaction {
    pub occurred_at: DateTime<Utc>,
    pub amount_minor: i64,
    pub description: String,
    pub counterparty: Option<String>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_account_id: Uuid,
    pub occurred_at: DateTimeUtc,
    pub amount_minor: i64,
    pub description: String,
    pub counterparty: Option<String>,
    pub matched_booking_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_accounts::Entity",
        from = "Column::BankAccountId",
        to = "super::bank_accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    BankAccounts,
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&BankTransaction> for ActiveModel {
    fn from(tx: &BankTransaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            bank_account_id: ActiveValue::Set(tx.bank_account_id),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            description: ActiveValue::Set(tx.description.clone()),
            counterparty: ActiveValue::Set(tx.counterparty.clone()),
            matched_booking_id: ActiveValue::Set(tx.matched_booking_id),
        }
    }
}

impl From<Model> for BankTransaction {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            bank_account_id: model.bank_account_id,
            occurred_at: model.occurred_at,
            amount_minor: model.amount_minor,
            description: model.description,
            counterparty: model.counterparty,
            matched_booking_id: model.matched_booking_id,
        }
    }
}
