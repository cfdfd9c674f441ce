use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    BankTransaction, EngineError, NewBankTransaction, ResultEngine, bank_accounts,
    bank_transactions, util,
};

use super::{Engine, with_tx};

impl Engine {
    /// Adds a bank account to a ledger.
    ///
    /// Account names are unique inside a ledger after normalization.
    pub async fn new_bank_account(
        &self,
        ledger_id: Uuid,
        name: &str,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = util::normalize_required_name(name, "bank account")?;
        let name_norm = util::normalize_key(&name);
        with_tx!(self, |db_tx| {
            self.require_ledger_write(&db_tx, ledger_id, user_id).await?;

            let exists = bank_accounts::Entity::find()
                .filter(bank_accounts::Column::LedgerId.eq(ledger_id))
                .filter(bank_accounts::Column::NameNorm.eq(name_norm.clone()))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let id = Uuid::new_v4();
            bank_accounts::ActiveModel {
                id: ActiveValue::Set(id),
                ledger_id: ActiveValue::Set(ledger_id),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
            }
            .insert(&db_tx)
            .await?;
            Ok(id)
        })
    }

    /// Records a bank transaction as reported by the bank. It starts unmatched.
    pub async fn record_bank_transaction(
        &self,
        ledger_id: Uuid,
        bank_account_id: Uuid,
        input: NewBankTransaction,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let input = NewBankTransaction {
            description: input.description.trim().to_string(),
            counterparty: util::normalize_optional_text(input.counterparty.as_deref()),
            ..input
        };
        with_tx!(self, |db_tx| {
            self.require_ledger_write(&db_tx, ledger_id, user_id).await?;
            self.require_bank_account_in_ledger(&db_tx, ledger_id, bank_account_id)
                .await?;

            let tx = BankTransaction::new(bank_account_id, input);
            let model: bank_transactions::ActiveModel = (&tx).into();
            model.insert(&db_tx).await?;
            Ok(tx.id)
        })
    }

    /// Return a single bank transaction.
    pub async fn bank_transaction(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        bank_account_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<BankTransaction> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            self.require_bank_account_in_ledger(&db_tx, ledger_id, bank_account_id)
                .await?;
            self.require_bank_transaction(&db_tx, bank_account_id, transaction_id)
                .await
        })
    }

    /// Unmatched transactions of a bank account, oldest first.
    pub async fn unmatched_transactions(
        &self,
        ledger_id: Uuid,
        bank_account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<BankTransaction>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            self.require_bank_account_in_ledger(&db_tx, ledger_id, bank_account_id)
                .await?;
            let rows = bank_transactions::Entity::find()
                .filter(bank_transactions::Column::BankAccountId.eq(bank_account_id))
                .filter(bank_transactions::Column::MatchedBookingId.is_null())
                .order_by_asc(bank_transactions::Column::OccurredAt)
                .order_by_asc(bank_transactions::Column::Id)
                .all(&db_tx)
                .await?;
            Ok(rows.into_iter().map(BankTransaction::from).collect())
        })
    }

    pub(super) async fn require_bank_account_in_ledger(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        bank_account_id: Uuid,
    ) -> ResultEngine<bank_accounts::Model> {
        bank_accounts::Entity::find_by_id(bank_account_id)
            .filter(bank_accounts::Column::LedgerId.eq(ledger_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bank_account not exists".to_string()))
    }

    pub(super) async fn require_bank_transaction(
        &self,
        db: &DatabaseTransaction,
        bank_account_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<BankTransaction> {
        bank_transactions::Entity::find_by_id(transaction_id)
            .filter(bank_transactions::Column::BankAccountId.eq(bank_account_id))
            .one(db)
            .await?
            .map(BankTransaction::from)
            .ok_or_else(|| EngineError::KeyNotFound("bank_transaction not exists".to_string()))
    }
}
