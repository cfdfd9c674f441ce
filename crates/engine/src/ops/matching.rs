use sea_orm::{QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, allocate_booking, bank_transactions, select_matcher};

use super::{Engine, with_tx};

impl Engine {
    /// Books an unmatched bank transaction with the given matcher.
    ///
    /// Checks, in order: write access to the ledger, the bank account belongs
    /// to the ledger, the transaction belongs to the account and is not
    /// matched yet, the matcher belongs to the ledger and its filters hold.
    /// The allocated booking and the transaction's match reference are
    /// written in the same transaction; on any error neither is kept.
    ///
    /// The match reference is set with a conditional update, so of two
    /// concurrent calls for the same transaction only one succeeds; the other
    /// fails with [`EngineError::AlreadyMatched`].
    ///
    /// Returns the id of the new booking.
    #[tracing::instrument(skip(self), err)]
    pub async fn execute_match(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        bank_account_id: Uuid,
        transaction_id: Uuid,
        matcher_id: Uuid,
    ) -> ResultEngine<Uuid> {
        with_tx!(self, |db_tx| {
            if !self
                .writable_ledger_ids(&db_tx, user_id)
                .await?
                .contains(&ledger_id)
            {
                return Err(EngineError::Forbidden(format!(
                    "user '{user_id}' has no write access to ledger {ledger_id}"
                )));
            }
            self.require_bank_account_in_ledger(&db_tx, ledger_id, bank_account_id)
                .await?;
            let tx = self
                .require_bank_transaction(&db_tx, bank_account_id, transaction_id)
                .await?;
            if let Some(booking_id) = tx.matched_booking_id {
                return Err(EngineError::AlreadyMatched(format!(
                    "transaction {transaction_id} is booked as {booking_id}"
                )));
            }

            let matchers = self.load_matchers(&db_tx, ledger_id).await?;
            let matcher = select_matcher(&tx, &matchers, matcher_id).inspect_err(|err| {
                tracing::debug!(%err, "matcher rejected");
            })?;
            let booking = allocate_booking(ledger_id, &matcher.target, &tx)?;
            if !booking.is_balanced() {
                tracing::warn!(
                    matcher = %matcher.name,
                    total_minor = ?booking.total_minor(),
                    "allocated booking does not balance"
                );
            }

            let booking_id = self.insert_booking(&db_tx, &booking).await?;
            let updated = bank_transactions::Entity::update_many()
                .col_expr(
                    bank_transactions::Column::MatchedBookingId,
                    Expr::value(booking_id),
                )
                .filter(bank_transactions::Column::Id.eq(transaction_id))
                .filter(bank_transactions::Column::MatchedBookingId.is_null())
                .exec(&db_tx)
                .await?;
            if updated.rows_affected == 0 {
                return Err(EngineError::AlreadyMatched(format!(
                    "transaction {transaction_id} was matched concurrently"
                )));
            }

            tracing::info!(
                %booking_id,
                matcher = %matcher.name,
                records = booking.records.len(),
                "booking persisted"
            );
            Ok(booking_id)
        })
    }
}
