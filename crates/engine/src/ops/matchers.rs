use std::collections::HashSet;

use sea_orm::{
    DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, Filter, Matcher, ResultEngine, Target, applicable_matchers, categories,
    matchers, util,
};

use super::{Engine, with_tx};

impl Engine {
    /// Stores a matcher for the ledger.
    ///
    /// Every category referenced by the target must belong to the ledger.
    /// Targets this build cannot allocate are stored as-is and fail at match
    /// time.
    pub async fn new_matcher(
        &self,
        ledger_id: Uuid,
        name: &str,
        filters: Vec<Filter>,
        target: Target,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = util::normalize_required_name(name, "matcher")?;
        let name_norm = util::normalize_key(&name);
        with_tx!(self, |db_tx| {
            self.require_ledger_write(&db_tx, ledger_id, user_id).await?;

            let exists = matchers::Entity::find()
                .filter(matchers::Column::LedgerId.eq(ledger_id))
                .filter(matchers::Column::NameNorm.eq(name_norm))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let wanted: HashSet<Uuid> = target.category_ids().into_iter().collect();
            if !wanted.is_empty() {
                let found = categories::Entity::find()
                    .filter(categories::Column::LedgerId.eq(ledger_id))
                    .filter(categories::Column::Id.is_in(wanted.iter().copied()))
                    .count(&db_tx)
                    .await?;
                if found as usize != wanted.len() {
                    return Err(EngineError::KeyNotFound("category not exists".to_string()));
                }
            }

            let matcher = Matcher::new(ledger_id, name, filters, target);
            matchers::ActiveModel::try_from(&matcher)?
                .insert(&db_tx)
                .await?;
            Ok(matcher.id)
        })
    }

    /// Every matcher of the ledger, sorted by name.
    pub async fn matchers(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<Vec<Matcher>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            self.load_matchers(&db_tx, ledger_id).await
        })
    }

    /// Matchers whose filters hold for an unmatched transaction.
    pub async fn suggest_matchers(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        bank_account_id: Uuid,
        transaction_id: Uuid,
    ) -> ResultEngine<Vec<Matcher>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
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

            let all = self.load_matchers(&db_tx, ledger_id).await?;
            Ok(applicable_matchers(&tx, &all).cloned().collect())
        })
    }

    pub(super) async fn load_matchers(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
    ) -> ResultEngine<Vec<Matcher>> {
        let rows = matchers::Entity::find()
            .filter(matchers::Column::LedgerId.eq(ledger_id))
            .order_by_asc(matchers::Column::Name)
            .all(db)
            .await?;
        rows.into_iter().map(Matcher::try_from).collect()
    }
}
