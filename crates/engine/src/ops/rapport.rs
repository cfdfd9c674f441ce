use chrono::{DateTime, Utc};
use sea_orm::TransactionTrait;
use uuid::Uuid;

use crate::{CategoryForest, EngineError, RapportLeaf, ResultEngine, build_rapport_tree};

use super::{Engine, with_tx};

impl Engine {
    /// Category rapport of the ledger for `from <= occurred_at < to_exclusive`.
    ///
    /// `top_category_ids` scopes which categories contribute their own
    /// records (the ids and all their descendants); an empty slice means the
    /// whole forest. The forest and the bookings are read once, then
    /// aggregated in memory.
    #[tracing::instrument(skip(self, top_category_ids), fields(top = top_category_ids.len()), err)]
    pub async fn build_rapport(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        from: DateTime<Utc>,
        to_exclusive: DateTime<Utc>,
        top_category_ids: &[Uuid],
    ) -> ResultEngine<Vec<RapportLeaf>> {
        if from >= to_exclusive {
            return Err(EngineError::InvalidAmount(format!(
                "empty period: {from} is not before {to_exclusive}"
            )));
        }
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            let forest = CategoryForest::new(self.load_categories(&db_tx, ledger_id).await?);
            let bookings = self
                .load_bookings(&db_tx, ledger_id, from, to_exclusive)
                .await?;
            tracing::debug!(
                categories = forest.len(),
                bookings = bookings.len(),
                "aggregating rapport"
            );
            build_rapport_tree(&forest, &bookings, top_category_ids)
        })
    }
}
