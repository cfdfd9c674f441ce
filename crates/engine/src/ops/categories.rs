use std::collections::HashSet;

use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Category, CategoryForest, EngineError, ResultEngine, categories, util};

use super::{Engine, with_tx};

impl Engine {
    /// Adds a category to a ledger, optionally below `parent_id`.
    ///
    /// The parent must belong to the same ledger. Sibling names are unique
    /// after normalization.
    pub async fn new_category(
        &self,
        ledger_id: Uuid,
        name: &str,
        description: Option<&str>,
        parent_id: Option<Uuid>,
        user_id: &str,
    ) -> ResultEngine<Uuid> {
        let name = util::normalize_required_name(name, "category")?;
        let name_norm = util::normalize_key(&name);
        let description = util::normalize_optional_text(description);
        with_tx!(self, |db_tx| {
            self.require_ledger_write(&db_tx, ledger_id, user_id).await?;

            let mut siblings = categories::Entity::find()
                .filter(categories::Column::LedgerId.eq(ledger_id))
                .filter(categories::Column::NameNorm.eq(name_norm.clone()));
            siblings = match parent_id {
                Some(parent_id) => {
                    categories::Entity::find_by_id(parent_id)
                        .filter(categories::Column::LedgerId.eq(ledger_id))
                        .one(&db_tx)
                        .await?
                        .ok_or_else(|| {
                            EngineError::KeyNotFound("parent category not exists".to_string())
                        })?;
                    siblings.filter(categories::Column::ParentId.eq(parent_id))
                }
                None => siblings.filter(categories::Column::ParentId.is_null()),
            };
            if siblings.one(&db_tx).await?.is_some() {
                return Err(EngineError::ExistingKey(name));
            }

            let category = Category::new(ledger_id, name, description, parent_id);
            categories::ActiveModel::from_category(&category, name_norm)
                .insert(&db_tx)
                .await?;
            Ok(category.id)
        })
    }

    /// Every category of the ledger, sorted by name.
    pub async fn categories(&self, user_id: &str, ledger_id: Uuid) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            self.load_categories(&db_tx, ledger_id).await
        })
    }

    /// `top_ids` plus all their descendants. Ids outside the ledger resolve
    /// to nothing; an empty `top_ids` means every category.
    pub async fn category_descendant_ids(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        top_ids: &[Uuid],
    ) -> ResultEngine<HashSet<Uuid>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            let forest = CategoryForest::new(self.load_categories(&db_tx, ledger_id).await?);
            Ok(forest.descendant_ids(top_ids))
        })
    }

    pub(super) async fn load_categories(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
    ) -> ResultEngine<Vec<Category>> {
        let rows = categories::Entity::find()
            .filter(categories::Column::LedgerId.eq(ledger_id))
            .order_by_asc(categories::Column::Name)
            .order_by_asc(categories::Column::Id)
            .all(db)
            .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }
}
