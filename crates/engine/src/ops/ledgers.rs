use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Ledger, ResultEngine, ledger_memberships, ledgers, util};

use super::{Engine, MembershipRole, with_tx};

/// A user sharing a ledger with its owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerMember {
    pub user_id: String,
    pub role: MembershipRole,
}

impl Engine {
    /// Creates a ledger owned by `user_id`.
    ///
    /// Ledger names are unique per owner after normalization.
    pub async fn new_ledger(&self, name: &str, user_id: &str) -> ResultEngine<Uuid> {
        let name = util::normalize_required_name(name, "ledger")?;
        let name_norm = util::normalize_key(&name);
        with_tx!(self, |db_tx| {
            self.require_user_exists(&db_tx, user_id).await?;

            let exists = ledgers::Entity::find()
                .filter(ledgers::Column::UserId.eq(user_id))
                .filter(ledgers::Column::NameNorm.eq(name_norm))
                .one(&db_tx)
                .await?
                .is_some();
            if exists {
                return Err(EngineError::ExistingKey(name));
            }

            let ledger = Ledger::new(name, user_id);
            let model: ledgers::ActiveModel = (&ledger).into();
            model.insert(&db_tx).await?;
            Ok(ledger.id)
        })
    }

    /// Return a ledger the user can read.
    pub async fn ledger(&self, ledger_id: Uuid, user_id: &str) -> ResultEngine<Ledger> {
        with_tx!(self, |db_tx| {
            let model = self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            Ok(Ledger::from(model))
        })
    }

    /// Adds or updates a ledger member (owner-only).
    pub async fn upsert_ledger_member(
        &self,
        ledger_id: Uuid,
        member_username: &str,
        role: MembershipRole,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let ledger = self.require_ledger_owner(&db_tx, ledger_id, user_id).await?;
            self.require_user_exists(&db_tx, member_username).await?;
            if member_username == ledger.user_id {
                return Err(EngineError::InvalidRole(
                    "the ledger owner cannot be a member".to_string(),
                ));
            }

            let active = ledger_memberships::ActiveModel {
                ledger_id: ActiveValue::Set(ledger_id),
                user_id: ActiveValue::Set(member_username.to_string()),
                role: ActiveValue::Set(role.as_str().to_string()),
            };
            let existing =
                ledger_memberships::Entity::find_by_id((ledger_id, member_username.to_string()))
                    .one(&db_tx)
                    .await?;
            match existing {
                Some(_) => {
                    active.update(&db_tx).await?;
                }
                None => {
                    active.insert(&db_tx).await?;
                }
            }
            Ok(())
        })
    }

    /// Lists ledger members (owner-only), sorted by username.
    pub async fn ledger_members(
        &self,
        ledger_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Vec<LedgerMember>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_owner(&db_tx, ledger_id, user_id).await?;
            let rows = ledger_memberships::Entity::find()
                .filter(ledger_memberships::Column::LedgerId.eq(ledger_id))
                .order_by_asc(ledger_memberships::Column::UserId)
                .all(&db_tx)
                .await?;
            rows.into_iter()
                .map(|m| {
                    Ok(LedgerMember {
                        role: MembershipRole::try_from(m.role.as_str())?,
                        user_id: m.user_id,
                    })
                })
                .collect::<ResultEngine<Vec<_>>>()
        })
    }
}
