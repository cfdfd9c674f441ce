use std::{collections::HashSet, fmt, str::FromStr};

use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine, ledger_memberships, ledgers, users};

use super::{Engine, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipRole {
    Owner,
    Editor,
    Viewer,
}

impl MembershipRole {
    pub const WRITERS: [MembershipRole; 2] = [Self::Owner, Self::Editor];

    pub fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Editor => "editor",
            Self::Viewer => "viewer",
        }
    }
}

impl fmt::Display for MembershipRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for MembershipRole {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "owner" => Ok(Self::Owner),
            "editor" => Ok(Self::Editor),
            "viewer" => Ok(Self::Viewer),
            other => Err(EngineError::InvalidRole(format!(
                "invalid membership role: {other}"
            ))),
        }
    }
}

impl FromStr for MembershipRole {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.trim().to_lowercase().as_str())
    }
}

fn no_access(ledger_id: Uuid, user_id: &str, what: &str) -> EngineError {
    EngineError::Forbidden(format!(
        "user '{user_id}' has no {what} access to ledger {ledger_id}"
    ))
}

impl Engine {
    /// Ids of the ledgers `user_id` may write to: owned ledgers plus
    /// memberships with a write role.
    pub async fn writable_ledgers(&self, user_id: &str) -> ResultEngine<HashSet<Uuid>> {
        with_tx!(self, |db_tx| self.writable_ledger_ids(&db_tx, user_id).await)
    }

    pub(super) async fn writable_ledger_ids(
        &self,
        db: &DatabaseTransaction,
        user_id: &str,
    ) -> ResultEngine<HashSet<Uuid>> {
        let owned = ledgers::Entity::find()
            .filter(ledgers::Column::UserId.eq(user_id))
            .all(db)
            .await?;
        let shared = ledger_memberships::Entity::find()
            .filter(ledger_memberships::Column::UserId.eq(user_id))
            .filter(
                ledger_memberships::Column::Role
                    .is_in(MembershipRole::WRITERS.map(MembershipRole::as_str)),
            )
            .all(db)
            .await?;

        Ok(owned
            .into_iter()
            .map(|l| l.id)
            .chain(shared.into_iter().map(|m| m.ledger_id))
            .collect())
    }

    async fn find_ledger(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
    ) -> ResultEngine<Option<ledgers::Model>> {
        ledgers::Entity::find_by_id(ledger_id)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Effective role of `user_id` on the ledger; the owner is always
    /// [`MembershipRole::Owner`].
    pub(super) async fn ledger_role(
        &self,
        db: &DatabaseTransaction,
        ledger: &ledgers::Model,
        user_id: &str,
    ) -> ResultEngine<Option<MembershipRole>> {
        if ledger.user_id == user_id {
            return Ok(Some(MembershipRole::Owner));
        }
        let row = ledger_memberships::Entity::find_by_id((ledger.id, user_id.to_string()))
            .one(db)
            .await?;
        row.as_ref()
            .map(|m| MembershipRole::try_from(m.role.as_str()))
            .transpose()
    }

    pub(super) async fn require_ledger_read(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<ledgers::Model> {
        let Some(ledger) = self.find_ledger(db, ledger_id).await? else {
            return Err(no_access(ledger_id, user_id, "read"));
        };
        if self.ledger_role(db, &ledger, user_id).await?.is_none() {
            return Err(no_access(ledger_id, user_id, "read"));
        }
        Ok(ledger)
    }

    pub(super) async fn require_ledger_write(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<ledgers::Model> {
        let Some(ledger) = self.find_ledger(db, ledger_id).await? else {
            return Err(no_access(ledger_id, user_id, "write"));
        };
        let role = self.ledger_role(db, &ledger, user_id).await?;
        if !role.is_some_and(MembershipRole::can_write) {
            return Err(no_access(ledger_id, user_id, "write"));
        }
        Ok(ledger)
    }

    pub(super) async fn require_ledger_owner(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<ledgers::Model> {
        match self.find_ledger(db, ledger_id).await? {
            Some(ledger) if ledger.user_id == user_id => Ok(ledger),
            _ => Err(no_access(ledger_id, user_id, "owner")),
        }
    }

    pub(super) async fn require_user_exists(
        &self,
        db: &DatabaseTransaction,
        username: &str,
    ) -> ResultEngine<()> {
        let exists = users::Entity::find_by_id(username.to_string())
            .one(db)
            .await?
            .is_some();
        if !exists {
            return Err(EngineError::KeyNotFound("user not exists".to_string()));
        }
        Ok(())
    }
}
