//! A `Ledger` is a bounded accounting scope (e.g. one household). It owns bank
//! accounts, categories, matchers and bookings.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::normalize_key;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub id: Uuid,
    pub name: String,
    /// Username of the owner. The owner always has write access.
    pub user_id: String,
}

impl Ledger {
    pub fn new(name: String, user_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            user_id: user_id.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledgers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub name_norm: String,
    pub user_id: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_memberships::Entity")]
    Memberships,
    #[sea_orm(has_many = "super::bank_accounts::Entity")]
    BankAccounts,
}

impl Related<super::ledger_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Memberships.def()
    }
}

impl Related<super::bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Ledger> for ActiveModel {
    fn from(ledger: &Ledger) -> Self {
        Self {
            id: ActiveValue::Set(ledger.id),
            name: ActiveValue::Set(ledger.name.clone()),
            name_norm: ActiveValue::Set(normalize_key(&ledger.name)),
            user_id: ActiveValue::Set(ledger.user_id.clone()),
        }
    }
}

impl From<Model> for Ledger {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            user_id: model.user_id,
        }
    }
}
