//! Booking records.
//!
//! A [`BookingRecord`] is one leg of a booking: a category and a signed
//! amount in minor units. The record created from the first credit rule of a
//! matched booking also carries the bank account and bank transaction it was
//! created from; it is the only link back to the source transaction.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::BookingRecordAdd;

/// Back-reference from a record to the bank transaction it was matched from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedTransaction {
    pub bank_account_id: Uuid,
    pub transaction_id: Uuid,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecord {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub matched: Option<MatchedTransaction>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "booking_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Insertion order inside the booking (debit records first).
    pub position: i32,
    pub category_id: Uuid,
    pub amount_minor: i64,
    pub matched_bank_account_id: Option<Uuid>,
    pub matched_transaction_id: Option<Uuid>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bookings::Entity",
        from = "Column::BookingId",
        to = "super::bookings::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Bookings,
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_add(booking_id: Uuid, position: i32, record: &BookingRecordAdd) -> Self {
        Self {
            id: ActiveValue::Set(Uuid::new_v4()),
            booking_id: ActiveValue::Set(booking_id),
            position: ActiveValue::Set(position),
            category_id: ActiveValue::Set(record.category_id),
            amount_minor: ActiveValue::Set(record.amount_minor),
            matched_bank_account_id: ActiveValue::Set(record.matched.map(|m| m.bank_account_id)),
            matched_transaction_id: ActiveValue::Set(record.matched.map(|m| m.transaction_id)),
        }
    }
}

impl From<Model> for BookingRecord {
    fn from(model: Model) -> Self {
        // Both halves are written together; a lone half is treated as absent.
        let matched = match (model.matched_bank_account_id, model.matched_transaction_id) {
            (Some(bank_account_id), Some(transaction_id)) => Some(MatchedTransaction {
                bank_account_id,
                transaction_id,
            }),
            _ => None,
        };
        Self {
            id: model.id,
            booking_id: model.booking_id,
            category_id: model.category_id,
            amount_minor: model.amount_minor,
            matched,
        }
    }
}
