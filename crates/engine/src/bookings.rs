//! Bookings.
//!
//! A booking is a double-entry journal entry: one economic event split into
//! records (see [`booking_records`](crate::booking_records)) whose signed
//! amounts sum to zero. [`BookingAdd`] is the transient form produced by the
//! allocator; [`Booking`] is the persisted, immutable form. Corrections are
//! new offsetting bookings, never updates.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, BookingRecord, MatchedTransaction};

fn total_minor(amounts: impl Iterator<Item = i64>) -> Option<i64> {
    Amount::checked_sum(amounts.map(Amount::from_minor)).map(Amount::minor)
}

/// A record to be created as part of a [`BookingAdd`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRecordAdd {
    pub category_id: Uuid,
    pub amount_minor: i64,
    /// Set on exactly one record per matched booking: the first credit record.
    pub matched: Option<MatchedTransaction>,
}

/// A booking to be created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingAdd {
    pub ledger_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub records: Vec<BookingRecordAdd>,
}

impl BookingAdd {
    /// Sum of all record amounts, `None` when it overflows.
    pub fn total_minor(&self) -> Option<i64> {
        total_minor(self.records.iter().map(|r| r.amount_minor))
    }

    /// Double-entry invariant: records sum to zero.
    pub fn is_balanced(&self) -> bool {
        self.total_minor() == Some(0)
    }

    /// The record carrying the bank transaction back-reference, if any.
    pub fn matched_record(&self) -> Option<&BookingRecordAdd> {
        self.records.iter().find(|r| r.matched.is_some())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub records: Vec<BookingRecord>,
}

impl Booking {
    pub fn total_minor(&self) -> Option<i64> {
        total_minor(self.records.iter().map(|r| r.amount_minor))
    }

    pub(crate) fn from_model(model: Model, records: Vec<BookingRecord>) -> Self {
        Self {
            id: model.id,
            ledger_id: model.ledger_id,
            occurred_at: model.occurred_at,
            description: model.description,
            records,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub occurred_at: DateTimeUtc,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking_records::Entity")]
    Records,
}

impl Related<super::booking_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn from_add(id: Uuid, booking: &BookingAdd) -> Self {
        Self {
            id: ActiveValue::Set(id),
            ledger_id: ActiveValue::Set(booking.ledger_id),
            occurred_at: ActiveValue::Set(booking.occurred_at),
            description: ActiveValue::Set(booking.description.clone()),
        }
    }
}
