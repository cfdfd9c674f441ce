use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{Booking, BookingAdd, BookingRecord, EngineError, ResultEngine, booking_records, bookings};

use super::{Engine, with_tx};

impl Engine {
    /// Bookings of the ledger with `from <= occurred_at < to`, oldest first,
    /// each with its records in insertion order.
    pub async fn bookings_in_range(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<Booking>> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            self.load_bookings(&db_tx, ledger_id, from, to).await
        })
    }

    /// Return a single booking with its records.
    pub async fn booking(
        &self,
        user_id: &str,
        ledger_id: Uuid,
        booking_id: Uuid,
    ) -> ResultEngine<Booking> {
        with_tx!(self, |db_tx| {
            self.require_ledger_read(&db_tx, ledger_id, user_id).await?;
            let model = bookings::Entity::find_by_id(booking_id)
                .filter(bookings::Column::LedgerId.eq(ledger_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("booking not exists".to_string()))?;
            let records = booking_records::Entity::find()
                .filter(booking_records::Column::BookingId.eq(booking_id))
                .order_by_asc(booking_records::Column::Position)
                .all(&db_tx)
                .await?;
            Ok(Booking::from_model(
                model,
                records.into_iter().map(BookingRecord::from).collect(),
            ))
        })
    }

    pub(super) async fn load_bookings(
        &self,
        db: &DatabaseTransaction,
        ledger_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ResultEngine<Vec<Booking>> {
        let headers = bookings::Entity::find()
            .filter(bookings::Column::LedgerId.eq(ledger_id))
            .filter(bookings::Column::OccurredAt.gte(from))
            .filter(bookings::Column::OccurredAt.lt(to))
            .order_by_asc(bookings::Column::OccurredAt)
            .order_by_asc(bookings::Column::Id)
            .all(db)
            .await?;
        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let rows = booking_records::Entity::find()
            .filter(booking_records::Column::BookingId.is_in(headers.iter().map(|b| b.id)))
            .order_by_asc(booking_records::Column::BookingId)
            .order_by_asc(booking_records::Column::Position)
            .all(db)
            .await?;
        let mut records: HashMap<Uuid, Vec<BookingRecord>> = HashMap::new();
        for row in rows {
            records
                .entry(row.booking_id)
                .or_default()
                .push(BookingRecord::from(row));
        }

        Ok(headers
            .into_iter()
            .map(|model| {
                let own = records.remove(&model.id).unwrap_or_default();
                Booking::from_model(model, own)
            })
            .collect())
    }

    /// Inserts the booking header and its records, in order.
    pub(super) async fn insert_booking(
        &self,
        db: &DatabaseTransaction,
        booking: &BookingAdd,
    ) -> ResultEngine<Uuid> {
        let id = Uuid::new_v4();
        bookings::ActiveModel::from_add(id, booking).insert(db).await?;
        for (position, record) in (0i32..).zip(&booking.records) {
            booking_records::ActiveModel::from_add(id, position, record)
                .insert(db)
                .await?;
        }
        Ok(id)
    }
}
