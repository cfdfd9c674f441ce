//! Booking allocation.
//!
//! Turns a matched [`BankTransaction`] with amount `A` into balanced records:
//!
//! - the debit side starts with a remainder of `-A`, the credit side with `+A`;
//! - each rule, in order, takes either the whole remainder (`remaining`) or
//!   its fixed amount, and the remainder shrinks by what it took;
//! - debit records come first, then credit records;
//! - the first credit record carries the bank transaction back-reference.
//!
//! Fixed amounts are magnitudes: they are emitted with the sign of the side's
//! starting remainder, so a fixed `3000` on the debit side of an incoming
//! `10000` books `-3000` and leaves `-7000` for a final `remaining` rule.
//! A zero-amount transaction keeps the usual orientation: debit amounts are
//! emitted negative and credit amounts positive.
//! Fixed amounts exceeding the transaction magnitude push the remainder past
//! zero; a later `remaining` rule then books the opposite sign. This is a
//! configuration mistake, not an allocation error.
//!
//! All arithmetic is checked. An amount that cannot be represented in `i64`
//! minor units fails with [`EngineError::InvalidAmount`].
//!
//! A side ending in a `remaining` rule always sums to its starting remainder,
//! so a booking whose both sides end that way sums to zero.

use uuid::Uuid;

use crate::{
    Allocation, Amount, BankTransaction, BookingAdd, BookingRecordAdd, BookingRule, EngineError,
    MatchedTransaction, MultipleCategoriesBooking, ResultEngine, Target,
};

/// Creates the record for a single rule given the side's current remainder.
///
/// `remaining_minor` is expressed in the side's direction (see
/// [`allocate_records`]); the returned amount is too.
pub fn create_record(rule: &BookingRule, remaining_minor: i64) -> BookingRecordAdd {
    let amount_minor = match rule.allocation {
        Allocation::Remaining => remaining_minor,
        Allocation::FixedAmount(amount) => amount,
    };
    BookingRecordAdd {
        category_id: rule.category_id,
        amount_minor,
        matched: None,
    }
}

fn overflow(what: &str) -> EngineError {
    EngineError::InvalidAmount(format!("{what} overflows the amount range"))
}

/// Allocates one side, folding the remainder through the rules.
///
/// The fold runs on `magnitude`, the side's remainder in its own direction.
/// Emitted amounts are negated back when `negate` is set. A remainder that
/// overflowed is only an error once a `remaining` rule needs it.
fn allocate_side(
    rules: &[BookingRule],
    magnitude: Amount,
    negate: bool,
) -> ResultEngine<Vec<BookingRecordAdd>> {
    let (records, _) = rules.iter().try_fold(
        (Vec::with_capacity(rules.len()), Some(magnitude)),
        |(mut records, remaining), rule| {
            let current = match (rule.allocation, remaining) {
                (Allocation::Remaining, None) => return Err(overflow("remaining amount")),
                (_, remaining) => remaining.unwrap_or(Amount::ZERO),
            };
            let mut record = create_record(rule, current.minor());
            let taken = Amount::from_minor(record.amount_minor);
            let next = remaining.and_then(|r| r.checked_sub(taken));
            let emitted = if negate {
                taken.checked_neg().ok_or_else(|| overflow("fixed amount"))?
            } else {
                taken
            };
            record.amount_minor = emitted.minor();
            records.push(record);
            Ok((records, next))
        },
    )?;
    Ok(records)
}

/// Allocates the records of a multiple-categories booking for `tx`.
pub fn allocate_records(
    booking: &MultipleCategoriesBooking,
    tx: &BankTransaction,
) -> ResultEngine<Vec<BookingRecordAdd>> {
    let magnitude = Amount::from_minor(tx.amount_minor)
        .checked_abs()
        .ok_or_else(|| overflow("transaction amount"))?;
    let outgoing = tx.amount_minor < 0;

    let mut records = allocate_side(&booking.debit_rules, magnitude, !outgoing)?;
    let mut credit = allocate_side(&booking.credit_rules, magnitude, outgoing)?;

    if let Some(first_credit) = credit.first_mut() {
        first_credit.matched = Some(MatchedTransaction {
            bank_account_id: tx.bank_account_id,
            transaction_id: tx.id,
        });
    }

    records.append(&mut credit);
    Ok(records)
}

/// Builds the booking a matcher target produces for `tx`.
///
/// Fails with [`EngineError::UnsupportedTarget`] for target kinds that are
/// not implemented.
pub fn allocate_booking(
    ledger_id: Uuid,
    target: &Target,
    tx: &BankTransaction,
) -> ResultEngine<BookingAdd> {
    let records = match target {
        Target::MultipleCategoriesBooking(booking) => allocate_records(booking, tx)?,
        Target::Unsupported { kind, .. } => {
            return Err(EngineError::UnsupportedTarget(kind.clone()));
        }
    };

    Ok(BookingAdd {
        ledger_id,
        occurred_at: tx.occurred_at,
        description: Some(tx.description.clone()).filter(|d| !d.trim().is_empty()),
        records,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn tx(amount_minor: i64) -> BankTransaction {
        BankTransaction {
            id: Uuid::new_v4(),
            bank_account_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2024, 2, 10, 8, 0, 0).unwrap(),
            amount_minor,
            description: "Weekly shopping".to_string(),
            counterparty: None,
            matched_booking_id: None,
        }
    }

    fn target(debit: Vec<BookingRule>, credit: Vec<BookingRule>) -> Target {
        Target::MultipleCategoriesBooking(MultipleCategoriesBooking {
            debit_rules: debit,
            credit_rules: credit,
        })
    }

    #[test]
    fn create_record_remaining_takes_remainder() {
        let cat = Uuid::new_v4();
        assert_eq!(create_record(&BookingRule::remaining(cat), 1234).amount_minor, 1234);
        assert_eq!(create_record(&BookingRule::remaining(cat), -50).amount_minor, -50);
    }

    #[test]
    fn create_record_fixed_ignores_remainder() {
        let cat = Uuid::new_v4();
        let record = create_record(&BookingRule::fixed(cat, 3000), 99_999);
        assert_eq!(record.amount_minor, 3000);
        assert_eq!(record.category_id, cat);
        assert!(record.matched.is_none());
    }

    #[test]
    fn splits_fixed_then_remaining() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let t = tx(10_000);
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::fixed(a, 3000), BookingRule::remaining(b)],
                vec![BookingRule::remaining(c)],
            ),
            &t,
        )
        .unwrap();

        let amounts: Vec<(Uuid, i64)> = booking
            .records
            .iter()
            .map(|r| (r.category_id, r.amount_minor))
            .collect();
        assert_eq!(amounts, vec![(a, -3000), (b, -7000), (c, 10_000)]);
        assert!(booking.is_balanced());
        assert_eq!(booking.occurred_at, t.occurred_at);
        assert_eq!(booking.description.as_deref(), Some("Weekly shopping"));
    }

    #[test]
    fn outgoing_transaction_splits_magnitudes() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::fixed(a, 3000), BookingRule::remaining(b)],
                vec![BookingRule::remaining(c)],
            ),
            &tx(-4_200),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![3000, 1_200, -4_200]);
        assert!(booking.is_balanced());
    }

    #[test]
    fn fixed_amounts_over_magnitude_flip_the_remaining_rule() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![
                    BookingRule::fixed(Uuid::new_v4(), 12_000),
                    BookingRule::remaining(Uuid::new_v4()),
                ],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(10_000),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![-12_000, 2_000, 10_000]);
        assert!(booking.is_balanced());
    }

    #[test]
    fn back_reference_only_on_first_credit_record() {
        let t = tx(-4_200);
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::remaining(Uuid::new_v4())],
                vec![
                    BookingRule::fixed(Uuid::new_v4(), 200),
                    BookingRule::remaining(Uuid::new_v4()),
                ],
            ),
            &t,
        )
        .unwrap();

        let tagged: Vec<usize> = booking
            .records
            .iter()
            .enumerate()
            .filter_map(|(idx, r)| r.matched.map(|_| idx))
            .collect();
        assert_eq!(tagged, vec![1]);
        assert_eq!(
            booking.records[1].matched,
            Some(MatchedTransaction {
                bank_account_id: t.bank_account_id,
                transaction_id: t.id,
            })
        );
        assert!(booking.is_balanced());
    }

    #[test]
    fn zero_sum_holds_for_any_split_ending_in_remaining() {
        for amount in [-100_000, -1, 0, 1, 7_777, 250_000] {
            let booking = allocate_booking(
                Uuid::new_v4(),
                &target(
                    vec![
                        BookingRule::fixed(Uuid::new_v4(), 125),
                        BookingRule::fixed(Uuid::new_v4(), -40),
                        BookingRule::remaining(Uuid::new_v4()),
                    ],
                    vec![
                        BookingRule::fixed(Uuid::new_v4(), 999),
                        BookingRule::remaining(Uuid::new_v4()),
                    ],
                ),
                &tx(amount),
            )
            .unwrap();
            assert_eq!(booking.total_minor(), Some(0), "amount {amount}");
        }
    }

    #[test]
    fn early_remaining_rule_starves_later_fixed_rule() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![
                    BookingRule::remaining(Uuid::new_v4()),
                    BookingRule::fixed(Uuid::new_v4(), 500),
                ],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(1_000),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![-1_000, -500, 1_000]);
        assert!(!booking.is_balanced());
    }

    #[test]
    fn empty_credit_side_has_no_back_reference() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(vec![BookingRule::remaining(Uuid::new_v4())], Vec::new()),
            &tx(500),
        )
        .unwrap();
        assert_eq!(booking.records.len(), 1);
        assert!(booking.matched_record().is_none());
        assert_eq!(booking.total_minor(), Some(-500));
    }

    #[test]
    fn unsupported_target_fails_fast() {
        let err = allocate_booking(
            Uuid::new_v4(),
            &Target::Unsupported {
                kind: "single_category_booking".to_string(),
                payload: "{}".to_string(),
            },
            &tx(500),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::UnsupportedTarget("single_category_booking".to_string())
        );
    }

    #[test]
    fn zero_amount_keeps_debit_negative_and_credit_positive() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![
                    BookingRule::fixed(Uuid::new_v4(), 250),
                    BookingRule::remaining(Uuid::new_v4()),
                ],
                vec![
                    BookingRule::fixed(Uuid::new_v4(), 250),
                    BookingRule::remaining(Uuid::new_v4()),
                ],
            ),
            &tx(0),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![-250, 250, 250, -250]);
        assert!(booking.is_balanced());
    }

    #[test]
    fn minimum_transaction_amount_is_rejected() {
        let err = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::remaining(Uuid::new_v4())],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(i64::MIN),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{err:?}");
    }

    #[test]
    fn maximum_transaction_amount_allocates() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::remaining(Uuid::new_v4())],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(-i64::MAX),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![i64::MAX, -i64::MAX]);
        assert!(booking.is_balanced());
    }

    #[test]
    fn extreme_fixed_amount_before_remaining_is_rejected() {
        let err = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![
                    BookingRule::fixed(Uuid::new_v4(), i64::MIN),
                    BookingRule::remaining(Uuid::new_v4()),
                ],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(10_000),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{err:?}");
    }

    #[test]
    fn extreme_fixed_amount_without_later_remaining_is_kept() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::remaining(Uuid::new_v4())],
                vec![
                    BookingRule::remaining(Uuid::new_v4()),
                    BookingRule::fixed(Uuid::new_v4(), i64::MIN),
                ],
            ),
            &tx(10_000),
        )
        .unwrap();
        let amounts: Vec<i64> = booking.records.iter().map(|r| r.amount_minor).collect();
        assert_eq!(amounts, vec![-10_000, 10_000, i64::MIN]);
        assert!(!booking.is_balanced());
    }

    #[test]
    fn unrepresentable_debit_fixed_amount_is_rejected() {
        let err = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::fixed(Uuid::new_v4(), i64::MIN)],
                vec![BookingRule::remaining(Uuid::new_v4())],
            ),
            &tx(10_000),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)), "{err:?}");
    }

    #[test]
    fn unbalanced_total_overflow_is_not_a_panic() {
        let booking = allocate_booking(
            Uuid::new_v4(),
            &target(
                vec![BookingRule::fixed(Uuid::new_v4(), -i64::MAX)],
                vec![BookingRule::fixed(Uuid::new_v4(), i64::MAX)],
            ),
            &tx(1),
        )
        .unwrap();
        assert_eq!(booking.total_minor(), None);
        assert!(!booking.is_balanced());
    }
}
