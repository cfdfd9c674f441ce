//! Household double-entry bookkeeping engine.
//!
//! Bank transactions are turned into balanced bookings by user-configured
//! [`Matcher`]s ([`Engine::execute_match`]); bookings are aggregated over the
//! category forest into a rapport tree ([`Engine::build_rapport`]).
//!
//! The rule evaluator ([`select_matcher`]), the allocator
//! ([`allocate_booking`]) and the aggregator ([`build_rapport_tree`]) are pure
//! functions; [`Engine`] wires them to the database.

pub use allocation::{allocate_booking, allocate_records, create_record};
pub use bank_accounts::BankAccount;
pub use bank_transactions::{BankTransaction, NewBankTransaction};
pub use booking_records::{BookingRecord, MatchedTransaction};
pub use bookings::{Booking, BookingAdd, BookingRecordAdd};
pub use categories::Category;
pub use error::EngineError;
pub use filters::{Direction, Filter};
pub use ledgers::Ledger;
pub use matchers::{Matcher, applicable_matchers, select_matcher};
pub use money::Amount;
pub use ops::{Engine, EngineBuilder, LedgerMember, MembershipRole};
pub use rapport::{CategoryForest, RapportEntry, RapportLeaf, build_rapport_tree};
pub use targets::{
    Allocation, BookingRule, BookingRuleKind, MULTIPLE_CATEGORIES_BOOKING,
    MultipleCategoriesBooking, Target,
};

mod allocation;
mod bank_accounts;
mod bank_transactions;
mod booking_records;
mod bookings;
mod categories;
mod error;
mod filters;
mod ledger_memberships;
mod ledgers;
mod matchers;
mod money;
mod ops;
mod rapport;
mod targets;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
