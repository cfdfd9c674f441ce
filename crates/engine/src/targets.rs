//! Matcher targets: how a matched bank transaction becomes a booking.
//!
//! The only implemented target is [`MultipleCategoriesBooking`]: two ordered
//! lists of [`BookingRule`]s, one for the debit side and one for the credit
//! side. Any other stored target kind loads as [`Target::Unsupported`] so it
//! can be listed and round-tripped, but allocating it fails.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

pub const MULTIPLE_CATEGORIES_BOOKING: &str = "multiple_categories_booking";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingRuleKind {
    /// Consume whatever is left on the side.
    Remaining,
    /// Consume exactly the configured amount.
    FixedAmount,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Allocation {
    Remaining,
    FixedAmount(i64),
}

/// One line of a booking side: a category plus how much of the side it takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBookingRule", into = "RawBookingRule")]
pub struct BookingRule {
    pub category_id: Uuid,
    pub allocation: Allocation,
}

impl BookingRule {
    pub fn remaining(category_id: Uuid) -> Self {
        Self {
            category_id,
            allocation: Allocation::Remaining,
        }
    }

    pub fn fixed(category_id: Uuid, amount_minor: i64) -> Self {
        Self {
            category_id,
            allocation: Allocation::FixedAmount(amount_minor),
        }
    }

    /// Builds a rule from its stored shape.
    ///
    /// `fixed_amount` requires an amount; `remaining` drops it.
    pub fn from_parts(
        category_id: Uuid,
        kind: BookingRuleKind,
        amount_minor: Option<i64>,
    ) -> ResultEngine<Self> {
        match kind {
            BookingRuleKind::Remaining => Ok(Self::remaining(category_id)),
            BookingRuleKind::FixedAmount => amount_minor
                .map(|amount| Self::fixed(category_id, amount))
                .ok_or_else(|| {
                    EngineError::InvalidConfig(format!(
                        "fixed_amount rule for category {category_id} has no amount"
                    ))
                }),
        }
    }

    pub fn kind(&self) -> BookingRuleKind {
        match self.allocation {
            Allocation::Remaining => BookingRuleKind::Remaining,
            Allocation::FixedAmount(_) => BookingRuleKind::FixedAmount,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct RawBookingRule {
    category_id: Uuid,
    kind: BookingRuleKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    amount_minor: Option<i64>,
}

impl TryFrom<RawBookingRule> for BookingRule {
    type Error = EngineError;

    fn try_from(raw: RawBookingRule) -> Result<Self, Self::Error> {
        Self::from_parts(raw.category_id, raw.kind, raw.amount_minor)
    }
}

impl From<BookingRule> for RawBookingRule {
    fn from(rule: BookingRule) -> Self {
        let amount_minor = match rule.allocation {
            Allocation::Remaining => None,
            Allocation::FixedAmount(amount) => Some(amount),
        };
        Self {
            category_id: rule.category_id,
            kind: rule.kind(),
            amount_minor,
        }
    }
}

/// Split a transaction over several categories.
///
/// At most one `remaining` rule per side is meaningful, and only as the last
/// rule: an earlier one takes the whole side and leaves later rules with a
/// negative remainder. This is not rejected.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultipleCategoriesBooking {
    pub debit_rules: Vec<BookingRule>,
    pub credit_rules: Vec<BookingRule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    MultipleCategoriesBooking(MultipleCategoriesBooking),
    /// A stored target kind this build cannot allocate. The raw payload is
    /// kept so the matcher survives a load/store cycle untouched.
    Unsupported { kind: String, payload: String },
}

impl Target {
    pub fn kind(&self) -> &str {
        match self {
            Self::MultipleCategoriesBooking(_) => MULTIPLE_CATEGORIES_BOOKING,
            Self::Unsupported { kind, .. } => kind.as_str(),
        }
    }

    /// Decodes a target from its storage columns (`target_kind`, `target`).
    pub fn from_storage(kind: &str, payload: &str) -> ResultEngine<Self> {
        match kind {
            MULTIPLE_CATEGORIES_BOOKING => serde_json::from_str(payload)
                .map(Self::MultipleCategoriesBooking)
                .map_err(|err| EngineError::InvalidConfig(format!("invalid target: {err}"))),
            other => Ok(Self::Unsupported {
                kind: other.to_string(),
                payload: payload.to_string(),
            }),
        }
    }

    /// Encodes the payload stored in the `target` column.
    pub fn payload(&self) -> ResultEngine<String> {
        match self {
            Self::MultipleCategoriesBooking(booking) => serde_json::to_string(booking)
                .map_err(|err| EngineError::InvalidConfig(format!("invalid target: {err}"))),
            Self::Unsupported { payload, .. } => Ok(payload.clone()),
        }
    }

    /// Every category id referenced by the target's rules.
    pub fn category_ids(&self) -> Vec<Uuid> {
        match self {
            Self::MultipleCategoriesBooking(booking) => booking
                .debit_rules
                .iter()
                .chain(booking.credit_rules.iter())
                .map(|rule| rule.category_id)
                .collect(),
            Self::Unsupported { .. } => Vec::new(),
        }
    }
}
