//! Matcher filters.
//!
//! A [`Filter`] is a predicate over a [`BankTransaction`]. A matcher applies
//! to a transaction only if **all** its filters hold (logical AND); an empty
//! filter list therefore accepts everything.
//!
//! Text filters compare normalized keys (accents, case and punctuation are
//! ignored), so `"Albert Heijn"` matches a bank description like
//! `"ALBERT-HEIJN 1234 AMSTERDAM"`.

use serde::{Deserialize, Serialize};

use crate::{BankTransaction, util::normalize_key};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Money coming in (`amount_minor > 0`).
    Incoming,
    /// Money going out (`amount_minor < 0`).
    Outgoing,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Filter {
    DescriptionContains {
        text: String,
    },
    DescriptionEquals {
        text: String,
    },
    /// A transaction without counterparty never matches.
    CounterpartyContains {
        text: String,
    },
    AmountEquals {
        amount_minor: i64,
    },
    /// Inclusive on both ends; a missing bound is open.
    AmountBetween {
        min_minor: Option<i64>,
        max_minor: Option<i64>,
    },
    Direction {
        direction: Direction,
    },
}

impl Filter {
    /// Evaluates the filter against a transaction.
    pub fn matches(&self, tx: &BankTransaction) -> bool {
        match self {
            Self::DescriptionContains { text } => {
                contains_key(&normalize_key(&tx.description), text)
            }
            Self::DescriptionEquals { text } => {
                normalize_key(&tx.description) == normalize_key(text)
            }
            Self::CounterpartyContains { text } => tx
                .counterparty
                .as_deref()
                .is_some_and(|counterparty| contains_key(&normalize_key(counterparty), text)),
            Self::AmountEquals { amount_minor } => tx.amount_minor == *amount_minor,
            Self::AmountBetween {
                min_minor,
                max_minor,
            } => {
                min_minor.is_none_or(|min| tx.amount_minor >= min)
                    && max_minor.is_none_or(|max| tx.amount_minor <= max)
            }
            Self::Direction { direction } => match direction {
                Direction::Incoming => tx.amount_minor > 0,
                Direction::Outgoing => tx.amount_minor < 0,
            },
        }
    }
}

fn contains_key(haystack_key: &str, needle: &str) -> bool {
    haystack_key.contains(normalize_key(needle).as_str())
}

/// Returns `true` if every filter holds for `tx`.
pub fn all_match(filters: &[Filter], tx: &BankTransaction) -> bool {
    filters.iter().all(|filter| filter.matches(tx))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::*;

    fn tx(description: &str, counterparty: Option<&str>, amount_minor: i64) -> BankTransaction {
        BankTransaction {
            id: Uuid::new_v4(),
            bank_account_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            amount_minor,
            description: description.to_string(),
            counterparty: counterparty.map(ToString::to_string),
            matched_booking_id: None,
        }
    }

    fn contains(text: &str) -> Filter {
        Filter::DescriptionContains {
            text: text.to_string(),
        }
    }

    #[test]
    fn description_contains_ignores_case_and_punctuation() {
        let t = tx("ALBERT-HEIJN 1234 AMSTERDAM", None, -2_350);
        assert!(contains("albert heijn").matches(&t));
        assert!(contains("Heijn").matches(&t));
        assert!(!contains("jumbo").matches(&t));
    }

    #[test]
    fn description_contains_ignores_accents() {
        let t = tx("Café de la Gare", None, -450);
        assert!(contains("cafe").matches(&t));
    }

    #[test]
    fn description_equals_is_normalized_equality() {
        let t = tx("  Salary  March ", None, 300_000);
        let filter = Filter::DescriptionEquals {
            text: "salary march".to_string(),
        };
        assert!(filter.matches(&t));
        let filter = Filter::DescriptionEquals {
            text: "salary".to_string(),
        };
        assert!(!filter.matches(&t));
    }

    #[test]
    fn counterparty_missing_never_matches() {
        let filter = Filter::CounterpartyContains {
            text: "acme".to_string(),
        };
        assert!(!filter.matches(&tx("x", None, 1)));
        assert!(filter.matches(&tx("x", Some("ACME Corp."), 1)));
    }

    #[test]
    fn amount_filters() {
        let t = tx("x", None, 10_000);
        assert!(Filter::AmountEquals { amount_minor: 10_000 }.matches(&t));
        assert!(!Filter::AmountEquals { amount_minor: -10_000 }.matches(&t));

        let between = |min, max| Filter::AmountBetween {
            min_minor: min,
            max_minor: max,
        };
        assert!(between(Some(10_000), Some(10_000)).matches(&t));
        assert!(between(None, Some(10_000)).matches(&t));
        assert!(between(Some(0), None).matches(&t));
        assert!(!between(Some(10_001), None).matches(&t));
        assert!(!between(None, Some(9_999)).matches(&t));
        assert!(between(None, None).matches(&t));
    }

    #[test]
    fn direction_filter_uses_sign() {
        let incoming = Filter::Direction {
            direction: Direction::Incoming,
        };
        let outgoing = Filter::Direction {
            direction: Direction::Outgoing,
        };
        assert!(incoming.matches(&tx("x", None, 1)));
        assert!(!incoming.matches(&tx("x", None, 0)));
        assert!(outgoing.matches(&tx("x", None, -1)));
        assert!(!outgoing.matches(&tx("x", None, 0)));
    }

    #[test]
    fn all_match_is_a_conjunction() {
        let t = tx("NETFLIX.COM", None, -1_299);
        let filters = vec![
            contains("netflix"),
            Filter::Direction {
                direction: Direction::Outgoing,
            },
        ];
        assert!(all_match(&filters, &t));
        assert!(all_match(&[], &t));

        let filters = vec![contains("netflix"), Filter::AmountEquals { amount_minor: -999 }];
        assert!(!all_match(&filters, &t));
    }

    #[test]
    fn filters_roundtrip_through_tagged_json() {
        let json = r#"[{"kind":"description_contains","text":"rent"},{"kind":"amount_between","min_minor":null,"max_minor":-1}]"#;
        let filters: Vec<Filter> = serde_json::from_str(json).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0], contains("rent"));
    }
}
