//! Matchers: user-configured rules turning an unreconciled bank transaction
//! into a booking.
//!
//! A [`Matcher`] couples a list of [`Filter`]s (all must hold) with a
//! [`Target`]. Matching is requested for a specific matcher id, so the filter
//! check in [`select_matcher`] is a consistency validation rather than a
//! search; [`applicable_matchers`] is the search used for suggestions.

use sea_orm::{ActiveValue, entity::prelude::*};
use uuid::Uuid;

use crate::{
    BankTransaction, EngineError, Filter, ResultEngine, Target, filters::all_match,
    util::normalize_key,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Matcher {
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub name: String,
    pub filters: Vec<Filter>,
    pub target: Target,
}

impl Matcher {
    pub fn new(ledger_id: Uuid, name: String, filters: Vec<Filter>, target: Target) -> Self {
        Self {
            id: Uuid::new_v4(),
            ledger_id,
            name,
            filters,
            target,
        }
    }

    /// Returns `true` if every filter holds for `tx`.
    pub fn applies_to(&self, tx: &BankTransaction) -> bool {
        all_match(&self.filters, tx)
    }
}

/// Picks the matcher with id `matcher_id` and checks it applies to `tx`.
///
/// Fails with [`EngineError::KeyNotFound`] if no matcher has that id and with
/// [`EngineError::NoApplicableMatcher`] if its filters reject the transaction.
pub fn select_matcher<'a>(
    tx: &BankTransaction,
    matchers: &'a [Matcher],
    matcher_id: Uuid,
) -> ResultEngine<&'a Matcher> {
    let matcher = matchers
        .iter()
        .find(|m| m.id == matcher_id)
        .ok_or_else(|| EngineError::KeyNotFound("matcher not exists".to_string()))?;
    if !matcher.applies_to(tx) {
        return Err(EngineError::NoApplicableMatcher(format!(
            "matcher '{}' does not apply to transaction {}",
            matcher.name, tx.id
        )));
    }
    Ok(matcher)
}

/// All matchers whose filters hold for `tx`, in the given order.
pub fn applicable_matchers<'a>(
    tx: &'a BankTransaction,
    matchers: &'a [Matcher],
) -> impl Iterator<Item = &'a Matcher> + 'a {
    matchers.iter().filter(move |m| m.applies_to(tx))
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "matchers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub ledger_id: Uuid,
    pub name: String,
    /// Uniqueness key of `name` inside the ledger.
    pub name_norm: String,
    /// JSON array of tagged filters.
    pub filters: String,
    pub target_kind: String,
    /// JSON payload of the target, shaped by `target_kind`.
    pub target: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::ledgers::Entity",
        from = "Column::LedgerId",
        to = "super::ledgers::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Ledgers,
}

impl Related<super::ledgers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ledgers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<&Matcher> for ActiveModel {
    type Error = EngineError;

    fn try_from(matcher: &Matcher) -> Result<Self, Self::Error> {
        let filters = serde_json::to_string(&matcher.filters)
            .map_err(|err| EngineError::InvalidConfig(format!("invalid filters: {err}")))?;
        Ok(Self {
            id: ActiveValue::Set(matcher.id),
            ledger_id: ActiveValue::Set(matcher.ledger_id),
            name: ActiveValue::Set(matcher.name.clone()),
            name_norm: ActiveValue::Set(normalize_key(&matcher.name)),
            filters: ActiveValue::Set(filters),
            target_kind: ActiveValue::Set(matcher.target.kind().to_string()),
            target: ActiveValue::Set(matcher.target.payload()?),
        })
    }
}

impl TryFrom<Model> for Matcher {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let filters = serde_json::from_str(&model.filters).map_err(|err| {
            EngineError::InvalidConfig(format!("invalid filters of matcher {}: {err}", model.id))
        })?;
        Ok(Self {
            id: model.id,
            ledger_id: model.ledger_id,
            name: model.name,
            filters,
            target: Target::from_storage(&model.target_kind, &model.target)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::{BookingRule, MultipleCategoriesBooking};

    fn tx(description: &str, amount_minor: i64) -> BankTransaction {
        BankTransaction {
            id: Uuid::new_v4(),
            bank_account_id: Uuid::new_v4(),
            occurred_at: Utc.with_ymd_and_hms(2024, 5, 2, 9, 30, 0).unwrap(),
            amount_minor,
            description: description.to_string(),
            counterparty: None,
            matched_booking_id: None,
        }
    }

    fn matcher(name: &str, text: &str) -> Matcher {
        Matcher::new(
            Uuid::new_v4(),
            name.to_string(),
            vec![Filter::DescriptionContains {
                text: text.to_string(),
            }],
            Target::MultipleCategoriesBooking(MultipleCategoriesBooking {
                debit_rules: vec![BookingRule::remaining(Uuid::new_v4())],
                credit_rules: vec![BookingRule::remaining(Uuid::new_v4())],
            }),
        )
    }

    #[test]
    fn select_returns_requested_matcher_when_filters_hold() {
        let matchers = vec![matcher("rent", "rent"), matcher("groceries", "albert heijn")];
        let t = tx("ALBERT HEIJN 1234", -2_500);
        let selected = select_matcher(&t, &matchers, matchers[1].id).unwrap();
        assert_eq!(selected.name, "groceries");
    }

    #[test]
    fn select_rejects_matcher_whose_filters_fail() {
        let matchers = vec![matcher("rent", "rent"), matcher("groceries", "albert heijn")];
        let t = tx("ALBERT HEIJN 1234", -2_500);
        let err = select_matcher(&t, &matchers, matchers[0].id).unwrap_err();
        assert!(matches!(err, EngineError::NoApplicableMatcher(_)));
    }

    #[test]
    fn select_unknown_id_is_not_found() {
        let matchers = vec![matcher("rent", "rent")];
        let t = tx("RENT MAY", -100_000);
        assert_eq!(
            select_matcher(&t, &matchers, Uuid::new_v4()).unwrap_err(),
            EngineError::KeyNotFound("matcher not exists".to_string())
        );
    }

    #[test]
    fn applicable_matchers_keeps_order() {
        let matchers = vec![
            matcher("a", "shop"),
            matcher("b", "rent"),
            matcher("c", "shop"),
        ];
        let t = tx("SHOP 42", -10);
        let names: Vec<&str> = applicable_matchers(&t, &matchers)
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn model_roundtrip_keeps_filters_and_target() {
        let original = matcher("groceries", "albert heijn");
        let active = ActiveModel::try_from(&original).unwrap();
        let model = Model {
            id: original.id,
            ledger_id: original.ledger_id,
            name: original.name.clone(),
            name_norm: active.name_norm.clone().unwrap(),
            filters: active.filters.clone().unwrap(),
            target_kind: active.target_kind.clone().unwrap(),
            target: active.target.clone().unwrap(),
        };
        assert_eq!(model.name_norm, "groceries");
        assert_eq!(Matcher::try_from(model).unwrap(), original);
    }
}
