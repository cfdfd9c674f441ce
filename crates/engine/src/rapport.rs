//! Category rapport: aggregates bookings over the category forest.
//!
//! The forest is loaded into a [`CategoryForest`] arena once per request and
//! walked depth-first from its roots. For every category the walk collects:
//!
//! - its own entries: the booking records booked on it, but only if the
//!   category belongs to the requested scope (the requested top categories
//!   and all their descendants);
//! - its children, recursively;
//! - `total_amount_minor` = own entries + children totals.
//!
//! A category with no own entries and no surviving children is pruned.
//! Siblings are sorted by name. Out-of-scope categories are still walked, so
//! an in-scope category below an out-of-scope parent keeps its parent in the
//! output.
//!
//! Records referencing unknown (deleted) categories contribute nothing.
//! Totals use checked arithmetic; a total outside the `i64` range fails with
//! [`EngineError::InvalidAmount`] instead of wrapping.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Amount, Booking, BookingRecord, Category, EngineError, ResultEngine};

/// A booking record contributing to a rapport node, with its booking header.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapportEntry {
    pub booking_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub description: Option<String>,
    pub record: BookingRecord,
}

/// A node of the rapport tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RapportLeaf {
    pub category: Category,
    pub entries: Vec<RapportEntry>,
    /// Own entries plus all descendant totals.
    pub total_amount_minor: i64,
    pub children: Vec<RapportLeaf>,
}

impl RapportLeaf {
    /// Sum of the entries booked directly on this category, `None` when it
    /// overflows.
    pub fn own_amount_minor(&self) -> Option<i64> {
        checked_total(self.entries.iter().map(|e| e.record.amount_minor))
    }
}

fn checked_total(amounts: impl Iterator<Item = i64>) -> Option<i64> {
    Amount::checked_sum(amounts.map(Amount::from_minor)).map(Amount::minor)
}

fn total_overflow(category: &Category) -> EngineError {
    EngineError::InvalidAmount(format!(
        "rapport total of category {} overflows the amount range",
        category.name
    ))
}

/// Arena of categories with the parent/children edges resolved once.
#[derive(Clone, Debug, Default)]
pub struct CategoryForest {
    nodes: HashMap<Uuid, Category>,
    children: HashMap<Uuid, Vec<Uuid>>,
    roots: Vec<Uuid>,
}

impl CategoryForest {
    /// Builds the arena.
    ///
    /// A category whose parent is missing from the input is treated as a
    /// root, so its bookings stay reachable after the parent is deleted.
    pub fn new(categories: impl IntoIterator<Item = Category>) -> Self {
        let nodes: HashMap<Uuid, Category> =
            categories.into_iter().map(|c| (c.id, c)).collect();

        let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        let mut roots = Vec::new();
        for category in nodes.values() {
            match category.parent_id {
                Some(parent_id) if nodes.contains_key(&parent_id) => {
                    children.entry(parent_id).or_default().push(category.id);
                }
                _ => roots.push(category.id),
            }
        }

        let mut forest = Self {
            nodes,
            children,
            roots,
        };
        forest.sort_ids();
        forest
    }

    fn sort_ids(&mut self) {
        let nodes = &self.nodes;
        let key = |id: &Uuid| nodes.get(id).map(|c| (c.name.clone(), *id));
        self.roots.sort_by_key(key);
        for ids in self.children.values_mut() {
            ids.sort_by_key(key);
        }
    }

    pub fn get(&self, id: &Uuid) -> Option<&Category> {
        self.nodes.get(id)
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Root ids sorted by name.
    pub fn roots(&self) -> &[Uuid] {
        &self.roots
    }

    /// Child ids sorted by name.
    pub fn children_of(&self, id: &Uuid) -> &[Uuid] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive closure of `top_ids` (each top id included).
    ///
    /// Unknown ids are ignored. An empty `top_ids` selects every root, which
    /// resolves to every reachable category.
    pub fn descendant_ids(&self, top_ids: &[Uuid]) -> HashSet<Uuid> {
        let mut stack: Vec<Uuid> = if top_ids.is_empty() {
            self.roots.clone()
        } else {
            top_ids
                .iter()
                .copied()
                .filter(|id| self.contains(id))
                .collect()
        };

        let mut out = HashSet::new();
        while let Some(id) = stack.pop() {
            if out.insert(id) {
                stack.extend(self.children_of(&id).iter().copied());
            }
        }
        out
    }
}

struct Aggregation<'a> {
    forest: &'a CategoryForest,
    scope: HashSet<Uuid>,
    entries: HashMap<Uuid, Vec<RapportEntry>>,
    visited: HashSet<Uuid>,
}

impl Aggregation<'_> {
    fn node(&mut self, id: Uuid) -> ResultEngine<Option<RapportLeaf>> {
        if !self.visited.insert(id) {
            return Ok(None);
        }
        let forest = self.forest;
        let Some(category) = forest.get(&id) else {
            return Ok(None);
        };

        let entries = if self.scope.contains(&id) {
            self.entries.remove(&id).unwrap_or_default()
        } else {
            Vec::new()
        };

        // Child ids are pre-sorted by name, so surviving children stay sorted.
        let mut children = Vec::new();
        for child in forest.children_of(&id) {
            if let Some(leaf) = self.node(*child)? {
                children.push(leaf);
            }
        }

        if entries.is_empty() && children.is_empty() {
            return Ok(None);
        }

        let total_amount_minor = checked_total(
            entries
                .iter()
                .map(|e| e.record.amount_minor)
                .chain(children.iter().map(|c| c.total_amount_minor)),
        )
        .ok_or_else(|| total_overflow(category))?;
        Ok(Some(RapportLeaf {
            category: category.clone(),
            entries,
            total_amount_minor,
            children,
        }))
    }
}

/// Builds the rapport tree of `bookings` over `forest`, scoped to
/// `top_category_ids` and their descendants (every root when empty).
pub fn build_rapport_tree(
    forest: &CategoryForest,
    bookings: &[Booking],
    top_category_ids: &[Uuid],
) -> ResultEngine<Vec<RapportLeaf>> {
    let mut entries: HashMap<Uuid, Vec<RapportEntry>> = HashMap::new();
    let mut orphaned = 0usize;
    for booking in bookings {
        for record in &booking.records {
            if !forest.contains(&record.category_id) {
                orphaned += 1;
                continue;
            }
            entries
                .entry(record.category_id)
                .or_default()
                .push(RapportEntry {
                    booking_id: booking.id,
                    occurred_at: booking.occurred_at,
                    description: booking.description.clone(),
                    record: record.clone(),
                });
        }
    }
    if orphaned > 0 {
        tracing::debug!(orphaned, "records reference unknown categories");
    }

    let mut aggregation = Aggregation {
        forest,
        scope: forest.descendant_ids(top_category_ids),
        entries,
        visited: HashSet::new(),
    };
    let mut tree = Vec::new();
    for root in forest.roots() {
        if let Some(leaf) = aggregation.node(*root)? {
            tree.push(leaf);
        }
    }
    Ok(tree)
}
