use std::fmt::Write;

use engine::{Amount, RapportLeaf};

const NAME_WIDTH: usize = 36;
const AMOUNT_WIDTH: usize = 12;

/// Renders the rapport as an indented tree, one category per line.
///
/// With `entries`, each contributing record is listed under its category.
pub fn rapport(leaves: &[RapportLeaf], entries: bool) -> String {
    let mut out = String::new();
    for leaf in leaves {
        write_leaf(&mut out, leaf, 0, entries);
    }
    let total = Amount::checked_sum(
        leaves
            .iter()
            .map(|l| Amount::from_minor(l.total_amount_minor)),
    )
    .map_or_else(|| "overflow".to_string(), |total| total.to_string());
    let _ = writeln!(out, "{:<NAME_WIDTH$}{total:>AMOUNT_WIDTH$}", "Total");
    out
}

fn write_leaf(out: &mut String, leaf: &RapportLeaf, depth: usize, entries: bool) {
    let indent = "  ".repeat(depth);
    let label = format!("{indent}{}", leaf.category.name);
    let _ = writeln!(
        out,
        "{label:<NAME_WIDTH$}{:>AMOUNT_WIDTH$}",
        Amount::from_minor(leaf.total_amount_minor).to_string()
    );

    if entries {
        for entry in &leaf.entries {
            let label = format!(
                "{indent}  · {} {}",
                entry.occurred_at.format("%Y-%m-%d"),
                entry.description.as_deref().unwrap_or("-")
            );
            let _ = writeln!(
                out,
                "{label:<NAME_WIDTH$}{:>AMOUNT_WIDTH$}",
                Amount::from_minor(entry.record.amount_minor).to_string()
            );
        }
    }

    for child in &leaf.children {
        write_leaf(out, child, depth + 1, entries);
    }
}
