//! Internal helpers for text normalization and validation.
//!
//! These utilities are **not** part of the public API. They centralize
//! normalization so names and filters compare the same way everywhere.

use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{EngineError, ResultEngine};

/// Collapse inner whitespace and trim; `None` if nothing is left.
pub(crate) fn normalize_display(input: &str) -> Option<String> {
    let mut out = String::new();
    for token in input.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    if out.is_empty() { None } else { Some(out) }
}

/// Comparison key: NFKD without combining marks, lowercase, every run of
/// non-alphanumerics collapsed into one space.
pub(crate) fn normalize_key(input: &str) -> String {
    let mut out = String::new();
    let mut prev_space = false;
    for ch in input.trim().nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    out.trim_end().to_string()
}

pub(crate) fn normalize_required_name(value: &str, label: &str) -> ResultEngine<String> {
    normalize_display(value)
        .ok_or_else(|| EngineError::InvalidName(format!("{label} name must not be empty")))
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value.and_then(normalize_display)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_strips_accents_case_and_punctuation() {
        assert_eq!(normalize_key("  Café   de-la  GARE! "), "cafe de la gare");
        assert_eq!(normalize_key("ALBERT HEIJN 1234"), "albert heijn 1234");
        assert_eq!(normalize_key("***"), "");
    }

    #[test]
    fn display_collapses_whitespace() {
        assert_eq!(normalize_display("  Food \t and  drinks "), Some("Food and drinks".to_string()));
        assert_eq!(normalize_display("   "), None);
    }

    #[test]
    fn required_name_rejects_blank() {
        assert_eq!(
            normalize_required_name(" ", "category"),
            Err(EngineError::InvalidName("category name must not be empty".to_string()))
        );
    }
}
