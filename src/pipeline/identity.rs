use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::constants::{KEY_DELIMITER, MONTH_ABBREVIATIONS};
use crate::domain::TrafficRecord;

/// Canonical key for one airport's statistics in one calendar month and year
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityKey(String);

impl IdentityKey {
    pub fn new(airport_name: &str, month: &str, year: i32) -> Self {
        let raw = format!(
            "{}{}{}{}{}",
            airport_name.trim(),
            KEY_DELIMITER,
            month_index(month),
            KEY_DELIMITER,
            year
        );
        IdentityKey(raw.to_lowercase())
    }

    pub fn for_record(record: &TrafficRecord) -> Self {
        Self::new(&record.airport_name, &record.month, record.year)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Render the control delimiter readably
        write!(f, "{}", self.0.replace(KEY_DELIMITER, "|"))
    }
}

/// Resolve a free-form month label to its index in `0..12`.
///
/// Matches case-insensitively on the label starting with a canonical
/// three-letter abbreviation, so "Sep", "sept" and "September" all resolve
/// to 8. Returns `None` when nothing matches.
pub fn resolve_month(label: &str) -> Option<usize> {
    let label = label.trim().to_lowercase();
    MONTH_ABBREVIATIONS
        .iter()
        .position(|abbr| label.starts_with(&abbr.to_lowercase()))
}

/// Lenient month resolution: unrecognized labels fall back to January (0).
pub fn month_index(label: &str) -> usize {
    resolve_month(label).unwrap_or(0)
}

/// Chronological sort key for a period, `year * 100 + month_index`
pub fn period_sort_key(month: &str, year: i32) -> i64 {
    i64::from(year) * 100 + month_index(month) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_month_variants() {
        assert_eq!(resolve_month("Sep"), Some(8));
        assert_eq!(resolve_month("SEPTEMBER"), Some(8));
        assert_eq!(resolve_month("  sept "), Some(8));
        assert_eq!(resolve_month("dec"), Some(11));
        assert_eq!(resolve_month("Q3"), None);
        assert_eq!(resolve_month(""), None);
    }

    #[test]
    fn test_unrecognized_month_defaults_to_january() {
        assert_eq!(month_index("Fiscal"), 0);
        assert_eq!(month_index("Jan"), 0);
    }

    #[test]
    fn test_key_ignores_case_whitespace_and_month_spelling() {
        let a = IdentityKey::new("  Chennai Intl ", "Sep", 2024);
        let b = IdentityKey::new("chennai intl", "September", 2024);
        assert_eq!(a, b);

        assert_ne!(a, IdentityKey::new("Chennai Intl", "Oct", 2024));
        assert_ne!(a, IdentityKey::new("Chennai Intl", "Sep", 2023));
        assert_ne!(a, IdentityKey::new("Chennai", "Sep", 2024));
    }

    #[test]
    fn test_key_parts_cannot_bleed_into_each_other() {
        // "Delhi1" + month 1 vs "Delhi" + month 11 must not collide
        let a = IdentityKey::new("Delhi1", "Feb", 2024);
        let b = IdentityKey::new("Delhi", "Dec", 2024);
        assert_ne!(a, b);
    }

    #[test]
    fn test_period_sort_key() {
        assert_eq!(period_sort_key("Feb", 2023), 202301);
        assert_eq!(period_sort_key("Jan", 2024), 202400);
        assert!(period_sort_key("Dec", 2023) < period_sort_key("Jan", 2024));
    }

    #[test]
    fn test_display_is_readable() {
        let key = IdentityKey::new("Pune", "Mar", 2025);
        assert_eq!(key.to_string(), "pune|2|2025");
    }
}
