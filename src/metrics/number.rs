//! Numeric normalization for scraped metric text
//!
//! The country sheets print figures with thousands separators, unit suffixes,
//! percent signs and the occasional "n/a". Everything funnels through
//! [`parse_number`], which never fails outward: anything it cannot read
//! degrades to "absent".

use serde::{Serialize, Serializer};
use std::fmt;

/// Literal the site prints when a figure is not available
pub const NOT_AVAILABLE: &str = "n/a";

/// A metric the page actually stated
///
/// Absence (the field was not found, or its text was unreadable) is modelled
/// as `Option::None` around this type, so the three states stay distinct:
/// `Some(Value)`, `Some(NotAvailable)` and `None`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    /// A concrete figure
    Value(f64),
    /// The page explicitly printed "n/a"
    NotAvailable,
}

impl Metric {
    /// Returns the numeric value, if the page gave one
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::NotAvailable => None,
        }
    }

    /// Returns true for a concrete figure
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{}", v),
            Self::NotAvailable => f.write_str(NOT_AVAILABLE),
        }
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(v) => serializer.serialize_f64(*v),
            Self::NotAvailable => serializer.serialize_str(NOT_AVAILABLE),
        }
    }
}

/// Parses a scraped text fragment into a metric
///
/// # Rules
///
/// | Input | Result |
/// |-------|--------|
/// | empty / whitespace | `None` |
/// | `n/a` (any case, trimmed) | `Some(Metric::NotAvailable)` |
/// | no digits after filtering (`"%"`) | `None` |
/// | more than one `.` (`"12.3.4"`) | integer part + first fraction (`12.3`) |
/// | anything else | digits and `.` only, commas dropped |
///
/// # Example
///
/// ```
/// use ewaste_harvest::metrics::{parse_number, Metric};
///
/// assert_eq!(parse_number("1,234.5"), Some(Metric::Value(1234.5)));
/// assert_eq!(parse_number("N/A"), Some(Metric::NotAvailable));
/// assert_eq!(parse_number("%"), None);
/// ```
pub fn parse_number(text: &str) -> Option<Metric> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.eq_ignore_ascii_case(NOT_AVAILABLE) {
        return Some(Metric::NotAvailable);
    }

    let filtered: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if !filtered.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }

    let candidate = if filtered.matches('.').count() > 1 {
        // Malformed decimal: keep "<int>.<first fraction>"
        let mut parts = filtered.split('.');
        let int_part = parts.next().unwrap_or_default();
        let frac_part = parts.next().unwrap_or_default();
        format!("{}.{}", int_part, frac_part)
    } else {
        filtered
    };

    match candidate.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Metric::Value(v)),
        _ => {
            tracing::trace!("Unreadable numeric text '{}'", text);
            None
        }
    }
}
