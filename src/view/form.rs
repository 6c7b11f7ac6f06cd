use crate::families::{FamilySelection, KeyFilter, NistLevel};
use crate::model::{MemMetric, Operation};
use serde::{Deserialize, Serialize};

/// Date filter: one concrete date, or the whole time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateChoice {
    All,
    Date(String),
}

impl DateChoice {
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("all") {
            DateChoice::All
        } else {
            DateChoice::Date(s.to_string())
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, DateChoice::All)
    }
}

impl std::fmt::Display for DateChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateChoice::All => f.write_str("All"),
            DateChoice::Date(d) => f.write_str(d),
        }
    }
}

/// Snapshot of the filter form, read on every submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    /// `None` until the loader supplies a default.
    pub date: Option<DateChoice>,
    pub metric: MemMetric,
    pub keygen_min: Option<i64>,
    pub encap_min: Option<i64>,
    pub decap_min: Option<i64>,
    pub nist_level: NistLevel,
    pub families: FamilySelection,
    pub key_filter: KeyFilter,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            date: None,
            metric: MemMetric::MaxHeap,
            keygen_min: None,
            encap_min: None,
            decap_min: None,
            nist_level: NistLevel::All,
            families: FamilySelection::default(),
            key_filter: KeyFilter::default(),
        }
    }
}

impl FormState {
    pub fn min_for(&self, op: Operation) -> Option<i64> {
        match op {
            Operation::Keygen => self.keygen_min,
            Operation::Encaps => self.encap_min,
            Operation::Decaps => self.decap_min,
        }
    }
}

/// Parse a threshold field: optional sign and leading digits after whitespace,
/// trailing garbage ignored. Anything without digits means "no minimum"; digit runs
/// beyond the `i64` range saturate.
pub fn parse_threshold(s: &str) -> Option<i64> {
    let t = s.trim_start();
    let (neg, rest) = match t.as_bytes().first() {
        Some(b'-') => (true, &t[1..]),
        Some(b'+') => (false, &t[1..]),
        _ => (false, t),
    };
    let digits: &str = {
        let end = rest
            .bytes()
            .position(|b| !b.is_ascii_digit())
            .unwrap_or(rest.len());
        &rest[..end]
    };
    if digits.is_empty() {
        return None;
    }
    // only overflow can fail here
    let v: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(if neg { -v } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_parsing_follows_integer_prefix() {
        assert_eq!(parse_threshold("1000"), Some(1000));
        assert_eq!(parse_threshold("  42kB"), Some(42));
        assert_eq!(parse_threshold("12.9"), Some(12));
        assert_eq!(parse_threshold("-5"), Some(-5));
        assert_eq!(parse_threshold(""), None);
        assert_eq!(parse_threshold("abc"), None);
        assert_eq!(parse_threshold("-"), None);
    }

    #[test]
    fn oversized_threshold_saturates() {
        assert_eq!(parse_threshold("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_threshold("-99999999999999999999x"), Some(-i64::MAX));
    }

    #[test]
    fn date_choice_parsing() {
        assert_eq!(DateChoice::parse("All"), DateChoice::All);
        assert_eq!(DateChoice::parse("all"), DateChoice::All);
        assert_eq!(
            DateChoice::parse("2021-04-01"),
            DateChoice::Date("2021-04-01".into())
        );
    }
}
