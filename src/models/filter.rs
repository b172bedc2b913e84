use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::record::LogRecord;

/// Relative time window tokens understood by the backend's `date_range`
/// query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelativeRange {
    #[serde(rename = "1h")]
    LastHour,
    #[serde(rename = "24h")]
    Last24Hours,
    #[serde(rename = "7d")]
    Last7Days,
    #[serde(rename = "30d")]
    Last30Days,
}

impl Default for RelativeRange {
    fn default() -> Self {
        Self::Last24Hours
    }
}

impl RelativeRange {
    pub fn as_token(self) -> &'static str {
        match self {
            Self::LastHour => "1h",
            Self::Last24Hours => "24h",
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
        }
    }

    /// Timeline bucket width for this window, in minutes.
    pub fn bucket_minutes(self) -> i64 {
        match self {
            Self::LastHour => 5,
            Self::Last24Hours => 60,
            Self::Last7Days => 360,
            Self::Last30Days => 1440,
        }
    }
}

impl fmt::Display for RelativeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_token())
    }
}

/// Time scope of a filter: a relative token or an explicit range forwarded
/// as `date_from`/`date_to`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeRange {
    Relative(RelativeRange),
    Explicit { from: String, to: String },
}

impl Default for TimeRange {
    fn default() -> Self {
        Self::Relative(RelativeRange::default())
    }
}

/// Comparison operators for custom field filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Regex,
    GreaterThan,
    LessThan,
}

impl Default for FilterOperator {
    fn default() -> Self {
        Self::Contains
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Regex => "regex",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
        };
        write!(f, "{}", s)
    }
}

impl FilterOperator {
    pub fn all() -> &'static [FilterOperator] {
        &[
            Self::Equals,
            Self::NotEquals,
            Self::Contains,
            Self::NotContains,
            Self::StartsWith,
            Self::EndsWith,
            Self::Regex,
            Self::GreaterThan,
            Self::LessThan,
        ]
    }
}

/// A single `(key, operator, value)` constraint over a resolved record field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomFieldFilter {
    pub key: String,
    pub operator: FilterOperator,
    pub value: String,
}

impl CustomFieldFilter {
    /// Evaluate against one record. A filter with an empty key or value is
    /// inert: it always passes.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if self.key.trim().is_empty() || self.value.trim().is_empty() {
            return true;
        }
        let field_value = record.resolve_field(&self.key).unwrap_or_default();
        evaluate_operator(&field_value, self.operator, &self.value)
    }
}

/// Apply one operator to a resolved field value.
///
/// All string comparisons are case-insensitive. `greater_than`/`less_than`
/// compare numerically when both operands parse as numbers and fall back to
/// lexicographic comparison otherwise; an invalid regex never matches.
pub fn evaluate_operator(field_value: &str, operator: FilterOperator, filter_value: &str) -> bool {
    let value = field_value.to_lowercase();
    let filter = filter_value.to_lowercase();

    match operator {
        FilterOperator::Equals => value == filter,
        FilterOperator::NotEquals => value != filter,
        FilterOperator::Contains => value.contains(&filter),
        FilterOperator::NotContains => !value.contains(&filter),
        FilterOperator::StartsWith => value.starts_with(&filter),
        FilterOperator::EndsWith => value.ends_with(&filter),
        FilterOperator::Regex => match RegexBuilder::new(filter_value)
            .case_insensitive(true)
            .build()
        {
            Ok(re) => re.is_match(field_value),
            Err(_) => false,
        },
        FilterOperator::GreaterThan | FilterOperator::LessThan => {
            let ordering = match (field_value.parse::<f64>(), filter_value.parse::<f64>()) {
                (Ok(a), Ok(b)) => a.partial_cmp(&b),
                _ => Some(value.cmp(&filter)),
            };
            match (operator, ordering) {
                (FilterOperator::GreaterThan, Some(ord)) => ord == std::cmp::Ordering::Greater,
                (FilterOperator::LessThan, Some(ord)) => ord == std::cmp::Ordering::Less,
                _ => false,
            }
        }
    }
}

/// The full set of constraints scoping one widget's data.
///
/// Empty scalar fields mean "no constraint". Custom field filters are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub device: String,
    pub device_type: String,
    pub event_type: String,
    pub severity: String,
    #[serde(rename = "timeRange")]
    pub time_range: TimeRange,
    pub search: String,
    pub custom_fields: Vec<CustomFieldFilter>,
}

impl FilterSpec {
    /// Keep/drop decision for one record. Constraints are checked in a fixed
    /// order and short-circuit on first failure; order affects only cost.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Ok(sev) = self.severity.parse::<u8>() {
            if record.severity != sev {
                return false;
            }
        }

        if !self.device_type.is_empty() && record.device_type != self.device_type {
            return false;
        }

        if !self.event_type.is_empty() && record.event_type != self.event_type {
            return false;
        }

        if !self.search.is_empty() && !haystack_contains(record, &self.search) {
            return false;
        }

        if !self.device.is_empty() && !haystack_contains(record, &self.device) {
            return false;
        }

        self.custom_fields.iter().all(|f| f.matches(record))
    }

    /// Count of active constraints, shown in the builder's filter summary.
    pub fn active_count(&self) -> usize {
        [
            !self.device.is_empty(),
            !self.device_type.is_empty(),
            !self.event_type.is_empty(),
            !self.severity.is_empty(),
            !self.search.is_empty(),
        ]
        .iter()
        .filter(|b| **b)
        .count()
            + self.custom_fields.len()
    }

    pub fn relative_range(&self) -> Option<RelativeRange> {
        match self.time_range {
            TimeRange::Relative(r) => Some(r),
            TimeRange::Explicit { .. } => None,
        }
    }
}

fn haystack_contains(record: &LogRecord, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    record
        .search_haystack()
        .iter()
        .any(|h| h.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(severity: u8, hostname: &str, fields: &[(&str, serde_json::Value)]) -> LogRecord {
        LogRecord {
            severity,
            hostname: hostname.to_string(),
            parsed_fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    fn custom(key: &str, operator: FilterOperator, value: &str) -> CustomFieldFilter {
        CustomFieldFilter {
            key: key.to_string(),
            operator,
            value: value.to_string(),
        }
    }

    #[test]
    fn empty_key_or_value_is_inert() {
        let r = record(3, "gw", &[]);
        for op in FilterOperator::all() {
            assert!(custom("", *op, "anything").matches(&r), "{}", op);
            assert!(custom("protocol", *op, "").matches(&r), "{}", op);
        }
    }

    #[test]
    fn string_operators_are_case_insensitive() {
        let r = record(3, "gw", &[("protocol", json!("TCP"))]);
        assert!(custom("protocol", FilterOperator::Equals, "tcp").matches(&r));
        assert!(custom("protocol", FilterOperator::Contains, "tc").matches(&r));
        assert!(custom("protocol", FilterOperator::StartsWith, "T").matches(&r));
        assert!(custom("protocol", FilterOperator::EndsWith, "cp").matches(&r));
        assert!(!custom("protocol", FilterOperator::NotEquals, "TCP").matches(&r));
        assert!(!custom("protocol", FilterOperator::NotContains, "c").matches(&r));
    }

    #[test]
    fn invalid_regex_never_matches() {
        assert!(!evaluate_operator("anything", FilterOperator::Regex, "[unclosed"));
        assert!(evaluate_operator("ET SCAN sweep", FilterOperator::Regex, "^et scan"));
    }

    #[test]
    fn comparison_is_numeric_when_both_sides_parse() {
        // "9" < "10" numerically...
        assert!(evaluate_operator("9", FilterOperator::LessThan, "10"));
        assert!(evaluate_operator("10", FilterOperator::GreaterThan, "9"));
        // ...but lexicographic once either side stops being a number.
        assert!(!evaluate_operator("9", FilterOperator::LessThan, "10a"));
        assert!(evaluate_operator("9", FilterOperator::GreaterThan, "10a"));
    }

    #[test]
    fn missing_field_resolves_to_empty_string() {
        let r = record(3, "gw", &[]);
        // "" != "x", so not_equals passes and equals fails
        assert!(custom("absent", FilterOperator::NotEquals, "x").matches(&r));
        assert!(!custom("absent", FilterOperator::Equals, "x").matches(&r));
    }

    #[test]
    fn spec_severity_equality() {
        let spec = FilterSpec {
            severity: "3".to_string(),
            ..Default::default()
        };
        assert!(spec.matches(&record(3, "gw", &[])));
        assert!(!spec.matches(&record(4, "gw", &[])));

        // Unparsable severity is no constraint, matching the backend parser.
        let spec = FilterSpec {
            severity: "high".to_string(),
            ..Default::default()
        };
        assert!(spec.matches(&record(7, "gw", &[])));
    }

    #[test]
    fn spec_search_matches_hostname_raw_and_lookup_fields() {
        let spec = FilterSpec {
            search: "attic".to_string(),
            ..Default::default()
        };
        assert!(spec.matches(&record(6, "AP-Attic", &[])));
        assert!(spec.matches(&record(6, "gw", &[("UNIFIhost", json!("Attic-Switch"))])));
        assert!(spec.matches(&record(6, "gw", &[("host", json!("attic-ap"))])));

        let mut r = record(6, "gw", &[]);
        r.raw_message = "<134> link up on ATTIC port 3".to_string();
        assert!(spec.matches(&r));

        assert!(!spec.matches(&record(6, "gw", &[])));
    }

    #[test]
    fn spec_device_uses_same_or_set_as_search() {
        let spec = FilterSpec {
            device: "MX67".to_string(),
            ..Default::default()
        };
        assert!(spec.matches(&record(6, "branch-mx67", &[])));
        assert!(!spec.matches(&record(6, "ap-lobby", &[])));
    }

    #[test]
    fn custom_fields_are_anded() {
        let spec = FilterSpec {
            custom_fields: vec![
                custom("protocol", FilterOperator::Equals, "tcp"),
                custom("dport", FilterOperator::Equals, "443"),
            ],
            ..Default::default()
        };
        let hit = record(6, "gw", &[("protocol", json!("TCP")), ("dport", json!(443))]);
        let miss = record(6, "gw", &[("protocol", json!("TCP")), ("dport", json!(80))]);
        assert!(spec.matches(&hit));
        assert!(!spec.matches(&miss));
    }

    #[test]
    fn severity_filter_keeps_matching_records_in_order() {
        let spec = FilterSpec {
            severity: "3".to_string(),
            ..Default::default()
        };
        let severities = [6u8, 3, 5, 3, 0];
        let records: Vec<LogRecord> = severities
            .iter()
            .enumerate()
            .map(|(i, sev)| {
                let mut r = record(*sev, "gw", &[]);
                r.id = i as i64;
                r
            })
            .collect();

        let kept: Vec<i64> = records
            .iter()
            .filter(|r| spec.matches(r))
            .map(|r| r.id)
            .collect();
        assert_eq!(kept, vec![1, 3]);
    }

    #[test]
    fn time_range_round_trips_both_shapes() {
        let relative: TimeRange = serde_json::from_str("\"7d\"").unwrap();
        assert_eq!(relative, TimeRange::Relative(RelativeRange::Last7Days));
        assert_eq!(serde_json::to_string(&relative).unwrap(), "\"7d\"");

        let explicit: TimeRange =
            serde_json::from_str(r#"{"from":"2026-01-01T00:00:00Z","to":"2026-01-02T00:00:00Z"}"#)
                .unwrap();
        assert!(matches!(explicit, TimeRange::Explicit { .. }));
    }
}
