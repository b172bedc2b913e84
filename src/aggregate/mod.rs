//! Group-by counting shared by the chart, top-N and stat-card widgets.

use chrono::{DateTime, Duration, Timelike, Utc};
use std::collections::{HashMap, HashSet};

use crate::models::record::{
    action_label, device_name, protocol_family, resolve_chain, DEST_IP_RESOLVERS,
    SOURCE_IP_RESOLVERS,
};
use crate::models::widget::StatField;
use crate::models::LogRecord;

/// Placeholder keys excluded from ranked output.
const PLACEHOLDER_KEYS: [&str; 2] = ["unknown", "-"];

/// A grouping key from the fixed vocabulary, or an arbitrary field lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupKey {
    Severity,
    Protocol,
    EventType,
    DeviceType,
    /// Device/hostname through the multi-source resolver chain.
    Device,
    SourceIp,
    DestIp,
    Action,
    EventCategory,
    /// Any other field, resolved attribute-first then `parsed_fields`.
    Field(String),
}

impl GroupKey {
    pub fn parse(s: &str) -> Self {
        match s {
            "severity" => Self::Severity,
            "protocol" => Self::Protocol,
            "event_type" => Self::EventType,
            "device_type" => Self::DeviceType,
            "hostname" | "device" => Self::Device,
            "source_ip" | "src" => Self::SourceIp,
            "dest_ip" | "dst" => Self::DestIp,
            "action" => Self::Action,
            "event_category" => Self::EventCategory,
            other => Self::Field(other.to_string()),
        }
    }

    /// Resolve the grouping value for one record.
    pub fn resolve(&self, record: &LogRecord) -> Option<String> {
        match self {
            Self::Severity => Some(record.severity_name().to_string()),
            Self::Protocol => Some(protocol_family(record)),
            Self::EventType => some_non_empty(&record.event_type),
            Self::DeviceType => some_non_empty(&record.device_type),
            Self::Device => Some(device_name(record)),
            Self::SourceIp => resolve_chain(SOURCE_IP_RESOLVERS, record),
            Self::DestIp => resolve_chain(DEST_IP_RESOLVERS, record),
            Self::Action => action_label(record),
            Self::EventCategory => some_non_empty(&record.event_category),
            Self::Field(key) => record.resolve_field(key),
        }
    }
}

fn some_non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Count records per resolved key. Keys appear in first-seen order;
/// unresolvable records land in the "unknown" bucket.
pub fn aggregate(records: &[LogRecord], key: &GroupKey) -> Vec<(String, u64)> {
    let mut order: Vec<(String, u64)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        let value = key.resolve(record).unwrap_or_else(|| "unknown".to_string());
        match index.get(&value) {
            Some(&i) => order[i].1 += 1,
            None => {
                index.insert(value.clone(), order.len());
                order.push((value, 1));
            }
        }
    }
    order
}

/// Ranked aggregation: placeholder keys dropped, counts descending, ties in
/// first-seen order (stable sort), truncated to `n`.
pub fn top_n(records: &[LogRecord], key: &GroupKey, n: usize) -> Vec<(String, u64)> {
    let mut groups: Vec<(String, u64)> = aggregate(records, key)
        .into_iter()
        .filter(|(k, _)| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k.as_str()))
        .collect();
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups.truncate(n);
    groups
}

/// Scalar aggregate for a stat card, relative to `now` for the recent window.
pub fn evaluate_stat(records: &[LogRecord], field: StatField, now: DateTime<Utc>) -> u64 {
    match field {
        StatField::Total => records.len() as u64,
        StatField::Recent => {
            let cutoff = now - Duration::hours(1);
            records
                .iter()
                .filter(|r| r.timestamp.map(|t| t > cutoff).unwrap_or(false))
                .count() as u64
        }
        StatField::Errors => records.iter().filter(|r| r.severity <= 3).count() as u64,
        StatField::Hosts => {
            let hosts: HashSet<&str> = records
                .iter()
                .map(|r| r.hostname.as_str())
                .filter(|h| !h.is_empty())
                .collect();
            hosts.len() as u64
        }
        StatField::Devices => {
            let devices: HashSet<&str> = records
                .iter()
                .map(|r| r.device_type.as_str())
                .filter(|d| !d.is_empty())
                .collect();
            devices.len() as u64
        }
    }
}

/// Count records into chronological buckets whose width depends on the
/// displayed window. Returns `(bucket label, count)` in time order.
pub fn timeline(records: &[LogRecord], bucket_minutes: i64) -> Vec<(String, u64)> {
    let mut buckets: HashMap<DateTime<Utc>, u64> = HashMap::new();
    for record in records {
        if let Some(ts) = record.timestamp {
            *buckets.entry(floor_to_bucket(ts, bucket_minutes)).or_insert(0) += 1;
        }
    }

    let mut ordered: Vec<_> = buckets.into_iter().collect();
    ordered.sort_by_key(|(t, _)| *t);
    ordered
        .into_iter()
        .map(|(t, count)| (bucket_label(t, bucket_minutes), count))
        .collect()
}

fn floor_to_bucket(ts: DateTime<Utc>, bucket_minutes: i64) -> DateTime<Utc> {
    let ts = ts.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(ts);
    if bucket_minutes >= 1440 {
        ts.with_hour(0).and_then(|t| t.with_minute(0)).unwrap_or(ts)
    } else if bucket_minutes >= 60 {
        let hours = bucket_minutes / 60;
        let floored = (ts.hour() as i64 / hours) * hours;
        ts.with_hour(floored as u32)
            .and_then(|t| t.with_minute(0))
            .unwrap_or(ts)
    } else {
        let floored = (ts.minute() as i64 / bucket_minutes) * bucket_minutes;
        ts.with_minute(floored as u32).unwrap_or(ts)
    }
}

fn bucket_label(ts: DateTime<Utc>, bucket_minutes: i64) -> String {
    if bucket_minutes >= 1440 {
        ts.format("%b %-d").to_string()
    } else if bucket_minutes >= 360 {
        ts.format("%b %-d %H:00").to_string()
    } else {
        ts.format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn record(severity: u8) -> LogRecord {
        LogRecord {
            severity,
            ..Default::default()
        }
    }

    fn with_field(key: &str, value: serde_json::Value) -> LogRecord {
        let mut r = LogRecord::default();
        r.parsed_fields.insert(key.to_string(), value);
        r
    }

    #[test]
    fn aggregate_by_severity_keeps_first_seen_order() {
        let records = vec![record(0), record(0), record(3), record(7)];
        let groups = aggregate(&records, &GroupKey::Severity);
        assert_eq!(
            groups,
            vec![
                ("Emergency".to_string(), 2),
                ("Error".to_string(), 1),
                ("Debug".to_string(), 1),
            ]
        );
    }

    #[test]
    fn top_n_ties_keep_first_seen_order() {
        let records = vec![record(0), record(0), record(3), record(7)];
        // Error (1) was seen before Debug (1): stable sort keeps that order.
        let top = top_n(&records, &GroupKey::Severity, 2);
        assert_eq!(
            top,
            vec![("Emergency".to_string(), 2), ("Error".to_string(), 1)]
        );
    }

    #[test]
    fn top_n_is_bounded_and_non_increasing() {
        let mut records = Vec::new();
        for (sev, n) in [(3u8, 5usize), (4, 2), (6, 7), (7, 1)] {
            records.extend(std::iter::repeat_with(|| record(sev)).take(n));
        }
        let top = top_n(&records, &GroupKey::Severity, 3);
        assert_eq!(top.len(), 3);
        assert!(top.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(top[0], ("Informational".to_string(), 7));
    }

    #[test]
    fn top_n_excludes_placeholder_keys() {
        let records = vec![
            with_field("src", json!("10.0.0.2:443")),
            with_field("src", json!("10.0.0.2")),
            LogRecord::default(), // no src at all -> excluded
            with_field("src", json!("-")),
        ];
        let top = top_n(&records, &GroupKey::SourceIp, 10);
        assert_eq!(top, vec![("10.0.0.2".to_string(), 2)]);

        // The raw aggregate still counts the unresolvable records.
        let all = aggregate(&records, &GroupKey::SourceIp);
        assert!(all.iter().any(|(k, c)| k == "unknown" && *c == 1));
        assert!(all.iter().any(|(k, c)| k == "-" && *c == 1));
    }

    #[test]
    fn protocol_grouping_uses_parsed_protocol_then_version() {
        let mut v5424 = LogRecord::default();
        v5424.version = 1;
        let records = vec![
            with_field("protocol", json!("udp")),
            v5424,
            LogRecord::default(),
        ];
        let groups = aggregate(&records, &GroupKey::Protocol);
        assert_eq!(
            groups,
            vec![
                ("UDP".to_string(), 1),
                ("RFC5424".to_string(), 1),
                ("RFC3164".to_string(), 1),
            ]
        );
    }

    #[test]
    fn scalar_stats() {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut recent = record(6);
        recent.timestamp = Some(now - Duration::minutes(20));
        recent.hostname = "gw-01".to_string();
        recent.device_type = "meraki".to_string();

        let mut old = record(2);
        old.timestamp = Some(now - Duration::hours(5));
        old.hostname = "gw-01".to_string();
        old.device_type = "ubiquiti".to_string();

        let mut untimed = record(3);
        untimed.hostname = "ap-02".to_string();

        let records = vec![recent, old, untimed];
        assert_eq!(evaluate_stat(&records, StatField::Total, now), 3);
        assert_eq!(evaluate_stat(&records, StatField::Recent, now), 1);
        assert_eq!(evaluate_stat(&records, StatField::Errors, now), 2);
        assert_eq!(evaluate_stat(&records, StatField::Hosts, now), 2);
        assert_eq!(evaluate_stat(&records, StatField::Devices, now), 2);
    }

    #[test]
    fn timeline_buckets_and_orders_chronologically() {
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        let mut records = Vec::new();
        for minutes in [2, 3, 7, 62] {
            let mut r = record(6);
            r.timestamp = Some(base + Duration::minutes(minutes));
            records.push(r);
        }

        let buckets = timeline(&records, 5);
        assert_eq!(
            buckets,
            vec![
                ("10:00".to_string(), 2),
                ("10:05".to_string(), 1),
                ("11:00".to_string(), 1),
            ]
        );

        let hourly = timeline(&records, 60);
        assert_eq!(
            hourly,
            vec![("10:00".to_string(), 3), ("11:00".to_string(), 1)]
        );
    }
}
