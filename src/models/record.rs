use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Syslog severity names, indexed 0-7.
pub const SEVERITY_NAMES: [&str; 8] = [
    "Emergency",
    "Alert",
    "Critical",
    "Error",
    "Warning",
    "Notice",
    "Informational",
    "Debug",
];

/// One ingested log record as returned by the backend.
///
/// The fixed attributes mirror the backend's row shape; everything the
/// device-specific parsers extracted lives in `parsed_fields`, whose key set
/// depends on device and event type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: Option<DateTime<Utc>>,
    pub priority: u8,
    pub facility: u8,
    pub severity: u8,
    pub version: u16,
    pub hostname: String,
    pub appname: String,
    pub procid: String,
    pub msgid: String,
    pub message: String,
    pub raw_message: String,
    pub remote_addr: String,
    pub device_type: String,
    pub event_type: String,
    pub event_category: String,
    pub parsed_fields: HashMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Severity name for display and grouping, "Unknown" past the table.
    pub fn severity_name(&self) -> &'static str {
        SEVERITY_NAMES
            .get(self.severity as usize)
            .copied()
            .unwrap_or("Unknown")
    }

    /// Fetch a parsed field as a string. JSON strings come back verbatim,
    /// other scalars through their JSON rendering, null as absent.
    pub fn parsed_str(&self, key: &str) -> Option<String> {
        match self.parsed_fields.get(key)? {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Resolve a logical field reference: fixed attributes first, then the
    /// `parsed_fields` bag. Absent fields resolve to `None`, never an error.
    pub fn resolve_field(&self, key: &str) -> Option<String> {
        let fixed = match key {
            "id" => Some(self.id.to_string()),
            "timestamp" => self.timestamp.map(|t| t.to_rfc3339()),
            "priority" => Some(self.priority.to_string()),
            "facility" => Some(self.facility.to_string()),
            "severity" => Some(self.severity.to_string()),
            "version" => Some(self.version.to_string()),
            "hostname" => non_empty(&self.hostname),
            "appname" => non_empty(&self.appname),
            "procid" => non_empty(&self.procid),
            "msgid" => non_empty(&self.msgid),
            "message" => non_empty(&self.message),
            "raw_message" => non_empty(&self.raw_message),
            "remote_addr" => non_empty(&self.remote_addr),
            "device_type" => non_empty(&self.device_type),
            "event_type" => non_empty(&self.event_type),
            "event_category" => non_empty(&self.event_category),
            _ => None,
        };
        fixed.or_else(|| self.parsed_str(key))
    }

    /// Values the free-text search and device filters match against:
    /// hostname, raw message, and the device-name lookup fields.
    pub fn search_haystack(&self) -> Vec<String> {
        let mut hay = vec![self.hostname.clone(), self.raw_message.clone()];
        for key in ["UNIFIhost", "host"] {
            if let Some(v) = self.parsed_str(key) {
                hay.push(v);
            }
        }
        hay
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// A named field resolver: one strategy in a fallback chain.
pub type FieldResolver = fn(&LogRecord) -> Option<String>;

/// Device-name resolution chain, tried in priority order.
pub const DEVICE_NAME_RESOLVERS: &[(&str, FieldResolver)] = &[
    ("parsed.UNIFIhost", |r| r.parsed_str("UNIFIhost")),
    ("parsed.host", |r| r.parsed_str("host")),
    ("parsed.device_model", |r| r.parsed_str("device_model")),
    ("hostname", |r| non_empty(&r.hostname)),
];

/// Source-IP resolution chain. `src` values may carry a `:port` suffix.
pub const SOURCE_IP_RESOLVERS: &[(&str, FieldResolver)] = &[
    ("parsed.source_ip", |r| r.parsed_str("source_ip")),
    ("parsed.src", |r| {
        r.parsed_str("src")
            .map(|s| s.split(':').next().unwrap_or(&s).to_string())
    }),
    ("parsed.UNIFIclientIp", |r| r.parsed_str("UNIFIclientIp")),
];

/// Destination-IP resolution chain.
pub const DEST_IP_RESOLVERS: &[(&str, FieldResolver)] = &[
    ("parsed.dest_ip", |r| r.parsed_str("dest_ip")),
    ("parsed.dst", |r| {
        r.parsed_str("dst")
            .map(|s| s.split(':').next().unwrap_or(&s).to_string())
    }),
];

/// Run a resolver chain, returning the first strategy that produces a value.
pub fn resolve_chain(chain: &[(&str, FieldResolver)], record: &LogRecord) -> Option<String> {
    chain.iter().find_map(|(_, f)| f(record))
}

/// Device name for a record, or "unknown" when no strategy applies.
pub fn device_name(record: &LogRecord) -> String {
    resolve_chain(DEVICE_NAME_RESOLVERS, record).unwrap_or_else(|| "unknown".to_string())
}

/// Wire protocol family for a record: the explicit parsed protocol when
/// present (uppercased), else inferred from the syslog header version.
pub fn protocol_family(record: &LogRecord) -> String {
    if let Some(proto) = record.parsed_str("protocol") {
        return proto.to_uppercase();
    }
    if record.version > 0 {
        "RFC5424".to_string()
    } else {
        "RFC3164".to_string()
    }
}

/// Firewall action for a record: explicit parsed action, else a raw-message
/// heuristic used by Meraki flow events.
pub fn action_label(record: &LogRecord) -> Option<String> {
    if let Some(action) = record.parsed_str("action") {
        return Some(action);
    }
    let raw = record.raw_message.to_lowercase();
    if raw.contains(" allow ") {
        Some("allow".to_string())
    } else if raw.contains(" deny ") || raw.contains(" blocked ") {
        Some("deny".to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record_with(fields: &[(&str, serde_json::Value)]) -> LogRecord {
        LogRecord {
            hostname: "gw-01".to_string(),
            parsed_fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn fixed_attributes_win_over_parsed_fields() {
        let mut record = record_with(&[("hostname", json!("shadow"))]);
        record.hostname = "real-host".to_string();
        assert_eq!(record.resolve_field("hostname").as_deref(), Some("real-host"));
    }

    #[test]
    fn parsed_fields_are_the_fallback() {
        let record = record_with(&[("signature", json!("ET SCAN"))]);
        assert_eq!(record.resolve_field("signature").as_deref(), Some("ET SCAN"));
        assert_eq!(record.resolve_field("nope"), None);
    }

    #[test]
    fn numeric_parsed_values_coerce_to_strings() {
        let record = record_with(&[("dport", json!(443))]);
        assert_eq!(record.resolve_field("dport").as_deref(), Some("443"));
    }

    #[test]
    fn device_name_prefers_unifi_host() {
        let record = record_with(&[("UNIFIhost", json!("AP-Attic")), ("host", json!("other"))]);
        assert_eq!(device_name(&record), "AP-Attic");

        let record = record_with(&[]);
        assert_eq!(device_name(&record), "gw-01");

        let mut record = record_with(&[]);
        record.hostname.clear();
        assert_eq!(device_name(&record), "unknown");
    }

    #[test]
    fn protocol_family_uppercases_and_falls_back_to_rfc() {
        let record = record_with(&[("protocol", json!("tcp"))]);
        assert_eq!(protocol_family(&record), "TCP");

        let mut record = record_with(&[]);
        record.version = 1;
        assert_eq!(protocol_family(&record), "RFC5424");
        record.version = 0;
        assert_eq!(protocol_family(&record), "RFC3164");
    }

    #[test]
    fn action_label_uses_raw_message_heuristic() {
        let record = record_with(&[("action", json!("accept"))]);
        assert_eq!(action_label(&record).as_deref(), Some("accept"));

        let mut record = record_with(&[]);
        record.raw_message = "flows allow tcp 10.0.0.2 -> 8.8.8.8".to_string();
        assert_eq!(action_label(&record).as_deref(), Some("allow"));

        record.raw_message = "firewall src=10.0.0.2 deny all".to_string();
        assert_eq!(action_label(&record).as_deref(), Some("deny"));

        record.raw_message = "denylist updated".to_string();
        assert_eq!(action_label(&record), None);
    }

    #[test]
    fn severity_name_table() {
        let mut record = record_with(&[]);
        record.severity = 0;
        assert_eq!(record.severity_name(), "Emergency");
        record.severity = 7;
        assert_eq!(record.severity_name(), "Debug");
        record.severity = 42;
        assert_eq!(record.severity_name(), "Unknown");
    }
}
