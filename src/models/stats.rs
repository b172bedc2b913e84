use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Aggregate summary returned by the backend's stats endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsSummary {
    pub total: u64,
    pub recent_hour: u64,
    /// Counts keyed by the eight severity names.
    pub by_severity: HashMap<String, u64>,
    pub by_hostname: HashMap<String, u64>,
    pub by_protocol: HashMap<String, u64>,
    pub device_types: HashMap<String, u64>,
}

impl StatsSummary {
    /// Top device types by count, descending, ties by name so the listing is
    /// stable across refreshes.
    pub fn top_device_types(&self, n: usize) -> Vec<(String, u64)> {
        let mut entries: Vec<_> = self
            .device_types
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        entries.truncate(n);
        entries
    }

    /// Hostnames known to the backend, sorted, for device-name completion.
    pub fn hostnames(&self) -> Vec<String> {
        let mut names: Vec<_> = self.by_hostname.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_device_types_sorts_desc_with_stable_name_ties() {
        let mut stats = StatsSummary::default();
        stats.device_types.insert("ubiquiti".to_string(), 4);
        stats.device_types.insert("meraki".to_string(), 9);
        stats.device_types.insert("generic".to_string(), 4);

        let top = stats.top_device_types(10);
        assert_eq!(
            top,
            vec![
                ("meraki".to_string(), 9),
                ("generic".to_string(), 4),
                ("ubiquiti".to_string(), 4),
            ]
        );
        assert_eq!(stats.top_device_types(1).len(), 1);
    }
}
