//! HTTP adapter for the backend's read and query endpoints.

use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeSet;

use crate::models::filter::{FilterSpec, TimeRange};
use crate::models::{LogRecord, StatsSummary};

use super::error::ApiError;

/// Default page size for widget record fetches.
pub const DEFAULT_FETCH_LIMIT: usize = 1000;

/// Page size used when a chart or ranking needs the full visible window.
pub const WIDE_FETCH_LIMIT: usize = 10000;

/// Query parameters for the paginated log listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogQuery {
    pub limit: usize,
    pub offset: usize,
    pub severity: String,
    pub device: String,
    pub device_type: String,
    pub event_type: String,
    pub date_range: String,
    pub date_from: String,
    pub date_to: String,
    pub search: String,
}

impl LogQuery {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    /// Backend-side portion of a filter spec. Device matching, custom field
    /// filters and the search OR-set are re-applied client-side; passing the
    /// coarse constraints upstream just bounds the page.
    pub fn from_filters(filters: &FilterSpec, limit: usize) -> Self {
        let mut query = Self::new(limit);
        query.severity = filters.severity.clone();
        query.device = filters.device.clone();
        query.device_type = filters.device_type.clone();
        query.event_type = filters.event_type.clone();
        query.search = filters.search.clone();
        match &filters.time_range {
            TimeRange::Relative(range) => query.date_range = range.as_token().to_string(),
            TimeRange::Explicit { from, to } => {
                query.date_from = from.clone();
                query.date_to = to.clone();
            }
        }
        query
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
        ];
        for (key, value) in [
            ("severity", &self.severity),
            ("device", &self.device),
            ("device_type", &self.device_type),
            ("event_type", &self.event_type),
            ("date_range", &self.date_range),
            ("date_from", &self.date_from),
            ("date_to", &self.date_to),
            ("search", &self.search),
        ] {
            if !value.is_empty() {
                params.push((key, value.clone()));
            }
        }
        params
    }
}

/// A fetched value with its fetch time, so staleness is a pure predicate
/// instead of hidden global state.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub data: T,
    pub fetched_at: DateTime<Utc>,
}

impl<T> Cached<T> {
    pub fn new(data: T, now: DateTime<Utc>) -> Self {
        Self {
            data,
            fetched_at: now,
        }
    }

    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.fetched_at >= ttl
    }
}

/// Client for the backend HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let message = resp.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }

    /// Fetch one bounded page of log records. The backend encodes an empty
    /// result as null.
    pub async fn fetch_logs(&self, query: &LogQuery) -> Result<Vec<LogRecord>, ApiError> {
        let resp = self
            .http
            .get(self.url("/api/logs"))
            .query(&query.params())
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let records: Option<Vec<LogRecord>> = resp.json().await?;
        Ok(records.unwrap_or_default())
    }

    /// Fetch the aggregate statistics summary.
    pub async fn fetch_stats(&self) -> Result<StatsSummary, ApiError> {
        let resp = self.http.get(self.url("/api/stats")).send().await?;
        let resp = Self::check(resp).await?;
        Ok(resp.json().await?)
    }

    /// Pass a raw query through to the backend. The response is either a row
    /// list or an `{ "error": ... }` object.
    pub async fn run_query(
        &self,
        query: &str,
    ) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, ApiError> {
        let resp = self
            .http
            .post(self.url("/api/query"))
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await?;
        let resp = Self::check(resp).await?;
        let body: serde_json::Value = resp.json().await?;

        if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
            return Err(ApiError::Query(error.to_string()));
        }
        match body {
            serde_json::Value::Array(rows) => Ok(rows
                .into_iter()
                .filter_map(|row| match row {
                    serde_json::Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect()),
            serde_json::Value::Null => Ok(Vec::new()),
            other => Err(ApiError::Query(format!(
                "unexpected result shape: {}",
                other
            ))),
        }
    }

    /// Device names for the builder's completion list: stats hostnames merged
    /// with the device-name lookup fields of a recent record sample.
    pub async fn fetch_device_suggestions(&self) -> Result<Vec<String>, ApiError> {
        let stats = self.fetch_stats().await?;
        let sample = self.fetch_logs(&LogQuery::new(DEFAULT_FETCH_LIMIT)).await?;

        let mut names: BTreeSet<String> = stats.by_hostname.keys().cloned().collect();
        for record in &sample {
            if !record.hostname.is_empty() {
                names.insert(record.hostname.clone());
            }
            for key in ["UNIFIhost", "host"] {
                if let Some(v) = record.parsed_str(key) {
                    names.insert(v);
                }
            }
        }
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::filter::{CustomFieldFilter, RelativeRange};
    use chrono::TimeZone;

    #[test]
    fn params_skip_unset_fields() {
        let query = LogQuery::new(50);
        let params = query.params();
        assert_eq!(
            params,
            vec![("limit", "50".to_string()), ("offset", "0".to_string())]
        );
    }

    #[test]
    fn from_filters_maps_relative_range_to_token() {
        let filters = FilterSpec {
            severity: "3".to_string(),
            device_type: "ubiquiti".to_string(),
            time_range: TimeRange::Relative(RelativeRange::Last7Days),
            search: "radius".to_string(),
            // Custom fields never travel upstream.
            custom_fields: vec![CustomFieldFilter {
                key: "protocol".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        let query = LogQuery::from_filters(&filters, 100);
        let params = query.params();
        assert!(params.contains(&("severity", "3".to_string())));
        assert!(params.contains(&("device_type", "ubiquiti".to_string())));
        assert!(params.contains(&("date_range", "7d".to_string())));
        assert!(params.contains(&("search", "radius".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "date_from"));
    }

    #[test]
    fn from_filters_maps_explicit_range_to_date_pair() {
        let filters = FilterSpec {
            time_range: TimeRange::Explicit {
                from: "2026-01-01T00:00:00Z".to_string(),
                to: "2026-01-02T00:00:00Z".to_string(),
            },
            ..Default::default()
        };
        let params = LogQuery::from_filters(&filters, 100).params();
        assert!(params.contains(&("date_from", "2026-01-01T00:00:00Z".to_string())));
        assert!(params.contains(&("date_to", "2026-01-02T00:00:00Z".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "date_range"));
    }

    #[test]
    fn cached_staleness_is_a_pure_predicate() {
        let fetched = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let cached = Cached::new(42u64, fetched);
        assert!(!cached.is_stale(fetched + Duration::seconds(30), Duration::seconds(60)));
        assert!(cached.is_stale(fetched + Duration::seconds(60), Duration::seconds(60)));
        assert!(cached.is_stale(fetched + Duration::hours(1), Duration::seconds(60)));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.url("/api/logs"), "http://localhost:8080/api/logs");
    }
}
