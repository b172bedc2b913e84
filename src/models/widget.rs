use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::filter::{FilterSpec, RelativeRange};

/// Widget discriminant. The wire value is the kebab-case tag used by the
/// backend's view documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    StatCard,
    ChartSeverity,
    ChartProtocol,
    ChartEventType,
    EventTimeline,
    DeviceStats,
    QueryBuilder,
    DataTable,
    TopN,
}

impl WidgetKind {
    /// Default widget title, used when no custom name is configured.
    pub fn title(&self) -> &'static str {
        match self {
            Self::StatCard => "Stat Card",
            Self::ChartSeverity => "Severity Chart",
            Self::ChartProtocol => "Protocol Chart",
            Self::ChartEventType => "Event Type Chart",
            Self::EventTimeline => "Event Timeline",
            Self::DeviceStats => "Device Stats",
            Self::QueryBuilder => "Query Builder",
            Self::DataTable => "Data Table",
            Self::TopN => "Top N List",
        }
    }

    /// Every kind, in palette order.
    pub fn all() -> &'static [WidgetKind] {
        &[
            Self::StatCard,
            Self::ChartSeverity,
            Self::ChartProtocol,
            Self::ChartEventType,
            Self::EventTimeline,
            Self::DeviceStats,
            Self::QueryBuilder,
            Self::DataTable,
            Self::TopN,
        ]
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title())
    }
}

/// Scalar aggregate backing a stat card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    Total,
    Recent,
    Errors,
    Hosts,
    Devices,
}

impl Default for StatField {
    fn default() -> Self {
        Self::Total
    }
}

impl StatField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Total => "Total Count",
            Self::Recent => "Recent (Last Hour)",
            Self::Errors => "Error Count",
            Self::Hosts => "Unique Hosts",
            Self::Devices => "Unique Devices",
        }
    }

    pub fn all() -> &'static [StatField] {
        &[Self::Total, Self::Recent, Self::Errors, Self::Hosts, Self::Devices]
    }
}

/// Chart rendering style. In the terminal all three draw as a bar list; the
/// value is preserved so exported views render natively elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Pie,
    Doughnut,
    Bar,
}

impl Default for ChartType {
    fn default() -> Self {
        Self::Pie
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatCardConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub field: StatField,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "chartType")]
    pub chart_type: ChartType,
    /// Grouping override; each chart kind has a natural default.
    #[serde(rename = "groupBy", skip_serializing_if = "Option::is_none")]
    pub group_by: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopNConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub field: String,
    pub limit: usize,
    #[serde(rename = "timeRange", skip_serializing_if = "Option::is_none")]
    pub time_range: Option<RelativeRange>,
}

impl Default for TopNConfig {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            name: None,
            field: "event_type".to_string(),
            limit: 10,
            time_range: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataTableConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Comma-separated column list, resolved per record at render time.
    pub columns: String,
    pub limit: usize,
}

impl Default for DataTableConfig {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            name: None,
            columns: "timestamp,severity,message".to_string(),
            limit: 20,
        }
    }
}

impl DataTableConfig {
    pub fn column_list(&self) -> Vec<String> {
        self.columns
            .split(',')
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryBuilderConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub query: String,
    pub query_limit: usize,
    pub query_timeout: u64,
}

impl Default for QueryBuilderConfig {
    fn default() -> Self {
        Self {
            filters: FilterSpec::default(),
            name: None,
            query: String::new(),
            query_limit: 100,
            query_timeout: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceStatsConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventTimelineConfig {
    pub filters: FilterSpec,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "timeRange", skip_serializing_if = "Option::is_none")]
    pub time_range: Option<RelativeRange>,
}

/// Kind tag plus its configuration payload. Serializes as the sibling
/// `"type"` / `"config"` pair of the wire widget shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "kebab-case")]
pub enum WidgetBody {
    StatCard(StatCardConfig),
    ChartSeverity(ChartConfig),
    ChartProtocol(ChartConfig),
    ChartEventType(ChartConfig),
    EventTimeline(EventTimelineConfig),
    DeviceStats(DeviceStatsConfig),
    QueryBuilder(QueryBuilderConfig),
    DataTable(DataTableConfig),
    TopN(TopNConfig),
}

impl WidgetBody {
    pub fn kind(&self) -> WidgetKind {
        match self {
            Self::StatCard(_) => WidgetKind::StatCard,
            Self::ChartSeverity(_) => WidgetKind::ChartSeverity,
            Self::ChartProtocol(_) => WidgetKind::ChartProtocol,
            Self::ChartEventType(_) => WidgetKind::ChartEventType,
            Self::EventTimeline(_) => WidgetKind::EventTimeline,
            Self::DeviceStats(_) => WidgetKind::DeviceStats,
            Self::QueryBuilder(_) => WidgetKind::QueryBuilder,
            Self::DataTable(_) => WidgetKind::DataTable,
            Self::TopN(_) => WidgetKind::TopN,
        }
    }

    /// Default (empty) payload for a kind.
    pub fn empty(kind: WidgetKind) -> Self {
        match kind {
            WidgetKind::StatCard => Self::StatCard(StatCardConfig::default()),
            WidgetKind::ChartSeverity => Self::ChartSeverity(ChartConfig::default()),
            WidgetKind::ChartProtocol => Self::ChartProtocol(ChartConfig::default()),
            WidgetKind::ChartEventType => Self::ChartEventType(ChartConfig::default()),
            WidgetKind::EventTimeline => Self::EventTimeline(EventTimelineConfig::default()),
            WidgetKind::DeviceStats => Self::DeviceStats(DeviceStatsConfig::default()),
            WidgetKind::QueryBuilder => Self::QueryBuilder(QueryBuilderConfig::default()),
            WidgetKind::DataTable => Self::DataTable(DataTableConfig::default()),
            WidgetKind::TopN => Self::TopN(TopNConfig::default()),
        }
    }

    pub fn filters(&self) -> &FilterSpec {
        match self {
            Self::StatCard(c) => &c.filters,
            Self::ChartSeverity(c) | Self::ChartProtocol(c) | Self::ChartEventType(c) => &c.filters,
            Self::EventTimeline(c) => &c.filters,
            Self::DeviceStats(c) => &c.filters,
            Self::QueryBuilder(c) => &c.filters,
            Self::DataTable(c) => &c.filters,
            Self::TopN(c) => &c.filters,
        }
    }

    pub fn custom_name(&self) -> Option<&str> {
        let name = match self {
            Self::StatCard(c) => &c.name,
            Self::ChartSeverity(c) | Self::ChartProtocol(c) | Self::ChartEventType(c) => &c.name,
            Self::EventTimeline(c) => &c.name,
            Self::DeviceStats(c) => &c.name,
            Self::QueryBuilder(c) => &c.name,
            Self::DataTable(c) => &c.name,
            Self::TopN(c) => &c.name,
        };
        name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

fn default_span() -> u16 {
    1
}

/// One configured widget within a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub id: String,
    #[serde(flatten)]
    pub body: WidgetBody,
    #[serde(default = "default_span")]
    pub width: u16,
    #[serde(default = "default_span")]
    pub height: u16,
}

/// Grid column limit; widths clamp into 1..=MAX_WIDTH.
pub const MAX_WIDTH: u16 = 12;

impl Widget {
    /// A fresh widget of the given kind: new opaque id, empty config,
    /// minimal span.
    pub fn new(kind: WidgetKind) -> Self {
        Self {
            id: format!("widget_{}", Uuid::new_v4().simple()),
            body: WidgetBody::empty(kind),
            width: 1,
            height: 1,
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.body.kind()
    }

    /// Display title: the configured name when present, else the kind title.
    pub fn title(&self) -> String {
        self.body
            .custom_name()
            .map(str::to_string)
            .unwrap_or_else(|| self.kind().title().to_string())
    }

    /// Replace the configuration wholesale. The payload must carry the same
    /// kind; a mismatched payload is ignored and reported.
    pub fn reconfigure(&mut self, body: WidgetBody) -> bool {
        if body.kind() != self.kind() {
            return false;
        }
        self.body = body;
        true
    }

    pub fn resize(&mut self, dw: i16, dh: i16) {
        self.width = (self.width as i16 + dw).clamp(1, MAX_WIDTH as i16) as u16;
        self.height = (self.height as i16 + dh).max(1) as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_type_and_config_siblings() {
        let widget = Widget::new(WidgetKind::TopN);
        let json = serde_json::to_value(&widget).unwrap();
        assert_eq!(json["type"], "top-n");
        assert_eq!(json["config"]["field"], "event_type");
        assert_eq!(json["config"]["limit"], 10);
        assert_eq!(json["width"], 1);
        assert!(json["id"].as_str().unwrap().starts_with("widget_"));
    }

    #[test]
    fn deserializes_a_backend_document_widget() {
        let json = r#"{
            "id": "widget_1700000000_abc",
            "type": "data-table",
            "config": {
                "filters": {"severity": "3", "timeRange": "24h"},
                "columns": "timestamp,severity,message,src",
                "limit": 50
            },
            "width": 4,
            "height": 2
        }"#;
        let widget: Widget = serde_json::from_str(json).unwrap();
        assert_eq!(widget.kind(), WidgetKind::DataTable);
        match &widget.body {
            WidgetBody::DataTable(c) => {
                assert_eq!(c.filters.severity, "3");
                assert_eq!(c.column_list(), vec!["timestamp", "severity", "message", "src"]);
                assert_eq!(c.limit, 50);
            }
            other => panic!("wrong body: {:?}", other),
        }
    }

    #[test]
    fn empty_config_object_is_accepted() {
        let json = r#"{"id": "w", "type": "stat-card", "config": {}}"#;
        let widget: Widget = serde_json::from_str(json).unwrap();
        assert_eq!(widget.kind(), WidgetKind::StatCard);
        assert_eq!(widget.width, 1);
        assert_eq!(widget.height, 1);
    }

    #[test]
    fn fresh_widgets_get_unique_ids() {
        let a = Widget::new(WidgetKind::StatCard);
        let b = Widget::new(WidgetKind::StatCard);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn reconfigure_replaces_wholesale_and_checks_kind() {
        let mut widget = Widget::new(WidgetKind::StatCard);
        let mut config = StatCardConfig::default();
        config.field = StatField::Errors;
        assert!(widget.reconfigure(WidgetBody::StatCard(config)));
        match &widget.body {
            WidgetBody::StatCard(c) => assert_eq!(c.field, StatField::Errors),
            _ => unreachable!(),
        }
        assert!(!widget.reconfigure(WidgetBody::TopN(TopNConfig::default())));
    }

    #[test]
    fn resize_clamps_to_grid() {
        let mut widget = Widget::new(WidgetKind::DataTable);
        widget.resize(100, 0);
        assert_eq!(widget.width, MAX_WIDTH);
        widget.resize(-100, -5);
        assert_eq!(widget.width, 1);
        assert_eq!(widget.height, 1);
    }

    #[test]
    fn custom_name_overrides_kind_title() {
        let mut widget = Widget::new(WidgetKind::ChartSeverity);
        assert_eq!(widget.title(), "Severity Chart");
        let mut config = ChartConfig::default();
        config.name = Some("  Firewall severity  ".to_string());
        widget.reconfigure(WidgetBody::ChartSeverity(config));
        assert_eq!(widget.title(), "Firewall severity");
    }
}
