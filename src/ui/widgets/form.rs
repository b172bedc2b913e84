//! Widget configuration form.
//!
//! One form per widget kind: the shared filter section first, then the
//! kind-specific options. Submitting collects every field into a fresh
//! config payload and replaces the widget's config wholesale.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::models::filter::{CustomFieldFilter, FilterOperator, FilterSpec, RelativeRange, TimeRange};
use crate::models::widget::{
    ChartConfig, ChartType, DataTableConfig, DeviceStatsConfig, EventTimelineConfig,
    QueryBuilderConfig, StatCardConfig, StatField, TopNConfig, Widget, WidgetBody, WidgetKind,
};
use crate::models::SEVERITY_NAMES;
use crate::ui::layout::DialogLayout;
use crate::ui::theme::Theme;
use crate::ui::widgets::query_editor::{EditorAction, QueryEditor};

/// Common parsed-field suggestions offered for custom filter keys.
const COMMON_FIELD_KEYS: [&str; 13] = [
    "src", "dst", "protocol", "signature", "priority", "UNIFIhost", "UNIFIcategory",
    "UNIFIsubCategory", "UNIFIclientIp", "UNIFIclientMac", "port", "sport", "dport",
];

const TOP_N_FIELDS: [&str; 13] = [
    "event_type", "device_type", "hostname", "src", "dst", "protocol", "UNIFIhost",
    "UNIFIcategory", "UNIFIsubCategory", "source_ip", "dest_ip", "action", "event_category",
];

const DEVICE_TYPES: [&str; 4] = ["", "generic", "meraki", "ubiquiti"];
const GROUP_BY_FIELDS: [&str; 6] = ["", "severity", "protocol", "event_type", "device_type", "hostname"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldId {
    Name,
    Device,
    DeviceType,
    EventType,
    Severity,
    TimeRange,
    Search,
    CustomKey(usize),
    CustomOp(usize),
    CustomValue(usize),
    Label,
    StatField,
    ChartType,
    GroupBy,
    TopField,
    Limit,
    Columns,
    Query,
}

enum FormItem {
    Text {
        id: FieldId,
        label: &'static str,
        value: String,
    },
    Select {
        id: FieldId,
        label: &'static str,
        options: Vec<String>,
        selected: usize,
    },
}

impl FormItem {
    fn id(&self) -> FieldId {
        match self {
            Self::Text { id, .. } | Self::Select { id, .. } => *id,
        }
    }
}

pub enum FormAction {
    None,
    Apply(WidgetBody),
    Cancel,
}

pub struct ConfigForm {
    pub widget_id: String,
    kind: WidgetKind,
    items: Vec<FormItem>,
    selected: usize,
    query_editor: Option<QueryEditor>,
    device_suggestions: Vec<String>,
    /// Set while the search field has unapplied keystrokes; the builder
    /// turns a settled edit into a debounced preview refresh.
    pub search_dirty_since: Option<Instant>,
}

impl ConfigForm {
    pub fn new(widget: &Widget, device_suggestions: Vec<String>) -> Self {
        let mut form = Self {
            widget_id: widget.id.clone(),
            kind: widget.kind(),
            items: Vec::new(),
            selected: 0,
            query_editor: None,
            device_suggestions,
            search_dirty_since: None,
        };
        form.items = form.build_items(&widget.body);
        form
    }

    fn select_options(options: &[&str], current: &str) -> (Vec<String>, usize) {
        let opts: Vec<String> = options.iter().map(|s| s.to_string()).collect();
        let idx = opts.iter().position(|o| o == current).unwrap_or(0);
        (opts, idx)
    }

    fn filter_items(&self, filters: &FilterSpec) -> Vec<FormItem> {
        let mut items = Vec::new();

        items.push(FormItem::Text {
            id: FieldId::Device,
            label: "Device (hostname/name)",
            value: filters.device.clone(),
        });

        let (options, selected) = Self::select_options(&DEVICE_TYPES, &filters.device_type);
        items.push(FormItem::Select {
            id: FieldId::DeviceType,
            label: "Device type",
            options,
            selected,
        });

        items.push(FormItem::Text {
            id: FieldId::EventType,
            label: "Event type",
            value: filters.event_type.clone(),
        });

        let mut severity_options = vec![String::new()];
        severity_options.extend(
            SEVERITY_NAMES
                .iter()
                .enumerate()
                .map(|(i, name)| format!("{} {}", i, name)),
        );
        let severity_selected = filters
            .severity
            .parse::<usize>()
            .ok()
            .filter(|i| *i < 8)
            .map(|i| i + 1)
            .unwrap_or(0);
        items.push(FormItem::Select {
            id: FieldId::Severity,
            label: "Severity",
            options: severity_options,
            selected: severity_selected,
        });

        let ranges = ["1h", "24h", "7d", "30d"];
        let current = filters
            .relative_range()
            .unwrap_or_default()
            .as_token();
        let (options, selected) = Self::select_options(&ranges, current);
        items.push(FormItem::Select {
            id: FieldId::TimeRange,
            label: "Time range",
            options,
            selected,
        });

        items.push(FormItem::Text {
            id: FieldId::Search,
            label: "Search/keyword",
            value: filters.search.clone(),
        });

        for (i, custom) in filters.custom_fields.iter().enumerate() {
            items.push(FormItem::Text {
                id: FieldId::CustomKey(i),
                label: "  filter field",
                value: custom.key.clone(),
            });
            let ops: Vec<String> = FilterOperator::all().iter().map(|o| o.to_string()).collect();
            let selected = FilterOperator::all()
                .iter()
                .position(|o| *o == custom.operator)
                .unwrap_or(0);
            items.push(FormItem::Select {
                id: FieldId::CustomOp(i),
                label: "  operator",
                options: ops,
                selected,
            });
            items.push(FormItem::Text {
                id: FieldId::CustomValue(i),
                label: "  value",
                value: custom.value.clone(),
            });
        }

        items
    }

    fn build_items(&self, body: &WidgetBody) -> Vec<FormItem> {
        let mut items = Vec::new();

        items.push(FormItem::Text {
            id: FieldId::Name,
            label: "Widget name",
            value: body.custom_name().unwrap_or("").to_string(),
        });

        items.extend(self.filter_items(body.filters()));

        match body {
            WidgetBody::StatCard(config) => {
                items.push(FormItem::Text {
                    id: FieldId::Label,
                    label: "Stat label",
                    value: config.label.clone().unwrap_or_default(),
                });
                let options: Vec<String> = StatField::all().iter().map(|f| f.label().to_string()).collect();
                let selected = StatField::all()
                    .iter()
                    .position(|f| *f == config.field)
                    .unwrap_or(0);
                items.push(FormItem::Select {
                    id: FieldId::StatField,
                    label: "Aggregation",
                    options,
                    selected,
                });
            }
            WidgetBody::ChartSeverity(config)
            | WidgetBody::ChartProtocol(config)
            | WidgetBody::ChartEventType(config) => {
                let charts = ["pie", "doughnut", "bar"];
                let current = match config.chart_type {
                    ChartType::Pie => "pie",
                    ChartType::Doughnut => "doughnut",
                    ChartType::Bar => "bar",
                };
                let (options, selected) = Self::select_options(&charts, current);
                items.push(FormItem::Select {
                    id: FieldId::ChartType,
                    label: "Chart type",
                    options,
                    selected,
                });
                let (options, selected) = Self::select_options(
                    &GROUP_BY_FIELDS,
                    config.group_by.as_deref().unwrap_or(""),
                );
                items.push(FormItem::Select {
                    id: FieldId::GroupBy,
                    label: "Group by",
                    options,
                    selected,
                });
            }
            WidgetBody::TopN(config) => {
                let (options, selected) = Self::select_options(&TOP_N_FIELDS, &config.field);
                items.push(FormItem::Select {
                    id: FieldId::TopField,
                    label: "Field",
                    options,
                    selected,
                });
                items.push(FormItem::Text {
                    id: FieldId::Limit,
                    label: "Limit",
                    value: config.limit.to_string(),
                });
            }
            WidgetBody::DataTable(config) => {
                items.push(FormItem::Text {
                    id: FieldId::Columns,
                    label: "Columns (comma-separated)",
                    value: config.columns.clone(),
                });
                items.push(FormItem::Text {
                    id: FieldId::Limit,
                    label: "Limit",
                    value: config.limit.to_string(),
                });
            }
            WidgetBody::QueryBuilder(config) => {
                items.push(FormItem::Text {
                    id: FieldId::Query,
                    label: "Query (enter to edit)",
                    value: config.query.clone(),
                });
            }
            WidgetBody::DeviceStats(_) | WidgetBody::EventTimeline(_) => {}
        }

        items
    }

    fn text_value(&self, id: FieldId) -> String {
        self.items
            .iter()
            .find_map(|item| match item {
                FormItem::Text { id: i, value, .. } if *i == id => Some(value.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn select_value(&self, id: FieldId) -> String {
        self.items
            .iter()
            .find_map(|item| match item {
                FormItem::Select {
                    id: i,
                    options,
                    selected,
                    ..
                } if *i == id => options.get(*selected).cloned(),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn collect_filters(&self) -> FilterSpec {
        let severity = self
            .select_value(FieldId::Severity)
            .split_whitespace()
            .next()
            .unwrap_or("")
            .to_string();

        let range = match self.select_value(FieldId::TimeRange).as_str() {
            "1h" => RelativeRange::LastHour,
            "7d" => RelativeRange::Last7Days,
            "30d" => RelativeRange::Last30Days,
            _ => RelativeRange::Last24Hours,
        };

        let mut custom_fields = Vec::new();
        let mut i = 0;
        loop {
            let key_exists = self.items.iter().any(|item| item.id() == FieldId::CustomKey(i));
            if !key_exists {
                break;
            }
            let operator = FilterOperator::all()
                .iter()
                .copied()
                .find(|o| o.to_string() == self.select_value(FieldId::CustomOp(i)))
                .unwrap_or_default();
            custom_fields.push(CustomFieldFilter {
                key: self.text_value(FieldId::CustomKey(i)).trim().to_string(),
                operator,
                value: self.text_value(FieldId::CustomValue(i)).trim().to_string(),
            });
            i += 1;
        }

        FilterSpec {
            device: self.text_value(FieldId::Device).trim().to_string(),
            device_type: self.select_value(FieldId::DeviceType),
            event_type: self.text_value(FieldId::EventType).trim().to_string(),
            severity,
            time_range: TimeRange::Relative(range),
            search: self.text_value(FieldId::Search).trim().to_string(),
            custom_fields,
        }
    }

    fn optional(value: String) -> Option<String> {
        let value = value.trim().to_string();
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }

    /// Collect every field into a fresh config payload.
    pub fn collect(&self) -> WidgetBody {
        let filters = self.collect_filters();
        let name = Self::optional(self.text_value(FieldId::Name));

        match self.kind {
            WidgetKind::StatCard => {
                let field = StatField::all()
                    .iter()
                    .copied()
                    .find(|f| f.label() == self.select_value(FieldId::StatField))
                    .unwrap_or_default();
                WidgetBody::StatCard(StatCardConfig {
                    filters,
                    name,
                    label: Self::optional(self.text_value(FieldId::Label)),
                    field,
                })
            }
            WidgetKind::ChartSeverity | WidgetKind::ChartProtocol | WidgetKind::ChartEventType => {
                let chart_type = match self.select_value(FieldId::ChartType).as_str() {
                    "doughnut" => ChartType::Doughnut,
                    "bar" => ChartType::Bar,
                    _ => ChartType::Pie,
                };
                let config = ChartConfig {
                    filters,
                    name,
                    chart_type,
                    group_by: Self::optional(self.select_value(FieldId::GroupBy)),
                };
                match self.kind {
                    WidgetKind::ChartProtocol => WidgetBody::ChartProtocol(config),
                    WidgetKind::ChartEventType => WidgetBody::ChartEventType(config),
                    _ => WidgetBody::ChartSeverity(config),
                }
            }
            WidgetKind::TopN => WidgetBody::TopN(TopNConfig {
                filters,
                name,
                field: self.select_value(FieldId::TopField),
                limit: self.text_value(FieldId::Limit).trim().parse().unwrap_or(10),
                time_range: None,
            }),
            WidgetKind::DataTable => WidgetBody::DataTable(DataTableConfig {
                filters,
                name,
                columns: {
                    let columns = self.text_value(FieldId::Columns).trim().to_string();
                    if columns.is_empty() {
                        DataTableConfig::default().columns
                    } else {
                        columns
                    }
                },
                limit: self.text_value(FieldId::Limit).trim().parse().unwrap_or(20),
            }),
            WidgetKind::QueryBuilder => WidgetBody::QueryBuilder(QueryBuilderConfig {
                filters,
                name,
                query: self.text_value(FieldId::Query),
                ..QueryBuilderConfig::default()
            }),
            WidgetKind::DeviceStats => WidgetBody::DeviceStats(DeviceStatsConfig { filters, name }),
            WidgetKind::EventTimeline => WidgetBody::EventTimeline(EventTimelineConfig {
                filters,
                name,
                time_range: None,
            }),
        }
    }

    fn rebuild_with(&mut self, mutate: impl FnOnce(&mut FilterSpec)) {
        let mut body = self.collect();
        let filters = match &mut body {
            WidgetBody::StatCard(c) => &mut c.filters,
            WidgetBody::ChartSeverity(c)
            | WidgetBody::ChartProtocol(c)
            | WidgetBody::ChartEventType(c) => &mut c.filters,
            WidgetBody::EventTimeline(c) => &mut c.filters,
            WidgetBody::DeviceStats(c) => &mut c.filters,
            WidgetBody::QueryBuilder(c) => &mut c.filters,
            WidgetBody::DataTable(c) => &mut c.filters,
            WidgetBody::TopN(c) => &mut c.filters,
        };
        mutate(filters);
        self.items = self.build_items(&body);
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }

    /// Complete the device field against the cached suggestion list.
    fn complete_device(&mut self) {
        let prefix = self.text_value(FieldId::Device).to_lowercase();
        let completion = self
            .device_suggestions
            .iter()
            .find(|s| s.to_lowercase().starts_with(&prefix) && !prefix.is_empty())
            .cloned();
        if let Some(completion) = completion {
            for item in &mut self.items {
                if let FormItem::Text { id: FieldId::Device, value, .. } = item {
                    *value = completion;
                    break;
                }
            }
        }
    }

    /// Complete a custom filter key against the common parsed-field names.
    fn complete_custom_key(&mut self) {
        let Some(FieldId::CustomKey(row)) = self.items.get(self.selected).map(|i| i.id()) else {
            return;
        };
        let prefix = self.text_value(FieldId::CustomKey(row)).to_lowercase();
        let completion = COMMON_FIELD_KEYS
            .iter()
            .find(|k| k.to_lowercase().starts_with(&prefix) && !prefix.is_empty())
            .map(|k| k.to_string());
        if let Some(completion) = completion {
            for item in &mut self.items {
                if let FormItem::Text { id, value, .. } = item {
                    if *id == FieldId::CustomKey(row) {
                        *value = completion;
                        break;
                    }
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if let Some(editor) = self.query_editor.as_mut() {
            match editor.handle_key(key) {
                EditorAction::Closed | EditorAction::Execute(_) => {
                    let text = editor.text.clone();
                    for item in &mut self.items {
                        if let FormItem::Text { id: FieldId::Query, value, .. } = item {
                            *value = text.clone();
                        }
                    }
                    self.query_editor = None;
                }
                EditorAction::None => {}
            }
            return FormAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return FormAction::Cancel,
            (KeyCode::Char('s'), KeyModifiers::CONTROL) | (KeyCode::F(2), _) => {
                return FormAction::Apply(self.collect())
            }
            (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.rebuild_with(|filters| filters.custom_fields.push(CustomFieldFilter::default()));
            }
            (KeyCode::Char('d'), KeyModifiers::CONTROL) => {
                if let Some(row) = self.selected_custom_row() {
                    self.rebuild_with(|filters| {
                        if row < filters.custom_fields.len() {
                            filters.custom_fields.remove(row);
                        }
                    });
                }
            }
            (KeyCode::Up, _) => {
                self.selected = self.selected.saturating_sub(1);
            }
            (KeyCode::Down, _) => {
                self.selected = (self.selected + 1).min(self.items.len().saturating_sub(1));
            }
            (KeyCode::Tab, KeyModifiers::NONE) => match self.items.get(self.selected).map(|i| i.id()) {
                Some(FieldId::Device) => self.complete_device(),
                Some(FieldId::CustomKey(_)) => self.complete_custom_key(),
                _ => self.selected = (self.selected + 1).min(self.items.len().saturating_sub(1)),
            },
            (KeyCode::Enter, _) => {
                if self.items.get(self.selected).map(|i| i.id()) == Some(FieldId::Query) {
                    self.query_editor = Some(QueryEditor::new(&self.text_value(FieldId::Query)));
                }
            }
            (KeyCode::Left, _) | (KeyCode::Right, _) => {
                let forward = key.code == KeyCode::Right;
                if let Some(FormItem::Select { options, selected, .. }) =
                    self.items.get_mut(self.selected)
                {
                    if forward {
                        *selected = (*selected + 1) % options.len();
                    } else {
                        *selected = (*selected + options.len() - 1) % options.len();
                    }
                }
            }
            (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                let mut is_search = false;
                if let Some(FormItem::Text { id, value, .. }) = self.items.get_mut(self.selected) {
                    value.push(c);
                    is_search = *id == FieldId::Search;
                }
                if is_search {
                    self.search_dirty_since = Some(Instant::now());
                }
            }
            (KeyCode::Backspace, _) => {
                let mut is_search = false;
                if let Some(FormItem::Text { id, value, .. }) = self.items.get_mut(self.selected) {
                    value.pop();
                    is_search = *id == FieldId::Search;
                }
                if is_search {
                    self.search_dirty_since = Some(Instant::now());
                }
            }
            _ => {}
        }
        FormAction::None
    }

    fn selected_custom_row(&self) -> Option<usize> {
        match self.items.get(self.selected)?.id() {
            FieldId::CustomKey(i) | FieldId::CustomOp(i) | FieldId::CustomValue(i) => Some(i),
            _ => None,
        }
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let area = DialogLayout::new(frame.area(), 70, 80).dialog;
        frame.render_widget(Clear, area);

        let title = format!(" Configure {} ", self.kind.title());
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_focused())
            .title(title);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label_width = 26usize;
        let visible = inner.height.saturating_sub(1) as usize;
        let skip = self.selected.saturating_sub(visible.saturating_sub(1));

        let mut lines: Vec<Line> = Vec::new();
        for (i, item) in self.items.iter().enumerate().skip(skip).take(visible) {
            let focused = i == self.selected;
            let marker = if focused { "> " } else { "  " };
            let style = if focused { theme.selected() } else { theme.normal() };
            match item {
                FormItem::Text { label, value, .. } => {
                    let shown = if value.is_empty() && !focused {
                        Span::styled("(unset)".to_string(), theme.dim())
                    } else {
                        Span::styled(value.clone(), style)
                    };
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{}{:<width$}", marker, label, width = label_width),
                            if focused { theme.accent() } else { theme.dim() },
                        ),
                        shown,
                    ]));
                }
                FormItem::Select {
                    label,
                    options,
                    selected,
                    ..
                } => {
                    let value = options
                        .get(*selected)
                        .map(|s| {
                            if s.is_empty() {
                                "(any)".to_string()
                            } else {
                                s.clone()
                            }
                        })
                        .unwrap_or_default();
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("{}{:<width$}", marker, label, width = label_width),
                            if focused { theme.accent() } else { theme.dim() },
                        ),
                        Span::styled(format!("< {} >", value), style),
                    ]));
                }
            }
        }

        lines.push(Line::from(Span::styled(
            "C-s apply | C-a add filter | C-d drop filter | Esc cancel",
            theme.dim().add_modifier(Modifier::ITALIC),
        )));

        frame.render_widget(Paragraph::new(lines), inner);

        if let Some(editor) = &self.query_editor {
            let dialog = DialogLayout::new(frame.area(), 60, 50).dialog;
            frame.render_widget(Clear, dialog);
            editor.render(frame, dialog, theme);
        }

        // Device completion hint
        if self.items.get(self.selected).map(|i| i.id()) == Some(FieldId::Device) {
            let prefix = self.text_value(FieldId::Device).to_lowercase();
            let matches: Vec<&String> = self
                .device_suggestions
                .iter()
                .filter(|s| prefix.is_empty() || s.to_lowercase().starts_with(&prefix))
                .take(6)
                .collect();
            if !matches.is_empty() {
                let height = matches.len() as u16 + 2;
                let hint_area = Rect::new(
                    area.x + 2,
                    area.bottom().saturating_sub(height + 1),
                    area.width.saturating_sub(4).min(40),
                    height,
                );
                frame.render_widget(Clear, hint_area);
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border())
                    .title(" Devices (Tab completes) ");
                let hint_inner = block.inner(hint_area);
                frame.render_widget(block, hint_area);
                let lines: Vec<Line> = matches
                    .into_iter()
                    .map(|m| Line::from(Span::styled(m.clone(), theme.normal())))
                    .collect();
                frame.render_widget(Paragraph::new(lines), hint_inner);
            }
        }

        // Parsed-field key hint for custom filters
        if let Some(FieldId::CustomKey(row)) = self.items.get(self.selected).map(|i| i.id()) {
            let prefix = self.text_value(FieldId::CustomKey(row)).to_lowercase();
            let matches: Vec<&str> = COMMON_FIELD_KEYS
                .iter()
                .copied()
                .filter(|k| prefix.is_empty() || k.to_lowercase().starts_with(&prefix))
                .take(6)
                .collect();
            if !matches.is_empty() {
                let height = matches.len() as u16 + 2;
                let hint_area = Rect::new(
                    area.x + 2,
                    area.bottom().saturating_sub(height + 1),
                    area.width.saturating_sub(4).min(34),
                    height,
                );
                frame.render_widget(Clear, hint_area);
                let block = Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.border())
                    .title(" Fields (Tab completes) ");
                let hint_inner = block.inner(hint_area);
                frame.render_widget(block, hint_area);
                let lines: Vec<Line> = matches
                    .into_iter()
                    .map(|m| Line::from(Span::styled(m.to_string(), theme.normal())))
                    .collect();
                frame.render_widget(Paragraph::new(lines), hint_inner);
            }
        }
    }
}
