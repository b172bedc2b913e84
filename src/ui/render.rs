//! Per-kind widget renderers for the view canvas.
//!
//! Rendering is a pure function of the widget's configuration and its last
//! computed data snapshot; nothing is cached between frames.

use ratatui::{
    layout::{Constraint, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use crate::app::state::WidgetData;
use crate::models::widget::{StatField, Widget, WidgetBody};
use crate::models::LogRecord;

use super::theme::Theme;

/// Render one widget into its grid cell.
pub fn render_widget(
    frame: &mut Frame,
    area: Rect,
    widget: &Widget,
    data: Option<&WidgetData>,
    focused: bool,
    theme: &Theme,
) {
    let border_style = if focused {
        theme.border_focused()
    } else {
        theme.border()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(format!(" {} ", widget.title()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height == 0 || inner.width == 0 {
        return;
    }

    match data {
        None | Some(WidgetData::Loading) => {
            let msg = Paragraph::new("Loading...").style(theme.dim());
            frame.render_widget(msg, inner);
        }
        Some(WidgetData::Failed(message)) => {
            let msg = Paragraph::new(format!("Error: {}", message))
                .style(theme.error())
                .wrap(ratatui::widgets::Wrap { trim: true });
            frame.render_widget(msg, inner);
        }
        Some(WidgetData::Scalar(value)) => render_stat_card(frame, inner, widget, *value, theme),
        Some(WidgetData::Groups(groups)) => render_bar_list(frame, inner, groups, theme),
        Some(WidgetData::Rows { columns, records }) => {
            render_data_table(frame, inner, columns, records, theme)
        }
        Some(WidgetData::QueryRows { columns, rows }) => {
            render_query_rows(frame, inner, widget, columns, rows, theme)
        }
    }
}

fn stat_label(widget: &Widget) -> String {
    match &widget.body {
        WidgetBody::StatCard(config) => config
            .label
            .clone()
            .unwrap_or_else(|| stat_field_label(config.field).to_string()),
        _ => String::new(),
    }
}

fn stat_field_label(field: StatField) -> &'static str {
    match field {
        StatField::Total => "Total Messages",
        StatField::Recent => "Last Hour",
        StatField::Errors => "Errors",
        StatField::Hosts => "Unique Hosts",
        StatField::Devices => "Unique Devices",
    }
}

fn render_stat_card(frame: &mut Frame, area: Rect, widget: &Widget, value: u64, theme: &Theme) {
    let value_line = Line::from(Span::styled(
        format_count(value),
        theme.accent().add_modifier(Modifier::BOLD),
    ))
    .centered();
    let label_line = Line::from(Span::styled(stat_label(widget), theme.dim())).centered();

    let mid = area.y + area.height / 2;
    let value_area = Rect::new(area.x, mid.saturating_sub(1), area.width, 1);
    frame.render_widget(Paragraph::new(value_line), value_area);
    if mid < area.y + area.height {
        let label_area = Rect::new(area.x, mid, area.width, 1);
        frame.render_widget(Paragraph::new(label_line), label_area);
    }
}

/// Ranked bar list shared by the chart, top-N, device-stats and timeline
/// widgets: rank, label, proportional bar, count.
fn render_bar_list(frame: &mut Frame, area: Rect, groups: &[(String, u64)], theme: &Theme) {
    if groups.is_empty() {
        let msg = Paragraph::new("No data found").style(theme.dim());
        frame.render_widget(msg, area);
        return;
    }

    let max_count = groups.iter().map(|(_, c)| *c).max().unwrap_or(1).max(1);
    let visible = groups.iter().take(area.height as usize);

    let label_width = (area.width as usize / 3).clamp(8, 28);
    let count_width = 7usize;
    let bar_width = (area.width as usize)
        .saturating_sub(label_width + count_width + 2)
        .max(1);

    let mut lines = Vec::new();
    for (label, count) in visible {
        let filled = ((*count as usize * bar_width) / max_count as usize).max(1);
        let mut bar = String::with_capacity(bar_width);
        for i in 0..bar_width {
            bar.push(if i < filled { '█' } else { ' ' });
        }

        let mut label = label.clone();
        if label.len() > label_width {
            label.truncate(label_width.saturating_sub(1));
            label.push('…');
        }

        lines.push(Line::from(vec![
            Span::styled(format!("{:<width$}", label, width = label_width), theme.normal()),
            Span::raw(" "),
            Span::styled(bar, theme.accent()),
            Span::styled(format!(" {:>6}", format_count(*count)), theme.highlight()),
        ]));
    }

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_data_table(
    frame: &mut Frame,
    area: Rect,
    columns: &[String],
    records: &[LogRecord],
    theme: &Theme,
) {
    if records.is_empty() {
        let msg = Paragraph::new("No logs found").style(theme.dim());
        frame.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(theme.dim().add_modifier(Modifier::BOLD))),
    );

    let rows: Vec<Row> = records
        .iter()
        .map(|record| {
            Row::new(columns.iter().map(|col| table_cell(record, col, theme)))
        })
        .collect();

    let widths: Vec<Constraint> = columns
        .iter()
        .map(|c| match c.as_str() {
            "timestamp" => Constraint::Length(19),
            "severity" => Constraint::Length(13),
            "message" | "raw_message" => Constraint::Min(20),
            _ => Constraint::Length(16),
        })
        .collect();

    let table = Table::new(rows, widths)
        .header(header)
        .style(theme.normal());
    frame.render_widget(table, area);
}

fn table_cell<'a>(record: &'a LogRecord, column: &str, theme: &Theme) -> Cell<'a> {
    match column {
        "timestamp" => Cell::from(
            record
                .timestamp
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
        "severity" => Cell::from(record.severity_name())
            .style(ratatui::style::Style::default().fg(theme.severity_color(record.severity))),
        "message" => {
            let text = if record.message.is_empty() {
                &record.raw_message
            } else {
                &record.message
            };
            Cell::from(truncate(text, 100))
        }
        other => Cell::from(
            record
                .resolve_field(other)
                .unwrap_or_else(|| "-".to_string()),
        ),
    }
}

fn render_query_rows(
    frame: &mut Frame,
    area: Rect,
    widget: &Widget,
    columns: &[String],
    rows: &[serde_json::Map<String, serde_json::Value>],
    theme: &Theme,
) {
    if rows.is_empty() {
        let query = match &widget.body {
            WidgetBody::QueryBuilder(config) => config.query.as_str(),
            _ => "",
        };
        let text = if query.trim().is_empty() {
            "No query configured".to_string()
        } else {
            format!("{}\n\n(press x to execute)", query)
        };
        let msg = Paragraph::new(text)
            .style(theme.dim())
            .wrap(ratatui::widgets::Wrap { trim: false });
        frame.render_widget(msg, area);
        return;
    }

    let header = Row::new(
        columns
            .iter()
            .map(|c| Cell::from(c.as_str()).style(theme.dim().add_modifier(Modifier::BOLD))),
    );
    let body: Vec<Row> = rows
        .iter()
        .map(|row| {
            Row::new(columns.iter().map(|col| {
                let value = match row.get(col) {
                    None | Some(serde_json::Value::Null) => "null".to_string(),
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                };
                Cell::from(truncate(&value, 60))
            }))
        })
        .collect();

    let widths: Vec<Constraint> = columns.iter().map(|_| Constraint::Min(10)).collect();
    let table = Table::new(body, widths).header(header).style(theme.normal());
    frame.render_widget(table, area);
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

/// Group thousands for the big stat numbers.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_formatting_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }
}
