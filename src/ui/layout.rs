//! Screen layout management

use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::widget::MAX_WIDTH;

/// Standard application layout areas
pub struct AppLayout {
    pub header: Rect,
    pub content: Rect,
    pub status: Rect,
}

impl AppLayout {
    /// Create layout from terminal area
    pub fn new(area: Rect) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(10),   // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

        Self {
            header: chunks[0],
            content: chunks[1],
            status: chunks[2],
        }
    }
}

/// Two-panel layout (palette + canvas)
pub struct SplitLayout {
    pub left: Rect,
    pub right: Rect,
}

impl SplitLayout {
    pub fn new(area: Rect, left_percent: u16) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(left_percent),
                Constraint::Percentage(100 - left_percent),
            ])
            .split(area);

        Self {
            left: chunks[0],
            right: chunks[1],
        }
    }
}

/// Dialog/popup centered layout
pub struct DialogLayout {
    pub dialog: Rect,
}

impl DialogLayout {
    pub fn new(area: Rect, width_percent: u16, height_percent: u16) -> Self {
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Percentage((100 - height_percent) / 2),
                Constraint::Percentage(height_percent),
                Constraint::Percentage((100 - height_percent) / 2),
            ])
            .split(area);

        let horizontal = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage((100 - width_percent) / 2),
                Constraint::Percentage(width_percent),
                Constraint::Percentage((100 - width_percent) / 2),
            ])
            .split(vertical[1]);

        Self {
            dialog: horizontal[1],
        }
    }

    /// Create centered dialog with fixed dimensions
    pub fn centered(area: Rect, width: u16, height: u16) -> Self {
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;

        Self {
            dialog: Rect::new(x, y, width.min(area.width), height.min(area.height)),
        }
    }
}

/// Terminal rows per grid-height unit.
const ROW_UNIT: u16 = 9;

/// Pack widget spans into a 12-column grid, top to bottom, preserving the
/// view's widget order. Returns one rect per widget, in the same order.
pub fn grid_layout(area: Rect, spans: &[(u16, u16)]) -> Vec<Rect> {
    let mut rects = Vec::with_capacity(spans.len());
    let col_unit = (area.width / MAX_WIDTH).max(1);

    let mut x = 0u16;
    let mut y = area.y;
    let mut row_height = 0u16;

    for &(width, height) in spans {
        let width = width.clamp(1, MAX_WIDTH);
        // Terminal widgets narrower than a third of the grid are unreadable;
        // give every span at least 4 columns.
        let cols = width.max(4);
        let rows = height.max(1) * ROW_UNIT;

        if x + cols > MAX_WIDTH {
            y += row_height;
            x = 0;
            row_height = 0;
        }

        rects.push(Rect::new(
            area.x + x * col_unit,
            y,
            cols * col_unit,
            rows,
        ));

        x += cols;
        row_height = row_height.max(rows);
    }

    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_wraps_rows_and_preserves_order() {
        let area = Rect::new(0, 0, 120, 60);
        let rects = grid_layout(area, &[(6, 1), (6, 1), (4, 2)]);
        assert_eq!(rects.len(), 3);
        // First two share the top row.
        assert_eq!(rects[0].y, rects[1].y);
        assert!(rects[1].x > rects[0].x);
        // Third wraps below.
        assert!(rects[2].y > rects[0].y);
    }

    #[test]
    fn narrow_spans_are_widened_to_readable_size() {
        let area = Rect::new(0, 0, 120, 60);
        let rects = grid_layout(area, &[(1, 1)]);
        assert!(rects[0].width >= 4 * (120 / MAX_WIDTH));
    }
}
