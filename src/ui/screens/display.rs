//! View display screen, shared by the editable and read-only paths.

use std::collections::HashMap;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};

use crate::app::state::{AppState, OpenView, WidgetData};
use crate::models::widget::WidgetBody;
use crate::ui::layout::{grid_layout, DialogLayout};
use crate::ui::render::render_widget;
use crate::ui::theme::Theme;
use crate::ui::widgets::query_editor::{EditorAction, QueryEditor};

/// Actions the display screen hands back to the app loop.
pub enum DisplayAction {
    None,
    Back,
    /// Open the builder over the current view (suppressed in read-only mode).
    Edit,
    RefreshAll,
    RunQuery { widget_id: String, query: String },
    Share(String),
}

pub struct DisplayScreen {
    cached: Option<OpenView>,
    data: HashMap<String, WidgetData>,
    focused: usize,
    editor: Option<QueryEditor>,
    scroll: u16,
}

impl DisplayScreen {
    pub fn new() -> Self {
        Self {
            cached: None,
            data: HashMap::new(),
            focused: 0,
            editor: None,
            scroll: 0,
        }
    }

    pub async fn update_cache(&mut self, state: &Arc<AppState>) {
        self.cached = state.open_view.read().await.clone();
        self.data = state.widget_data.read().await.clone();
        let count = self.widget_count();
        if self.focused >= count {
            self.focused = count.saturating_sub(1);
        }
    }

    fn widget_count(&self) -> usize {
        self.cached.as_ref().map(|o| o.view.widgets.len()).unwrap_or(0)
    }

    pub fn read_only(&self) -> bool {
        self.cached.as_ref().map(|o| o.read_only).unwrap_or(false)
    }

    pub fn view_title(&self) -> String {
        match &self.cached {
            Some(open) => {
                let suffix = if open.read_only { " (shared, read-only)" } else { "" };
                format!("{}{}", open.view.name, suffix)
            }
            None => "Loading view...".to_string(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> DisplayAction {
        // The query editor captures input while open.
        if let Some(editor) = self.editor.as_mut() {
            match editor.handle_key(key) {
                EditorAction::Execute(query) => {
                    if let Some(id) = self.focused_widget_id() {
                        return DisplayAction::RunQuery { widget_id: id, query };
                    }
                }
                EditorAction::Closed => self.editor = None,
                EditorAction::None => {}
            }
            return DisplayAction::None;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Right => {
                let count = self.widget_count();
                if count > 0 {
                    self.focused = (self.focused + 1) % count;
                }
            }
            KeyCode::BackTab | KeyCode::Left => {
                let count = self.widget_count();
                if count > 0 {
                    self.focused = (self.focused + count - 1) % count;
                }
            }
            KeyCode::Down => self.scroll = self.scroll.saturating_add(3),
            KeyCode::Up => self.scroll = self.scroll.saturating_sub(3),
            KeyCode::Char('r') => return DisplayAction::RefreshAll,
            KeyCode::Char('e') => {
                if !self.read_only() {
                    return DisplayAction::Edit;
                }
            }
            KeyCode::Char('s') => {
                if let Some(open) = &self.cached {
                    if !open.read_only {
                        return DisplayAction::Share(open.view.id.clone());
                    }
                }
            }
            // Query execution stays available in read-only mode.
            KeyCode::Enter => {
                if let Some(open) = &self.cached {
                    if let Some(widget) = open.view.widgets.get(self.focused) {
                        if let WidgetBody::QueryBuilder(c) = &widget.body {
                            self.editor = Some(QueryEditor::new(&c.query));
                        }
                    }
                }
            }
            KeyCode::Char('x') => {
                if let Some(open) = &self.cached {
                    if let Some(widget) = open.view.widgets.get(self.focused) {
                        if let WidgetBody::QueryBuilder(c) = &widget.body {
                            if !c.query.trim().is_empty() {
                                return DisplayAction::RunQuery {
                                    widget_id: widget.id.clone(),
                                    query: c.query.clone(),
                                };
                            }
                        }
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('q') => return DisplayAction::Back,
            _ => {}
        }
        DisplayAction::None
    }

    pub fn current_view(&self) -> Option<crate::models::View> {
        self.cached.as_ref().map(|o| o.view.clone())
    }

    fn focused_widget_id(&self) -> Option<String> {
        self.cached
            .as_ref()
            .and_then(|o| o.view.widgets.get(self.focused))
            .map(|w| w.id.clone())
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let Some(open) = &self.cached else {
            let msg = Paragraph::new("Loading view...").style(theme.dim());
            frame.render_widget(msg, area);
            return;
        };

        if open.view.widgets.is_empty() {
            let msg = Paragraph::new("This view has no widgets").style(theme.dim());
            frame.render_widget(msg, area);
            return;
        }

        let spans: Vec<(u16, u16)> = open
            .view
            .widgets
            .iter()
            .map(|w| (w.width, w.height))
            .collect();
        let cells = grid_layout(area, &spans);

        for (i, (widget, cell)) in open.view.widgets.iter().zip(cells.iter()).enumerate() {
            // Vertical scroll over the packed grid.
            let cell = Rect {
                y: cell.y.saturating_sub(self.scroll),
                ..*cell
            };
            if cell.y >= area.bottom() || cell.bottom() <= area.y {
                continue;
            }
            let cell = cell.intersection(area);
            if cell.width == 0 || cell.height == 0 {
                continue;
            }
            render_widget(
                frame,
                cell,
                widget,
                self.data.get(&widget.id),
                i == self.focused,
                theme,
            );
        }

        if let Some(editor) = &self.editor {
            let dialog = DialogLayout::new(frame.area(), 70, 50).dialog;
            frame.render_widget(ratatui::widgets::Clear, dialog);
            editor.render(frame, dialog, theme);
        }
    }

    pub fn hints(&self) -> &'static str {
        if self.editor.is_some() {
            "C-space complete | C-x run | Esc close"
        } else if self.read_only() {
            "tab focus | enter query | x run query | r refresh | q back"
        } else {
            "tab focus | enter query | x run query | r refresh | e edit | s share | q back"
        }
    }
}
