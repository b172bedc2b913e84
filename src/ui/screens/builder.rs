//! View builder screen: widget palette, canvas editing, config forms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use crate::app::state::{AppState, WidgetData};
use crate::models::widget::{Widget, WidgetKind};
use crate::models::View;
use crate::ui::layout::{grid_layout, SplitLayout};
use crate::ui::render::render_widget;
use crate::ui::theme::Theme;
use crate::ui::widgets::form::{ConfigForm, FormAction};

/// Actions the builder hands back to the app loop.
pub enum BuilderAction {
    None,
    Cancel,
    Save(View),
    /// Refresh one widget's preview data (configured or drafted).
    Preview(Widget),
    /// A config form was opened; the device suggestion cache should warm up.
    FormOpened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Palette,
    Canvas,
}

pub struct BuilderScreen {
    view: View,
    focus: Focus,
    palette_idx: usize,
    canvas_idx: usize,
    form: Option<ConfigForm>,
    editing_name: bool,
    data: HashMap<String, WidgetData>,
    suggestions: Vec<String>,
    debounce: Duration,
}

impl BuilderScreen {
    pub fn new(debounce: Duration) -> Self {
        Self {
            view: View::create(),
            focus: Focus::Palette,
            palette_idx: 0,
            canvas_idx: 0,
            form: None,
            editing_name: false,
            data: HashMap::new(),
            suggestions: Vec::new(),
            debounce,
        }
    }

    /// Start a builder session over an existing view or a fresh one.
    pub fn open(&mut self, view: View) {
        self.view = view;
        self.focus = if self.view.widgets.is_empty() {
            Focus::Palette
        } else {
            Focus::Canvas
        };
        self.palette_idx = 0;
        self.canvas_idx = 0;
        self.form = None;
        self.editing_name = false;
    }

    pub fn view_title(&self) -> String {
        let name = if self.view.name.is_empty() {
            "(unnamed view)"
        } else {
            &self.view.name
        };
        if self.view.is_persisted() {
            format!("Edit View: {}", name)
        } else {
            format!("Create View: {}", name)
        }
    }

    pub async fn update_cache(&mut self, state: &Arc<AppState>) {
        self.data = state.widget_data.read().await.clone();
        if let Some(fresh) = state.fresh_suggestions().await {
            self.suggestions = fresh;
        }
    }

    /// Debounced search preview: once the form's search field has settled,
    /// refresh the widget's data with the drafted config without applying it.
    pub fn on_tick(&mut self) -> BuilderAction {
        let Some(form) = self.form.as_mut() else {
            return BuilderAction::None;
        };
        let Some(since) = form.search_dirty_since else {
            return BuilderAction::None;
        };
        if since.elapsed() < self.debounce {
            return BuilderAction::None;
        }
        form.search_dirty_since = None;

        let widget_id = form.widget_id.clone();
        let body = form.collect();
        if let Some(index) = self.view.widget_index(&widget_id) {
            let mut draft = self.view.widgets[index].clone();
            if draft.reconfigure(body) {
                return BuilderAction::Preview(draft);
            }
        }
        BuilderAction::None
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> BuilderAction {
        if let Some(form) = self.form.as_mut() {
            match form.handle_key(key) {
                FormAction::Apply(body) => {
                    let widget_id = form.widget_id.clone();
                    self.form = None;
                    if let Some(index) = self.view.widget_index(&widget_id) {
                        let widget = &mut self.view.widgets[index];
                        if widget.reconfigure(body) {
                            return BuilderAction::Preview(widget.clone());
                        }
                    }
                }
                FormAction::Cancel => self.form = None,
                FormAction::None => {}
            }
            return BuilderAction::None;
        }

        if self.editing_name {
            match key.code {
                KeyCode::Enter | KeyCode::Esc => self.editing_name = false,
                KeyCode::Char(c) => self.view.name.push(c),
                KeyCode::Backspace => {
                    self.view.name.pop();
                }
                _ => {}
            }
            return BuilderAction::None;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Esc, _) => return BuilderAction::Cancel,
            (KeyCode::Tab, _) => {
                self.focus = match self.focus {
                    Focus::Palette => Focus::Canvas,
                    Focus::Canvas => Focus::Palette,
                };
            }
            (KeyCode::Char('n'), KeyModifiers::NONE) => self.editing_name = true,
            (KeyCode::Char('s'), _) => return BuilderAction::Save(self.view.clone()),
            _ => match self.focus {
                Focus::Palette => return self.handle_palette_key(key),
                Focus::Canvas => return self.handle_canvas_key(key),
            },
        }
        BuilderAction::None
    }

    fn handle_palette_key(&mut self, key: KeyEvent) -> BuilderAction {
        let kinds = WidgetKind::all();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.palette_idx = self.palette_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.palette_idx = (self.palette_idx + 1).min(kinds.len() - 1);
            }
            KeyCode::Enter | KeyCode::Char('a') => {
                let widget = Widget::new(kinds[self.palette_idx]);
                let preview = widget.clone();
                self.view.widgets.push(widget);
                self.canvas_idx = self.view.widgets.len() - 1;
                self.focus = Focus::Canvas;
                return BuilderAction::Preview(preview);
            }
            _ => {}
        }
        BuilderAction::None
    }

    fn handle_canvas_key(&mut self, key: KeyEvent) -> BuilderAction {
        let count = self.view.widgets.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.canvas_idx = self.canvas_idx.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if count > 0 {
                    self.canvas_idx = (self.canvas_idx + 1).min(count - 1);
                }
            }
            // Reorder within the view; order is render order and persists.
            KeyCode::Char('K') => {
                if self.canvas_idx > 0 {
                    self.view.widgets.swap(self.canvas_idx, self.canvas_idx - 1);
                    self.canvas_idx -= 1;
                }
            }
            KeyCode::Char('J') => {
                if count > 1 && self.canvas_idx < count - 1 {
                    self.view.widgets.swap(self.canvas_idx, self.canvas_idx + 1);
                    self.canvas_idx += 1;
                }
            }
            // Span adjustments, the terminal counterpart of drag-resize.
            KeyCode::Char('H') => {
                if let Some(w) = self.view.widgets.get_mut(self.canvas_idx) {
                    w.resize(-1, 0);
                }
            }
            KeyCode::Char('L') => {
                if let Some(w) = self.view.widgets.get_mut(self.canvas_idx) {
                    w.resize(1, 0);
                }
            }
            KeyCode::Char('-') => {
                if let Some(w) = self.view.widgets.get_mut(self.canvas_idx) {
                    w.resize(0, -1);
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if let Some(w) = self.view.widgets.get_mut(self.canvas_idx) {
                    w.resize(0, 1);
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                if self.canvas_idx < count {
                    self.view.widgets.remove(self.canvas_idx);
                    if self.canvas_idx > 0 {
                        self.canvas_idx -= 1;
                    }
                }
            }
            KeyCode::Char('c') | KeyCode::Enter => {
                if let Some(widget) = self.view.widgets.get(self.canvas_idx) {
                    self.form = Some(ConfigForm::new(widget, self.suggestions.clone()));
                    return BuilderAction::FormOpened;
                }
            }
            KeyCode::Char('r') => {
                if let Some(widget) = self.view.widgets.get(self.canvas_idx) {
                    return BuilderAction::Preview(widget.clone());
                }
            }
            _ => {}
        }
        BuilderAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let split = SplitLayout::new(area, 22);
        self.render_palette(frame, split.left, theme);
        self.render_canvas(frame, split.right, theme);

        if let Some(form) = &self.form {
            form.render(frame, theme);
        }
    }

    fn render_palette(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let focused = self.focus == Focus::Palette && self.form.is_none();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                theme.border_focused()
            } else {
                theme.border()
            })
            .title(" Widgets ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let items: Vec<ListItem> = WidgetKind::all()
            .iter()
            .map(|kind| ListItem::new(kind.title()))
            .collect();
        let mut state = ListState::default();
        if focused {
            state.select(Some(self.palette_idx));
        }
        let list = List::new(items)
            .style(theme.normal())
            .highlight_style(theme.selected());
        frame.render_stateful_widget(list, inner, &mut state);
    }

    fn render_canvas(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let focused = self.focus == Focus::Canvas && self.form.is_none();
        let name_line = if self.editing_name {
            Line::from(vec![
                Span::styled("Name: ", theme.dim()),
                Span::styled(
                    format!("{}_", self.view.name),
                    theme.highlight(),
                ),
            ])
        } else {
            Line::from(vec![
                Span::styled("Name: ", theme.dim()),
                Span::styled(
                    if self.view.name.is_empty() {
                        "(press n to name this view)".to_string()
                    } else {
                        self.view.name.clone()
                    },
                    theme.bright().add_modifier(Modifier::BOLD),
                ),
            ])
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(if focused {
                theme.border_focused()
            } else {
                theme.border()
            })
            .title(" Canvas ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let name_area = Rect::new(inner.x, inner.y, inner.width, 1);
        frame.render_widget(Paragraph::new(name_line), name_area);

        let canvas_area = Rect::new(
            inner.x,
            inner.y + 1,
            inner.width,
            inner.height.saturating_sub(1),
        );

        if self.view.widgets.is_empty() {
            let msg = Paragraph::new("Add widgets from the palette (Tab to switch, Enter to add)")
                .style(theme.dim());
            frame.render_widget(msg, canvas_area);
            return;
        }

        let spans: Vec<(u16, u16)> = self
            .view
            .widgets
            .iter()
            .map(|w| (w.width, w.height))
            .collect();
        let cells = grid_layout(canvas_area, &spans);
        for (i, (widget, cell)) in self.view.widgets.iter().zip(cells.iter()).enumerate() {
            let cell = cell.intersection(canvas_area);
            if cell.height == 0 || cell.width == 0 {
                continue;
            }
            render_widget(
                frame,
                cell,
                widget,
                self.data.get(&widget.id),
                focused && i == self.canvas_idx,
                theme,
            );
        }
    }

    pub fn hints(&self) -> &'static str {
        if self.form.is_some() {
            "up/down field | left/right option | C-a add filter | C-s apply | Esc cancel"
        } else if self.editing_name {
            "type view name | enter done"
        } else if self.focus == Focus::Palette {
            "enter add widget | tab canvas | n name | s save | esc back"
        } else {
            "c configure | d delete | J/K reorder | H/L/+/- resize | n name | s save | esc back"
        }
    }
}
