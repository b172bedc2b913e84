//! Query panel editor with context-aware completion.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::query::{suggest, apply_suggestion, Suggestion};
use crate::ui::theme::Theme;

/// What the editor wants the caller to do after a key.
pub enum EditorAction {
    None,
    /// Run the current text against the backend.
    Execute(String),
    /// Editing finished (Esc with no completion popup open).
    Closed,
}

/// Editing state for one query panel.
pub struct QueryEditor {
    pub text: String,
    pub cursor: usize,
    suggestions: Vec<Suggestion>,
    suggestion_idx: usize,
    suggesting: bool,
}

impl QueryEditor {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.len(),
            suggestions: Vec::new(),
            suggestion_idx: 0,
            suggesting: false,
        }
    }

    fn refresh_suggestions(&mut self) {
        self.suggestions = suggest(&self.text, self.cursor);
        self.suggestion_idx = 0;
        self.suggesting = !self.suggestions.is_empty();
    }

    fn accept_suggestion(&mut self) {
        if let Some(s) = self.suggestions.get(self.suggestion_idx) {
            let (text, cursor) = apply_suggestion(&self.text, self.cursor, &s.text);
            self.text = text;
            self.cursor = cursor;
        }
        self.suggesting = false;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorAction {
        // Completion popup owns navigation keys while open.
        if self.suggesting {
            match key.code {
                KeyCode::Down => {
                    self.suggestion_idx = (self.suggestion_idx + 1) % self.suggestions.len();
                    return EditorAction::None;
                }
                KeyCode::Up => {
                    self.suggestion_idx =
                        (self.suggestion_idx + self.suggestions.len() - 1) % self.suggestions.len();
                    return EditorAction::None;
                }
                KeyCode::Enter | KeyCode::Tab => {
                    self.accept_suggestion();
                    return EditorAction::None;
                }
                KeyCode::Esc => {
                    self.suggesting = false;
                    return EditorAction::None;
                }
                _ => self.suggesting = false,
            }
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char(' '), KeyModifiers::CONTROL) => {
                self.refresh_suggestions();
            }
            (KeyCode::Char('x'), KeyModifiers::CONTROL) | (KeyCode::Enter, KeyModifiers::CONTROL) => {
                if !self.text.trim().is_empty() {
                    return EditorAction::Execute(self.text.clone());
                }
            }
            (KeyCode::Char(c), KeyModifiers::NONE) | (KeyCode::Char(c), KeyModifiers::SHIFT) => {
                self.text.insert(self.cursor, c);
                self.cursor += c.len_utf8();
            }
            (KeyCode::Backspace, _) => {
                if self.cursor > 0 {
                    let prev = floor_char_boundary(&self.text, self.cursor - 1);
                    self.text.remove(prev);
                    self.cursor = prev;
                }
            }
            (KeyCode::Delete, _) => {
                if self.cursor < self.text.len() {
                    self.text.remove(self.cursor);
                }
            }
            (KeyCode::Left, _) => {
                if self.cursor > 0 {
                    self.cursor = floor_char_boundary(&self.text, self.cursor - 1);
                }
            }
            (KeyCode::Right, _) => {
                if self.cursor < self.text.len() {
                    let mut next = self.cursor + 1;
                    while next < self.text.len() && !self.text.is_char_boundary(next) {
                        next += 1;
                    }
                    self.cursor = next;
                }
            }
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.text.len(),
            (KeyCode::Enter, KeyModifiers::NONE) => {
                self.text.insert(self.cursor, '\n');
                self.cursor += 1;
            }
            (KeyCode::Esc, _) => return EditorAction::Closed,
            _ => {}
        }
        EditorAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_focused())
            .title(" Query (C-space complete, C-x run, Esc done) ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let display = if self.text.is_empty() {
            Paragraph::new("SELECT * FROM logs WHERE ...").style(theme.dim())
        } else {
            Paragraph::new(self.text.as_str()).style(theme.normal())
        };
        frame.render_widget(display.wrap(Wrap { trim: false }), inner);

        // Cursor position within the wrapped text (single-line approximation
        // per visual row).
        let before = &self.text[..self.cursor];
        let row = before.matches('\n').count() as u16;
        let col = before.rsplit('\n').next().unwrap_or("").len() as u16;
        if inner.height > row {
            frame.set_cursor_position((inner.x + col.min(inner.width.saturating_sub(1)), inner.y + row));
        }

        if self.suggesting {
            self.render_suggestions(frame, inner, theme);
        }
    }

    fn render_suggestions(&self, frame: &mut Frame, editor_area: Rect, theme: &Theme) {
        let height = (self.suggestions.len() as u16 + 2).min(10);
        let width = 36.min(editor_area.width);
        let area = Rect::new(
            editor_area.x + 2,
            (editor_area.y + 2).min(editor_area.bottom().saturating_sub(height)),
            width,
            height,
        );

        frame.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border_focused());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let visible = (inner.height as usize).max(1);
        let lines: Vec<Line> = self
            .suggestions
            .iter()
            .enumerate()
            .skip(self.suggestion_idx.saturating_sub(visible.saturating_sub(1)))
            .take(visible)
            .map(|(i, s)| {
                let style = if i == self.suggestion_idx {
                    theme.selected()
                } else {
                    theme.normal()
                };
                Line::from(vec![
                    Span::styled(format!("{:<24}", s.text), style),
                    Span::styled(s.kind.label(), theme.dim()),
                ])
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), inner);
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
