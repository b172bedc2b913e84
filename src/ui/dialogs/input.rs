//! Single-line input dialog (file paths, names)

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::layout::DialogLayout;
use crate::ui::theme::Theme;

pub struct InputDialog {
    pub title: String,
    pub value: String,
    /// Some(Some(text)) on submit, Some(None) on cancel.
    pub result: Option<Option<String>>,
}

impl InputDialog {
    pub fn new(title: &str, initial: &str) -> Self {
        Self {
            title: title.to_string(),
            value: initial.to_string(),
            result: None,
        }
    }

    /// Returns true when the dialog is finished.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => {
                let value = self.value.trim().to_string();
                self.result = Some(if value.is_empty() { None } else { Some(value) });
                return true;
            }
            KeyCode::Esc => {
                self.result = Some(None);
                return true;
            }
            KeyCode::Char(c) => self.value.push(c),
            KeyCode::Backspace => {
                self.value.pop();
            }
            _ => {}
        }
        false
    }

    pub fn render(&self, frame: &mut Frame, theme: &Theme) {
        let area = frame.area();
        let dialog_area = DialogLayout::centered(area, 60.min(area.width), 5).dialog;

        frame.render_widget(Clear, dialog_area);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .borders(Borders::ALL)
            .border_style(theme.border_focused());
        let inner = block.inner(dialog_area);
        frame.render_widget(block, dialog_area);

        let line = Line::from(vec![
            Span::styled(self.value.clone(), theme.normal()),
            Span::styled("_", theme.highlight()),
        ]);
        frame.render_widget(Paragraph::new(line), inner);
    }
}
