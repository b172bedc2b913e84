//! View list screen

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tokio::sync::mpsc;

use crate::app::events::{apply_delta, navigation_delta};
use crate::app::state::{AppMessage, AppState};
use crate::models::View;
use crate::ui::theme::Theme;

/// Actions the list screen hands back to the app loop.
pub enum ViewsAction {
    None,
    Open(String),
    Edit(View),
    NewView,
    DeleteRequested(View),
    ExportRequested(String),
    ImportRequested,
    Share(String),
}

pub struct ViewsScreen {
    selected: usize,
    cached_views: Vec<View>,
}

impl ViewsScreen {
    pub fn new() -> Self {
        Self {
            selected: 0,
            cached_views: Vec::new(),
        }
    }

    pub async fn update_cache(&mut self, state: &Arc<AppState>) {
        self.cached_views = state.views.read().await.clone();
        if self.selected >= self.cached_views.len() {
            self.selected = self.cached_views.len().saturating_sub(1);
        }
    }

    fn selected_view(&self) -> Option<&View> {
        self.cached_views.get(self.selected)
    }

    pub async fn handle_key(
        &mut self,
        key: KeyEvent,
        state_tx: &mpsc::Sender<AppMessage>,
    ) -> ViewsAction {
        if let Some(delta) = navigation_delta(&key) {
            self.selected = apply_delta(self.selected, delta, self.cached_views.len());
            return ViewsAction::None;
        }

        match key.code {
            KeyCode::Enter | KeyCode::Char('o') => {
                if let Some(view) = self.selected_view() {
                    return ViewsAction::Open(view.id.clone());
                }
            }
            KeyCode::Char('e') => {
                if let Some(view) = self.selected_view() {
                    return ViewsAction::Edit(view.clone());
                }
            }
            KeyCode::Char('n') => return ViewsAction::NewView,
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(view) = self.selected_view() {
                    return ViewsAction::DeleteRequested(view.clone());
                }
            }
            KeyCode::Char('x') => {
                if let Some(view) = self.selected_view() {
                    return ViewsAction::ExportRequested(view.id.clone());
                }
            }
            KeyCode::Char('i') => return ViewsAction::ImportRequested,
            KeyCode::Char('s') => {
                if let Some(view) = self.selected_view() {
                    return ViewsAction::Share(view.id.clone());
                }
            }
            KeyCode::Char('r') => {
                let _ = state_tx.send(AppMessage::LoadViews).await;
            }
            _ => {}
        }
        ViewsAction::None
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, theme: &Theme) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border())
            .title(" Views ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        if self.cached_views.is_empty() {
            let msg = Paragraph::new("No views yet. Press n to create one, i to import.")
                .style(theme.dim());
            frame.render_widget(msg, inner);
            return;
        }

        let items: Vec<ListItem> = self
            .cached_views
            .iter()
            .map(|view| {
                let description = if view.description.is_empty() {
                    "no description".to_string()
                } else {
                    view.description.clone()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<28}", view.name),
                        theme.bright().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{:>3} widgets  ", view.widgets.len()), theme.accent()),
                    Span::styled(description, theme.dim()),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));

        let list = List::new(items)
            .style(theme.normal())
            .highlight_style(theme.selected());
        frame.render_stateful_widget(list, inner, &mut list_state);
    }

    pub fn hints(&self) -> &'static str {
        "enter open | e edit | n new | d delete | x export | i import | s share | r reload | q quit"
    }
}
