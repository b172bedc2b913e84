//! Main TUI application

use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    text::{Line, Span},
    widgets::Paragraph,
    Frame, Terminal,
};
use tokio::sync::{broadcast, mpsc};

use crate::app::events::{AppEvent, EventHandler};
use crate::app::state::{AppMessage, AppState, UiUpdateSignal};
use crate::config::Settings;
use crate::models::View;
use crate::ui::dialogs::confirm::ConfirmDialog;
use crate::ui::dialogs::input::InputDialog;
use crate::ui::layout::AppLayout;
use crate::ui::screens::builder::{BuilderAction, BuilderScreen};
use crate::ui::screens::display::{DisplayAction, DisplayScreen};
use crate::ui::screens::views::{ViewsAction, ViewsScreen};
use crate::ui::theme::Theme;
use crate::ui::widgets::statusbar::{build_status_line, StatusItem};

/// Active screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Views,
    Display,
    Builder,
}

/// What an open confirm dialog will do on "yes".
enum PendingConfirm {
    DeleteView(String),
}

/// What an open input dialog's text is for.
enum PendingInput {
    ExportPath(String),
    ImportPath,
}

/// Main TUI application
pub struct TuiApp {
    state: Arc<AppState>,
    state_tx: mpsc::Sender<AppMessage>,
    terminal: Terminal<CrosstermBackend<Stdout>>,
    event_handler: EventHandler,
    ui_update_rx: broadcast::Receiver<UiUpdateSignal>,

    // UI state
    theme: Theme,
    screen: Screen,
    shared_mode: bool,
    builder_return: Screen,
    confirm: Option<(ConfirmDialog, PendingConfirm)>,
    input: Option<(InputDialog, PendingInput)>,
    should_quit: bool,

    // Screens
    views_screen: ViewsScreen,
    display_screen: DisplayScreen,
    builder: BuilderScreen,
}

impl TuiApp {
    pub fn new(
        state: Arc<AppState>,
        state_tx: mpsc::Sender<AppMessage>,
        settings: Settings,
        shared_mode: bool,
    ) -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        let ui_update_rx = state.ui_update_tx.subscribe();
        let debounce = Duration::from_millis(settings.search_debounce_ms);

        Ok(Self {
            state,
            state_tx,
            terminal,
            event_handler: EventHandler::new(Duration::from_millis(100)),
            ui_update_rx,

            theme: Theme::by_name(&settings.theme),
            screen: if shared_mode {
                Screen::Display
            } else {
                Screen::Views
            },
            shared_mode,
            builder_return: Screen::Views,
            confirm: None,
            input: None,
            should_quit: false,

            views_screen: ViewsScreen::new(),
            display_screen: DisplayScreen::new(),
            builder: BuilderScreen::new(debounce),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        while !self.should_quit {
            // Drain UI signals; every signal just forces the next redraw.
            while self.ui_update_rx.try_recv().is_ok() {}

            // Update screen caches before drawing
            self.views_screen.update_cache(&self.state).await;
            self.display_screen.update_cache(&self.state).await;
            self.builder.update_cache(&self.state).await;

            self.draw().await?;

            match self.event_handler.next() {
                Some(AppEvent::Key(key)) => self.handle_key(key).await?,
                Some(AppEvent::Tick) => self.handle_tick().await?,
                Some(AppEvent::Resize(_, _)) | None => {}
            }
        }

        self.restore_terminal()?;
        Ok(())
    }

    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    async fn draw(&mut self) -> Result<()> {
        let status = self.state.status.read().await.clone();

        let theme = self.theme.clone();
        let screen = self.screen;
        let header = match screen {
            Screen::Views => "logdash: Views".to_string(),
            Screen::Display => format!("logdash: {}", self.display_screen.view_title()),
            Screen::Builder => format!("logdash: {}", self.builder.view_title()),
        };
        let hints = match screen {
            Screen::Views => self.views_screen.hints(),
            Screen::Display => self.display_screen.hints(),
            Screen::Builder => self.builder.hints(),
        };

        let views_screen = &self.views_screen;
        let display_screen = &self.display_screen;
        let builder = &self.builder;
        let confirm = &self.confirm;
        let input = &self.input;

        self.terminal.draw(|frame| {
            let layout = AppLayout::new(frame.area());

            let header_line = Line::from(Span::styled(header.clone(), theme.highlight()));
            frame.render_widget(Paragraph::new(header_line), layout.header);

            match screen {
                Screen::Views => views_screen.render(frame, layout.content, &theme),
                Screen::Display => display_screen.render(frame, layout.content, &theme),
                Screen::Builder => builder.render(frame, layout.content, &theme),
            }

            render_status(frame, layout.status, &theme, &status, hints);

            if let Some((dialog, _)) = confirm {
                dialog.render(frame, &theme);
            }
            if let Some((dialog, _)) = input {
                dialog.render(frame, &theme);
            }
        })?;
        Ok(())
    }

    async fn handle_tick(&mut self) -> Result<()> {
        if self.screen == Screen::Builder {
            if let BuilderAction::Preview(widget) = self.builder.on_tick() {
                self.send(AppMessage::RefreshWidgets {
                    widgets: vec![widget],
                })
                .await;
            }
        }
        Ok(())
    }

    async fn send(&self, msg: AppMessage) {
        if let Err(e) = self.state_tx.send(msg).await {
            tracing::error!("state channel closed: {}", e);
        }
    }

    async fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Result<()> {
        // Ctrl-C always quits.
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            self.should_quit = true;
            return Ok(());
        }

        // Dialogs swallow input while open.
        if let Some((dialog, _)) = self.confirm.as_mut() {
            if dialog.handle_key(key) {
                if let Some((dialog, pending)) = self.confirm.take() {
                    if dialog.result == Some(true) {
                        match pending {
                            PendingConfirm::DeleteView(id) => {
                                self.send(AppMessage::DeleteView { id }).await;
                            }
                        }
                    }
                }
            }
            return Ok(());
        }

        if let Some((dialog, _)) = self.input.as_mut() {
            if dialog.handle_key(key) {
                if let Some((dialog, pending)) = self.input.take() {
                    if let Some(text) = dialog.result.clone().flatten() {
                        match pending {
                            PendingInput::ExportPath(id) => {
                                self.send(AppMessage::ExportView {
                                    id,
                                    path: text.into(),
                                })
                                .await;
                            }
                            PendingInput::ImportPath => {
                                self.send(AppMessage::ImportView { path: text.into() }).await;
                            }
                        }
                    }
                }
            }
            return Ok(());
        }

        match self.screen {
            Screen::Views => self.handle_views_key(key).await,
            Screen::Display => self.handle_display_key(key).await,
            Screen::Builder => self.handle_builder_key(key).await,
        }
        Ok(())
    }

    async fn handle_views_key(&mut self, key: crossterm::event::KeyEvent) {
        if key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return;
        }

        match self.views_screen.handle_key(key, &self.state_tx).await {
            ViewsAction::Open(id) => {
                self.send(AppMessage::OpenView {
                    id,
                    read_only: false,
                })
                .await;
                self.screen = Screen::Display;
            }
            ViewsAction::Edit(view) => {
                self.open_builder(view, Screen::Views).await;
            }
            ViewsAction::NewView => {
                self.open_builder(View::create(), Screen::Views).await;
            }
            ViewsAction::DeleteRequested(view) => {
                let dialog = ConfirmDialog::new(
                    "Delete View",
                    &format!("Delete view \"{}\"? This cannot be undone.", view.name),
                )
                .with_labels("Delete", "Cancel");
                self.confirm = Some((dialog, PendingConfirm::DeleteView(view.id)));
            }
            ViewsAction::ExportRequested(id) => {
                let dialog = InputDialog::new("Export to file", &format!("{}.json", id));
                self.input = Some((dialog, PendingInput::ExportPath(id)));
            }
            ViewsAction::ImportRequested => {
                let dialog = InputDialog::new("Import view document", "");
                self.input = Some((dialog, PendingInput::ImportPath));
            }
            ViewsAction::Share(id) => {
                self.share_view(&id).await;
            }
            ViewsAction::None => {}
        }
    }

    async fn handle_display_key(&mut self, key: crossterm::event::KeyEvent) {
        match self.display_screen.handle_key(key) {
            DisplayAction::Back => {
                if self.shared_mode {
                    self.should_quit = true;
                } else {
                    self.screen = Screen::Views;
                    self.send(AppMessage::LoadViews).await;
                }
            }
            DisplayAction::Edit => {
                if let Some(view) = self.display_screen.current_view() {
                    self.open_builder(view, Screen::Display).await;
                }
            }
            DisplayAction::RefreshAll => {
                if let Some(view) = self.display_screen.current_view() {
                    self.send(AppMessage::RefreshWidgets {
                        widgets: view.widgets,
                    })
                    .await;
                }
            }
            DisplayAction::RunQuery { widget_id, query } => {
                self.send(AppMessage::RunQuery { widget_id, query }).await;
            }
            DisplayAction::Share(id) => {
                self.share_view(&id).await;
            }
            DisplayAction::None => {}
        }
    }

    async fn handle_builder_key(&mut self, key: crossterm::event::KeyEvent) {
        match self.builder.handle_key(key) {
            BuilderAction::Cancel => {
                self.screen = self.builder_return;
                if self.screen == Screen::Views {
                    self.send(AppMessage::LoadViews).await;
                }
            }
            BuilderAction::Save(view) => {
                // Surface validation locally and stay in the builder; only a
                // valid view leaves for the store.
                if let Err(e) = view.validate() {
                    self.state.set_status(e.to_string(), true).await;
                    return;
                }
                self.send(AppMessage::SaveView { view }).await;
                self.screen = self.builder_return;
            }
            BuilderAction::Preview(widget) => {
                self.send(AppMessage::RefreshWidgets {
                    widgets: vec![widget],
                })
                .await;
            }
            BuilderAction::FormOpened => {
                self.send(AppMessage::RefreshSuggestions).await;
            }
            BuilderAction::None => {}
        }
    }

    async fn open_builder(&mut self, view: View, return_to: Screen) {
        let widgets = view.widgets.clone();
        self.builder.open(view);
        self.builder_return = return_to;
        self.screen = Screen::Builder;
        self.send(AppMessage::RefreshSuggestions).await;
        if !widgets.is_empty() {
            self.send(AppMessage::RefreshWidgets { widgets }).await;
        }
    }

    /// Shared access is the view id itself; the backend enforces read-only
    /// verbs for share-mode requests.
    async fn share_view(&mut self, id: &str) {
        let url = format!("{}/shared?share={}", self.state.api.base_url(), id);
        self.state
            .set_status(format!("Share link (read-only): {}", url), false)
            .await;
    }
}

fn render_status(
    frame: &mut Frame,
    area: ratatui::layout::Rect,
    theme: &Theme,
    status: &Option<crate::app::state::StatusLine>,
    hints: &str,
) {
    let mut items = Vec::new();
    if let Some(status) = status {
        let style = if status.is_error {
            theme.error()
        } else {
            theme.success()
        };
        items.push(StatusItem::new("", &status.message).with_style(style));
    }
    items.push(StatusItem::new("", hints).with_style(theme.dim()));

    let line = build_status_line(items, "|");
    frame.render_widget(Paragraph::new(line), area);
}
