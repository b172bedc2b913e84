//! Application state management

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::api::{ApiClient, Cached, ViewStore};
use crate::models::{LogRecord, StatsSummary, View, ViewDocument, Widget};

/// Computed rendering data for one widget.
#[derive(Debug, Clone)]
pub enum WidgetData {
    Loading,
    /// Stat-card scalar.
    Scalar(u64),
    /// Ordered (key, count) pairs: charts, top-N, device stats, timeline.
    Groups(Vec<(String, u64)>),
    /// Data-table rows with their configured column list.
    Rows {
        columns: Vec<String>,
        records: Vec<LogRecord>,
    },
    /// Raw-query result rows.
    QueryRows {
        columns: Vec<String>,
        rows: Vec<serde_json::Map<String, serde_json::Value>>,
    },
    /// Isolated failure, rendered inside the widget's own region.
    Failed(String),
}

/// Messages for state updates
#[derive(Debug)]
pub enum AppMessage {
    // View store round-trips
    LoadViews,
    ViewsLoaded {
        result: Result<Vec<View>, String>,
    },
    OpenView {
        id: String,
        read_only: bool,
    },
    ViewOpened {
        result: Result<View, String>,
        read_only: bool,
    },
    SaveView {
        view: View,
    },
    ViewSaved {
        result: Result<View, String>,
    },
    DeleteView {
        id: String,
    },
    ViewDeleted {
        result: Result<String, String>,
    },
    ExportView {
        id: String,
        path: PathBuf,
    },
    ImportView {
        path: PathBuf,
    },

    // Widget data refresh
    RefreshWidgets {
        widgets: Vec<Widget>,
    },
    WidgetRefreshed {
        widget_id: String,
        generation: u64,
        data: WidgetData,
    },
    RunQuery {
        widget_id: String,
        query: String,
    },

    // Adapter caches
    RefreshSuggestions,
    SuggestionsLoaded {
        names: Vec<String>,
    },
    StatsLoaded {
        stats: StatsSummary,
    },

    // Operator feedback
    Status {
        message: String,
        is_error: bool,
    },
}

/// UI update signals
#[derive(Debug, Clone)]
pub enum UiUpdateSignal {
    ViewsUpdated,
    ViewOpened,
    WidgetDataUpdated,
    SuggestionsUpdated,
    StatusChanged,
    Redraw,
}

/// A view currently open on the display or builder screen.
#[derive(Debug, Clone)]
pub struct OpenView {
    pub view: View,
    pub read_only: bool,
}

/// One-line operator feedback shown in the status bar.
#[derive(Debug, Clone)]
pub struct StatusLine {
    pub message: String,
    pub is_error: bool,
}

/// Staleness window for the adapter caches.
pub const CACHE_TTL_SECS: i64 = 60;

/// Central application state
pub struct AppState {
    pub api: ApiClient,
    pub store: ViewStore,

    pub views: RwLock<Vec<View>>,
    pub open_view: RwLock<Option<OpenView>>,
    pub widget_data: RwLock<HashMap<String, WidgetData>>,
    pub status: RwLock<Option<StatusLine>>,

    // Adapter caches with explicit staleness
    pub stats_cache: RwLock<Option<Cached<StatsSummary>>>,
    pub suggestions_cache: RwLock<Option<Cached<Vec<String>>>>,

    // Latest refresh generation per widget id; responses from superseded
    // generations are dropped on arrival.
    generations: RwLock<HashMap<String, u64>>,

    pub ui_update_tx: broadcast::Sender<UiUpdateSignal>,
}

impl AppState {
    pub fn new(api: ApiClient, ui_update_tx: broadcast::Sender<UiUpdateSignal>) -> Self {
        let store = ViewStore::new(api.clone());
        Self {
            api,
            store,
            views: RwLock::new(Vec::new()),
            open_view: RwLock::new(None),
            widget_data: RwLock::new(HashMap::new()),
            status: RwLock::new(None),
            stats_cache: RwLock::new(None),
            suggestions_cache: RwLock::new(None),
            generations: RwLock::new(HashMap::new()),
            ui_update_tx,
        }
    }

    pub fn notify_ui(&self, signal: UiUpdateSignal) {
        let _ = self.ui_update_tx.send(signal);
    }

    /// Bump and return the refresh generation for a widget. Only a response
    /// carrying the current generation may land.
    pub async fn next_generation(&self, widget_id: &str) -> u64 {
        let mut generations = self.generations.write().await;
        let entry = generations.entry(widget_id.to_string()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub async fn is_current_generation(&self, widget_id: &str, generation: u64) -> bool {
        let generations = self.generations.read().await;
        generations.get(widget_id).copied() == Some(generation)
    }

    pub async fn set_status(&self, message: impl Into<String>, is_error: bool) {
        {
            let mut status = self.status.write().await;
            *status = Some(StatusLine {
                message: message.into(),
                is_error,
            });
        }
        self.notify_ui(UiUpdateSignal::StatusChanged);
    }

    /// Cached device-name suggestions, if still fresh.
    pub async fn fresh_suggestions(&self) -> Option<Vec<String>> {
        let cache = self.suggestions_cache.read().await;
        cache
            .as_ref()
            .filter(|c| !c.is_stale(Utc::now(), Duration::seconds(CACHE_TTL_SECS)))
            .map(|c| c.data.clone())
    }
}

/// Run the state manager task
pub async fn run_state_manager(
    state: Arc<AppState>,
    mut rx: mpsc::Receiver<AppMessage>,
    tx: mpsc::Sender<AppMessage>,
) {
    tracing::info!("state manager started");

    while let Some(msg) = rx.recv().await {
        match msg {
            AppMessage::LoadViews => {
                let store = state.store.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = store.list().await.map_err(|e| e.to_string());
                    let _ = tx.send(AppMessage::ViewsLoaded { result }).await;
                });
            }

            AppMessage::ViewsLoaded { result } => match result {
                Ok(views) => {
                    tracing::debug!("loaded {} views", views.len());
                    *state.views.write().await = views;
                    state.notify_ui(UiUpdateSignal::ViewsUpdated);
                }
                Err(e) => {
                    tracing::error!("failed to load views: {}", e);
                    state
                        .set_status(format!("Error loading views: {}", e), true)
                        .await;
                }
            },

            AppMessage::OpenView { id, read_only } => {
                let store = state.store.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = store.get(&id).await.map_err(|e| e.to_string());
                    let _ = tx.send(AppMessage::ViewOpened { result, read_only }).await;
                });
            }

            AppMessage::ViewOpened { result, read_only } => match result {
                Ok(view) => {
                    tracing::info!("opened view {} ({})", view.name, view.id);
                    let widgets = view.widgets.clone();
                    {
                        let mut open = state.open_view.write().await;
                        *open = Some(OpenView { view, read_only });
                    }
                    state.notify_ui(UiUpdateSignal::ViewOpened);
                    let _ = tx.send(AppMessage::RefreshWidgets { widgets }).await;
                }
                Err(e) => {
                    state
                        .set_status(format!("Error loading view: {}", e), true)
                        .await;
                }
            },

            AppMessage::SaveView { view } => {
                // Validation failures surface here, before any network call.
                if let Err(e) = view.validate() {
                    state.set_status(e.to_string(), true).await;
                    continue;
                }
                let store = state.store.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let mut view = view;
                    let result = match store.save(&mut view).await {
                        Ok(()) => Ok(view),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(AppMessage::ViewSaved { result }).await;
                });
            }

            AppMessage::ViewSaved { result } => match result {
                Ok(view) => {
                    state
                        .set_status(format!("Saved view \"{}\"", view.name), false)
                        .await;
                    {
                        let mut open = state.open_view.write().await;
                        if let Some(open) = open.as_mut() {
                            if open.view.id.is_empty() || open.view.id == view.id {
                                open.view = view;
                            }
                        }
                    }
                    let _ = tx.send(AppMessage::LoadViews).await;
                }
                Err(e) => {
                    state
                        .set_status(format!("Error saving view: {}", e), true)
                        .await;
                }
            },

            AppMessage::DeleteView { id } => {
                let store = state.store.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = match store.delete(&id).await {
                        Ok(()) => Ok(id),
                        Err(e) => Err(e.to_string()),
                    };
                    let _ = tx.send(AppMessage::ViewDeleted { result }).await;
                });
            }

            AppMessage::ViewDeleted { result } => match result {
                Ok(id) => {
                    state.views.write().await.retain(|v| v.id != id);
                    state.notify_ui(UiUpdateSignal::ViewsUpdated);
                    state.set_status("View deleted", false).await;
                }
                Err(e) => {
                    state
                        .set_status(format!("Error deleting view: {}", e), true)
                        .await;
                }
            },

            AppMessage::ExportView { id, path } => {
                let store = state.store.clone();
                let state = state.clone();
                tokio::spawn(async move {
                    let outcome = async {
                        let document = store.export(&id).await.map_err(|e| e.to_string())?;
                        let text = document.to_json_pretty().map_err(|e| e.to_string())?;
                        tokio::fs::write(&path, text)
                            .await
                            .map_err(|e| e.to_string())?;
                        Ok::<_, String>(())
                    }
                    .await;
                    match outcome {
                        Ok(()) => {
                            state
                                .set_status(format!("Exported to {}", path.display()), false)
                                .await
                        }
                        Err(e) => {
                            state
                                .set_status(format!("Export failed: {}", e), true)
                                .await
                        }
                    }
                });
            }

            AppMessage::ImportView { path } => {
                let store = state.store.clone();
                let state = state.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let outcome = async {
                        let text = tokio::fs::read_to_string(&path)
                            .await
                            .map_err(|e| e.to_string())?;
                        let document = ViewDocument::from_json(&text)
                            .map_err(|e| format!("invalid view document: {}", e))?;
                        store.import(document).await.map_err(|e| e.to_string())
                    }
                    .await;
                    match outcome {
                        Ok(view) => {
                            state
                                .set_status(format!("Imported view \"{}\"", view.name), false)
                                .await;
                            let _ = tx.send(AppMessage::LoadViews).await;
                        }
                        Err(e) => {
                            state
                                .set_status(format!("Import failed: {}", e), true)
                                .await
                        }
                    }
                });
            }

            AppMessage::RefreshWidgets { widgets } => {
                for widget in widgets {
                    super::refresh::spawn_widget_refresh(state.clone(), tx.clone(), widget).await;
                }
            }

            AppMessage::WidgetRefreshed {
                widget_id,
                generation,
                data,
            } => {
                // A superseded refresh ran to completion; drop its result
                // rather than overwriting newer data.
                if !state.is_current_generation(&widget_id, generation).await {
                    tracing::debug!("dropping stale refresh for {}", widget_id);
                    continue;
                }
                state.widget_data.write().await.insert(widget_id, data);
                state.notify_ui(UiUpdateSignal::WidgetDataUpdated);
            }

            AppMessage::RunQuery { widget_id, query } => {
                super::refresh::spawn_query(state.clone(), tx.clone(), widget_id, query).await;
            }

            AppMessage::RefreshSuggestions => {
                if state.fresh_suggestions().await.is_some() {
                    continue;
                }
                let api = state.api.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    match api.fetch_device_suggestions().await {
                        Ok(names) => {
                            let _ = tx.send(AppMessage::SuggestionsLoaded { names }).await;
                        }
                        Err(e) => tracing::warn!("device suggestions unavailable: {}", e),
                    }
                });
            }

            AppMessage::SuggestionsLoaded { names } => {
                {
                    let mut cache = state.suggestions_cache.write().await;
                    *cache = Some(Cached::new(names, Utc::now()));
                }
                state.notify_ui(UiUpdateSignal::SuggestionsUpdated);
            }

            AppMessage::StatsLoaded { stats } => {
                let mut cache = state.stats_cache.write().await;
                *cache = Some(Cached::new(stats, Utc::now()));
            }

            AppMessage::Status { message, is_error } => {
                state.set_status(message, is_error).await;
            }
        }
    }

    tracing::info!("state manager stopped");
}
