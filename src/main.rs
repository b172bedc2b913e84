use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing_subscriber::EnvFilter;

mod aggregate;
mod api;
mod app;
mod config;
mod models;
mod query;
mod ui;

use api::ApiClient;
use app::state::{AppMessage, AppState};
use config::Settings;
use ui::app::TuiApp;

#[derive(Parser, Debug)]
#[command(name = "logdash")]
#[command(about = "Terminal dashboard client for the qlog syslog analytics backend")]
#[command(version)]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(short, long)]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    /// Open a shared view read-only and skip the view list
    #[arg(long, value_name = "VIEW_ID")]
    share: Option<String>,

    /// Log file path (the terminal itself is owned by the TUI)
    #[arg(long)]
    log_file: Option<String>,
}

fn init_logging(args: &Args, settings: &Settings) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_path = args
        .log_file
        .as_ref()
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Settings::default_log_path);
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Suppress panic output while the alternate screen is active
    std::panic::set_hook(Box::new(|_| {}));

    let settings = Settings::load(args.config.as_deref())?;
    let _log_guard = init_logging(&args, &settings)?;

    let server_url = args.server.as_deref().unwrap_or(&settings.server_url);
    let api = ApiClient::new(server_url)?;
    tracing::info!("connecting to backend at {}", api.base_url());

    // Channels for communication
    let (state_tx, state_rx) = mpsc::channel(1000);
    let (ui_update_tx, _) = broadcast::channel(100);

    // Shared application state
    let state = Arc::new(AppState::new(api, ui_update_tx));

    // Start state manager
    let state_clone = state.clone();
    let manager_tx = state_tx.clone();
    let state_manager_handle = tokio::spawn(async move {
        app::state::run_state_manager(state_clone, state_rx, manager_tx).await;
    });

    // Initial data load
    if let Some(view_id) = &args.share {
        state_tx
            .send(AppMessage::OpenView {
                id: view_id.clone(),
                read_only: true,
            })
            .await?;
    } else {
        state_tx.send(AppMessage::LoadViews).await?;
    }

    // Run TUI (blocks until the user quits)
    let mut tui = TuiApp::new(state.clone(), state_tx, settings, args.share.is_some())?;
    let result = tui.run().await;

    state_manager_handle.abort();

    result
}
