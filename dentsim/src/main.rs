//! dentsim: virtual patient encounters for dental students, in the terminal.
//!
//! Entry point for the `dentsim` binary. Wires together configuration
//! (`config`), the terminal lifecycle (`tui`), the unified event bus
//! (`event`), the backend worker (`api`), the UI (`ui`), the theme system
//! (`theme`), and the SQLite session cache from `dentsim-core`.
//!
//! # Startup sequence
//!
//! 1. Parse arguments and load the config file. Read-only, safe before
//!    terminal init. A bad file falls back to defaults and is logged.
//! 2. Install file logging. Nothing may write to the terminal once the
//!    alternate screen is active.
//! 3. `install_panic_hook()` runs first so it is the innermost hook.
//! 4. `register_sigterm()` returns the flag polled in the event loop.
//! 5. Open the cache and build the backend client.
//! 6. `init_tui()` enters the alternate screen and raw mode.
//! 7. Start the event task and API worker, restore any cached session.
//!
//! `restore_tui()` runs after the event loop exits on every path except a
//! panic, which the hook covers.

mod api;
mod app;
mod config;
mod event;
mod theme;
mod tui;
mod ui;

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use clap::Parser;
use dentsim_core::auth::AuthService;
use dentsim_core::http::HttpBackend;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::ui::keybindings::{handle_key, handle_mouse, KeyAction};

#[derive(Parser, Debug)]
#[command(name = "dentsim", version, about = "Virtual patient encounters for dental students")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend base URL, overriding the config file
    #[arg(long)]
    api_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

/// Sends all tracing output to `path`. The terminal belongs to the UI.
fn init_logging(path: &Path, level: Option<&str>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;

    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    // Step 1: configuration. Errors are kept until logging is up.
    let config_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let (config, config_error) = match config::Config::load(&config_path) {
        Ok(c) => (c, None),
        Err(e) => (config::Config::default(), Some(e)),
    };

    // Step 2: logging.
    init_logging(&config.log_file(), args.log_level.as_deref())?;
    info!(config = ?config_path, "dentsim starting");
    if let Some(e) = config_error {
        warn!(error = %e, "using default configuration");
    }
    let theme = theme::Theme::from_name(&config.theme);

    // Step 3: panic hook installed first so it restores the terminal.
    tui::install_panic_hook();

    // Step 4: SIGTERM flag, polled in the heartbeat arm below.
    let term_flag = tui::register_sigterm();

    // Step 5: session cache and backend, before the terminal is taken over
    // so an unusable cache path is reported on a normal screen.
    let cache_path = config.cache_path();
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let cache = dentsim_core::db::open_db(&cache_path.to_string_lossy())
        .await
        .map_err(std::io::Error::other)?;

    let base_url = args.api_url.unwrap_or_else(|| config.api.base_url.clone());
    info!(%base_url, "using backend");
    let backend = HttpBackend::new(base_url).with_timeout(config.api.timeout());
    let service = AuthService::new(Arc::new(backend), cache);

    // Step 6: enter alternate screen and raw mode.
    let mut terminal = tui::init_tui()?;

    // Step 7: event bus and API worker.
    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let (api_tx, api_rx) = tokio::sync::mpsc::unbounded_channel();
    api::worker::spawn_api_worker(service.clone(), api_rx, handler.tx.clone());
    let mut rx = handler.rx;

    let mut state = app::AppState::new(config.encounter.duration_secs.max(1), Some(api_tx));
    if let Some(session) = service.restore().await {
        info!(username = %session.username, "restored cached session");
        state.restore_session(session);
    }

    let mut last_tick = Instant::now();

    // Event loop. Exits only via `break` so `restore_tui()` is always reached.
    'event_loop: loop {
        tokio::select! {
            // Heartbeat: SIGTERM is checked at least every 50ms even when no
            // other event arrives.
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(event::AppEvent::Render) => {
                        // Exactly one draw() call per Render event.
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &theme)) {
                            warn!(error = %e, "draw failed");
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Key(key)) => {
                        if handle_key(key, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Mouse(mouse)) => {
                        if handle_mouse(mouse, &mut state) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(event::AppEvent::Tick) => {
                        let now = Instant::now();
                        state.on_tick(now.duration_since(last_tick), now);
                        last_tick = now;
                    }
                    Some(event::AppEvent::ApiResult(response)) => {
                        state.apply_api_response(*response);
                    }
                    // The next Render picks up the new frame size.
                    Some(event::AppEvent::Resize(_, _)) => {}
                    Some(event::AppEvent::Quit) | None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    info!("dentsim stopped");
    Ok(())
}
