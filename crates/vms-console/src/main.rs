mod state;
mod theme;
mod ui;

use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use state::App;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use vms_client::{BackendClient, ClientConfig};
use vms_sync::{alerts_loop, registry_loop, ActionDispatcher, EngineConfig, EngineEvent};

const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
const EVENT_QUEUE_CAPACITY: usize = 256;
const REDRAW_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone)]
struct Config {
    api_base: String,
    engine: EngineConfig,
}

fn load_config() -> Config {
    Config {
        api_base: resolve_api_base(),
        engine: EngineConfig::from_env(),
    }
}

fn resolve_api_base() -> String {
    if let Ok(value) = std::env::var("VMS_API_BASE") {
        if !value.trim().is_empty() {
            return value.trim().to_string();
        }
    }
    DEFAULT_API_BASE.to_string()
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_enabled = matches!(
        std::env::var("VMS_LOG_STDOUT").ok().as_deref(),
        Some("1") | Some("true") | Some("TRUE") | Some("yes") | Some("YES")
    );
    if stdout_enabled {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    } else {
        // Log lines would tear the alternate screen; sink them unless asked.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::sink)
            .try_init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = load_config();
    init_logging();

    let client = Arc::new(BackendClient::new(ClientConfig::new(&config.api_base))?);
    let mut app = App::new(ActionDispatcher::new(client.clone()));

    // Model catalog is advisory; a dead backend still gets a console.
    match client.health().await {
        Ok(health) => app.set_health(health),
        Err(err) => warn!("health_error: {err}"),
    }

    let (tx, rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
    let registry = tokio::spawn(registry_loop(client.clone(), config.engine, tx.clone()));
    let alerts = tokio::spawn(alerts_loop(client, config.engine, tx));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app, rx).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    registry.abort();
    alerts.abort();
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    mut rx: mpsc::Receiver<EngineEvent>,
) -> Result<()> {
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(REDRAW_INTERVAL_MS));

    loop {
        terminal.draw(|frame| ui::render(frame, app))?;

        tokio::select! {
            _ = redraw.tick() => {}
            received = rx.recv() => {
                let Some(event) = received else {
                    break;
                };
                app.apply_event(event);
                // Drain whatever else is queued before redrawing.
                while let Ok(event) = rx.try_recv() {
                    app.apply_event(event);
                }
            }
            maybe_event = events.next() => {
                if let Some(Ok(Event::Key(key))) = maybe_event {
                    if matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                        app.handle_key(key);
                    }
                }
            }
        }

        if app.should_quit() {
            break;
        }
    }

    Ok(())
}
