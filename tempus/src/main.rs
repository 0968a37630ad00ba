use std::fs::OpenOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tempus::app::App;
use tempus::clock::SystemClock;
use tempus::config::{self, Config};
use tempus::persistence;
use tempus::session::StopwatchSession;
use tempus::stopwatch::{Stopwatch, TimerState};
use tempus::ui;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL: Duration = Duration::from_millis(200);

fn init_logging() -> Result<()> {
    let path = persistence::log_path()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file at {:?}", path))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("TEMPUS_LOG").unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn restore_session(config: &Config) -> StopwatchSession {
    let state = match persistence::load_timer() {
        Ok(state) => state.unwrap_or_default(),
        Err(e) => {
            warn!(error = %e, "Ignoring unreadable timer state");
            TimerState::default()
        }
    };
    let stopwatch = Stopwatch::restore(state, Arc::new(SystemClock))
        .with_default_description(config.stopwatch.default_description.clone());
    StopwatchSession::new(stopwatch, config.stopwatch.tick_every())
}

/// A running timer is kept on disk so `tempusctl stop` or the next launch
/// can finish it.
fn persist_timer(was_running: bool, state: &TimerState) {
    if let Err(e) = persistence::sync_timer(was_running, state) {
        warn!(error = %e, "Failed to persist timer state");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;
    let config = config::load_config()?;
    let client = Arc::new(config.build_client()?);
    if !client.has_token() {
        warn!("No API token configured; requests will fail until one is set");
    }

    let session = restore_session(&config);
    let mut app = App::new(config, client, session);
    app.refresh().await;
    info!("Tempus started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    persist_timer(app.timer.is_running, &app.session.snapshot().await);
    // Dropping the app drops the session and cancels its ticker.
    drop(app);

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }
    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        app.sync_timer().await;
        terminal.draw(|f| ui::draw(f, app))?;

        if app.should_quit {
            return Ok(());
        }

        // crossterm polling blocks; keep the ticker's worker threads free.
        let event = tokio::task::block_in_place(|| -> io::Result<Option<Event>> {
            if event::poll(POLL_INTERVAL)? {
                Ok(Some(event::read()?))
            } else {
                Ok(None)
            }
        })?;

        if let Some(Event::Key(key)) = event {
            if key.kind == KeyEventKind::Press {
                let was_running = app.timer.is_running;
                app.handle_key(key.code).await;
                persist_timer(was_running, &app.timer);
            }
        }
    }
}
