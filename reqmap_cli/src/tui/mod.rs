//! Terminal user interface for the captured-request mind map

mod app;
mod ui;

pub use app::{MapApp, TuiEvent, IMAGE_EXPORT_FILE, JSON_EXPORT_FILE};

use crate::config::MethodColors;
use anyhow::Result;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use reqmap_capture::CaptureHandle;
use std::io;
use std::time::Duration;

/// How often the map re-fetches requests and rebuilds the tree
const REFRESH_INTERVAL: Duration = Duration::from_secs(10);

/// Run the mind-map TUI until the user quits.
pub async fn run(handle: CaptureHandle, colors: MethodColors) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = MapApp::new(colors);
    let result = run_loop(&mut terminal, &mut app, handle).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut MapApp,
    handle: CaptureHandle,
) -> Result<()> {
    // Populate the map right away instead of waiting out the first
    // refresh interval
    refresh(app, &handle).await?;

    let mut tick_interval = tokio::time::interval(Duration::from_millis(100));
    let mut refresh_interval = tokio::time::interval(REFRESH_INTERVAL);
    refresh_interval.tick().await; // First tick fires immediately

    loop {
        terminal.draw(|frame| ui::draw(frame, app))?;

        tokio::select! {
            // Handle keyboard events (non-blocking)
            _ = tick_interval.tick() => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        app.handle_event(TuiEvent::Key(key));
                        if app.should_quit {
                            return Ok(());
                        }
                    }
                } else {
                    app.handle_event(TuiEvent::Tick);
                }
            }

            // Periodic refresh: re-fetch and rebuild, keeping collapse
            // states and color preferences
            _ = refresh_interval.tick() => {
                refresh(app, &handle).await?;
            }
        }
    }
}

async fn refresh(app: &mut MapApp, handle: &CaptureHandle) -> Result<()> {
    let status = handle.status().await?;
    app.handle_event(TuiEvent::StatusUpdate(status));
    let requests = handle.requests().await?;
    app.handle_event(TuiEvent::Snapshot(requests));
    Ok(())
}
