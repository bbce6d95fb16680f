//! Reqmap CLI - Capture browser requests and map them
//!
//! Usage:
//!   reqmap view --events <FILE> --tab <ID>     Interactive mind map
//!   reqmap export --events <FILE> --tab <ID>   Headless JSON/JPEG export
//!   reqmap colors                              Show color preferences
//!   reqmap colors set <METHOD> <BG> <FG>       Save a color pair

mod config;
mod export;
mod source;
mod tree;
mod tui;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use config::{ColorPair, MethodColors, Rgb};
use reqmap_capture::spawn_engine;
use reqmap_common::TabId;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reqmap")]
#[command(author = "Reqmap Team")]
#[command(version)]
#[command(about = "Map captured browser requests as a collapsible tree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture events and browse the mind map interactively
    View {
        /// JSONL file of lifecycle events to replay
        #[arg(short, long)]
        events: PathBuf,

        /// Tab to capture (events for other tabs are dropped)
        #[arg(short, long)]
        tab: TabId,

        /// Keep tailing the event file for new events
        #[arg(short, long)]
        follow: bool,
    },

    /// Replay events and export the result without the TUI
    Export {
        /// JSONL file of lifecycle events to replay
        #[arg(short, long)]
        events: PathBuf,

        /// Tab to capture (events for other tabs are dropped)
        #[arg(short, long)]
        tab: TabId,

        /// Export format
        #[arg(short = 'F', long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output path (defaults to captured_requests.json / mindmap.jpg)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show or change per-method color preferences
    Colors {
        #[command(subcommand)]
        action: Option<ColorsAction>,
    },
}

#[derive(Subcommand)]
enum ColorsAction {
    /// Save a background/text pair for a method key (e.g. GET, WS)
    Set {
        /// Method key
        method: String,

        /// Background color as #rrggbb
        background: String,

        /// Text color as #rrggbb
        color: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExportFormat {
    Json,
    Jpeg,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},reqmap_cli=info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    config::ensure_dirs()?;

    match cli.command {
        Commands::View { events, tab, follow } => view(events, tab, follow).await,
        Commands::Export {
            events,
            tab,
            format,
            output,
        } => export_headless(events, tab, format, output).await,
        Commands::Colors { action } => colors_command(action),
    }
}

async fn view(events: PathBuf, tab: TabId, follow: bool) -> Result<()> {
    let colors = MethodColors::load()?;

    // Surface a bad --events path before the terminal goes raw
    source::open_events(&events).await?;

    let (event_tx, event_rx) = mpsc::channel(256);
    let (handle, _engine) = spawn_engine(event_rx);
    handle.start_capture(tab).await?;

    let replay = tokio::spawn(async move {
        if let Err(err) = source::replay_events(events, event_tx, follow).await {
            warn!("Event replay failed: {err:#}");
        }
    });
    let result = tui::run(handle, colors).await;
    replay.abort();
    result
}

async fn export_headless(
    events: PathBuf,
    tab: TabId,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    let (event_tx, event_rx) = mpsc::channel(256);
    let (handle, _engine) = spawn_engine(event_rx);
    handle.start_capture(tab).await?;

    // Replay the whole file before taking the snapshot
    source::replay_events(events, event_tx, false).await?;
    let requests = handle.requests().await?;

    match format {
        ExportFormat::Json => {
            let path = output.unwrap_or_else(|| PathBuf::from(tui::JSON_EXPORT_FILE));
            export::export_json(&requests, &path)?;
            println!("Exported {} requests to {}", requests.len(), path.display());
        }
        ExportFormat::Jpeg => {
            let colors = MethodColors::load()?;
            let path = output.unwrap_or_else(|| PathBuf::from(tui::IMAGE_EXPORT_FILE));
            let mut root = tree::build_tree(&requests, &HashMap::new());
            export::export_jpeg(&mut root, &colors, &path)?;
            println!("Exported mind map of {} requests to {}", requests.len(), path.display());
        }
    }
    Ok(())
}

fn colors_command(action: Option<ColorsAction>) -> Result<()> {
    let mut colors = MethodColors::load()?;

    match action {
        None => {
            for key in colors.keys() {
                let pair = colors.get(key).context("color key vanished")?;
                println!("{:<8} background {}  text {}", key, pair.background, pair.color);
            }
        }
        Some(ColorsAction::Set {
            method,
            background,
            color,
        }) => {
            if Rgb::from_hex(&background).is_none() {
                bail!("Invalid background color {background:?}, expected #rrggbb");
            }
            if Rgb::from_hex(&color).is_none() {
                bail!("Invalid text color {color:?}, expected #rrggbb");
            }
            colors.set(method.clone(), ColorPair { background, color });
            colors.save()?;
            println!("Saved colors for {method}");
        }
    }
    Ok(())
}
