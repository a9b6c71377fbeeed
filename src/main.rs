mod app;
mod config;
mod event;
mod notification;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use config::Config;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use remoteview::api::HttpTransport;
use remoteview::route::Location;
use remoteview::view::get_view;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Terminal console for hosted-app project data
#[derive(Parser, Debug)]
#[command(name = "remoteview", version, about, long_about = None)]
struct Args {
    /// API base URL, e.g. https://example.com/api/0
    #[arg(long)]
    base_url: Option<String>,

    /// Organization slug
    #[arg(short, long)]
    org: Option<String>,

    /// Project slug
    #[arg(short, long)]
    project: Option<String>,

    /// API token (falls back to REMOTEVIEW_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// View to open at startup
    #[arg(long)]
    view: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    /// Run in read-only mode (block all write operations)
    #[arg(long)]
    readonly: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .expect("Failed to open log file");

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("remoteview started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("remoteview").join("remoteview.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".remoteview").join("remoteview.log");
    }
    PathBuf::from("remoteview.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    let config = Config::load();

    let base_url = args
        .base_url
        .clone()
        .or_else(|| config.effective_base_url())
        .ok_or_else(|| {
            anyhow::anyhow!("No base URL configured. Set REMOTEVIEW_BASE_URL or use --base-url")
        })?;
    let org = args
        .org
        .clone()
        .or_else(|| config.effective_org())
        .ok_or_else(|| {
            anyhow::anyhow!("No organization configured. Set REMOTEVIEW_ORG or use --org")
        })?;
    let project = args
        .project
        .clone()
        .or_else(|| config.effective_project())
        .ok_or_else(|| {
            anyhow::anyhow!("No project configured. Set REMOTEVIEW_PROJECT or use --project")
        })?;
    let token = args.token.clone().or_else(Config::effective_token);

    let initial_view = args
        .view
        .clone()
        .or_else(|| config.last_view.clone())
        .filter(|v| get_view(v).is_some())
        .unwrap_or_else(|| "overview".to_string());

    tracing::info!("Using {} org={} project={}", base_url, org, project);

    let transport = Arc::new(HttpTransport::new(&base_url, token)?);

    let mut params = HashMap::new();
    params.insert("org".to_string(), org);
    params.insert("project".to_string(), project);
    let location = Location::new(params);

    let mut app = App::new(transport, config, location, &initial_view, args.readonly);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = run_app(&mut terminal, &mut app);
    app.close();
    cleanup_terminal(&mut terminal)?;

    if let Err(err) = run_result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn cleanup_terminal<B: Backend + std::io::Write>(terminal: &mut Terminal<B>) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Event polling doubles as the frame clock; `tick` then absorbs
        // settlements and commits rested search input.
        if event::handle_events(app)? {
            return Ok(());
        }
        app.tick();
    }
}
