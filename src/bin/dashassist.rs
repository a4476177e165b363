use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tracing::{error, info};

use dashassist::config::Config;
use dashassist::core::DatasetKey;
use dashassist::services::HttpBackend;
use dashassist::tui::components::load_charts;
use dashassist::tui::{App, AppEvent};

/// Dataset chat and chart insight companion for the dashboard
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable file logging at the given level (overrides RUST_LOG)
    #[arg(long = "logging", value_enum)]
    logging: Option<LogLevel>,
    /// Path to a config file (overrides default config discovery)
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON file with the dashboard's chart metadata
    #[arg(long = "charts", value_name = "PATH")]
    charts: Option<PathBuf>,
    /// Write the log here instead of ./dashassist.log
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,
    /// Start with this dataset selected, as "{id}-{table_name}"
    #[arg(long = "dataset", value_name = "KEY")]
    dataset: Option<DatasetKey>,
    /// Write the active keybindings to PATH and exit
    #[arg(long = "write-keybindings", value_name = "PATH")]
    write_keybindings: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    dashassist::logging::init_with(args.log_file.clone(), args.logging.map(Into::into))?;

    let config = Config::from_path(args.config.as_ref())?;
    let charts = match &args.charts {
        Some(path) => load_charts(path)?,
        None => Vec::new(),
    };
    let backend = Arc::new(HttpBackend::from_config(&config.services)?);
    info!(
        api = %config.services.dashboard_api_url,
        charts = charts.len(),
        "starting"
    );

    let (tx, rx) = unbounded_channel();
    let mut app = App::new(&config, backend, charts, tx)?;
    if let Some(path) = &args.write_keybindings {
        app.keybindings().save_to_file(path)?;
        println!("Keybindings written to {}", path.display());
        return Ok(());
    }
    if let Some(key) = args.dataset.clone() {
        app.select_dataset(key);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let res = run_app(&mut terminal, &mut app, rx);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    if let Err(e) = &res {
        error!("Error: {e:?}");
    }
    res
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut events: UnboundedReceiver<AppEvent>,
) -> Result<()> {
    app.start();
    loop {
        terminal.draw(|f| app.render(f))?;

        // Completions from background requests
        while let Ok(event) = events.try_recv() {
            app.handle_app_event(event);
        }

        if event::poll(Duration::from_millis(100))? {
            if let CEvent::Key(key_event) = event::read()? {
                app.handle_key_event(key_event)?;
            }
        }
        app.update()?;

        if app.should_quit() {
            info!("quit requested");
            return Ok(());
        }
    }
}
