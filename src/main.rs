use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use staging::controller::Controller;
use staging::domain::DEFAULT_EXPORT_FILE;
use staging::model::{Model, Status};
use staging::ui::StagingUI;
use staging::{FilterSelection, Session, StagingConfig, StagingError, ingest, sample};

/// Clean, filter, edit and export CSV files.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// CSV file to load. Without a file the built-in employee roster is shown.
    file: Option<String>,

    /// Use the built-in employee roster.
    #[arg(long, conflicts_with = "file")]
    sample: bool,

    /// Write the cleaned (and filtered) table to PATH and exit without UI.
    #[arg(long, value_name = "PATH")]
    export: Option<String>,

    /// Write the removed rows to PATH and exit without UI.
    #[arg(long, value_name = "PATH")]
    audit: Option<String>,

    /// Filter column.
    #[arg(long, requires = "value")]
    column: Option<String>,

    /// Filter value, compared exactly.
    #[arg(long, requires = "column")]
    value: Option<String>,

    /// Export path used by the UI.
    #[arg(short, long, value_name = "PATH", default_value = DEFAULT_EXPORT_FILE)]
    output: String,

    #[arg(long, default_value_t = 30)]
    max_column_width: usize,

    /// Milliseconds to wait for terminal events.
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Write logs to PATH. Levels are taken from STAGING_LOG (default info).
    #[arg(long, value_name = "PATH")]
    log: Option<String>,
}

impl Args {
    fn headless(&self) -> bool {
        self.export.is_some() || self.audit.is_some()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), StagingError> {
    let log = args.log.as_deref().map(expand_path).transpose()?;
    init_logging(log.as_deref(), args.headless())?;

    let file = args.file.as_ref().filter(|_| !args.sample);
    let (raw, source) = match file {
        Some(file) => {
            let path = expand_path(file)?;
            let name = path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("???")
                .to_string();
            (ingest::read_path(&path)?, name)
        }
        None => (sample::employee_roster(), "sample roster".to_string()),
    };
    info!("Loaded {} ({} rows)", source, raw.nrows());

    let mut session = Session::new(raw)?;
    if let (Some(column), Some(value)) = (&args.column, &args.value)
        && !session.select(FilterSelection::new(column, value))
    {
        warn!("Unknown filter column \"{column}\", using all rows");
    }

    if args.headless() {
        if let Some(export) = &args.export {
            session.export(&expand_path(export)?)?;
        }
        if let Some(audit) = &args.audit {
            session.export_removed(&expand_path(audit)?)?;
        }
        println!("{}", session.summary());
        return Ok(());
    }

    let cfg = StagingConfig::default()
        .event_poll_time(args.poll_ms)
        .max_column_width(args.max_column_width)
        .export_path(expand_path(&args.output)?);

    let mut terminal = ratatui::init();
    let result = run_tui(&mut terminal, &cfg, session, source);
    ratatui::restore();
    result
}

fn run_tui(
    terminal: &mut DefaultTerminal,
    cfg: &StagingConfig,
    session: Session,
    source: String,
) -> Result<(), StagingError> {
    let size = terminal.size()?;
    let mut model = Model::init(cfg, session, source, size.width as usize, size.height as usize);
    let ui = StagingUI::new();
    let controller = Controller::new(cfg);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message);
        };
    }
    Ok(())
}

fn expand_path(path: &str) -> Result<PathBuf, StagingError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| StagingError::LoadingFailed(e.to_string()))
}

fn init_logging(log: Option<&Path>, headless: bool) -> Result<(), StagingError> {
    let filter = EnvFilter::try_from_env("STAGING_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    match log {
        Some(path) => {
            let file = File::create(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        // The terminal belongs to the UI, only log to stderr without it
        None if headless => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
        None => {}
    }
    Ok(())
}
