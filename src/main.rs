use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::DefaultTerminal;
use ratatui::crossterm::event::{
    DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture,
};
use ratatui::crossterm::execute;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use usertable::controller::Controller;
use usertable::domain::{
    DEFAULT_PAGE_SIZE, DEFAULT_RESULTS, DEFAULT_SOURCE_URL, TVConfig, TVError,
};
use usertable::model::{Model, Status};
use usertable::source::source_from_config;
use usertable::ui::TableUI;

/// Browse randomly generated users in a paginated, sortable table.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Read users from a json file instead of the web api
    #[arg(short, long)]
    fixture: Option<String>,

    /// Endpoint of the random user api
    #[arg(long, default_value = DEFAULT_SOURCE_URL)]
    url: String,

    /// Number of users to request
    #[arg(long, default_value_t = DEFAULT_RESULTS)]
    results: usize,

    /// Rows per page
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Give up on a request after this many seconds (default: wait forever)
    #[arg(long)]
    timeout: Option<u64>,

    /// Keep the loaded users across page changes instead of fetching again
    #[arg(long)]
    keep_dataset: bool,

    /// Start in dark mode
    #[arg(long)]
    dark: bool,

    /// Where to write the log [default: <tmp>/usertable.log]
    #[arg(long)]
    log_file: Option<String>,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn expand_path(path: &str) -> Result<PathBuf, TVError> {
    shellexpand::full(path)
        .map(|p| PathBuf::from(p.as_ref()))
        .map_err(|e| TVError::InvalidConfig(e.to_string()))
}

fn build_config(args: &Args) -> Result<TVConfig, TVError> {
    let mut config = TVConfig::default()
        .with_source_url(args.url.clone())
        .with_results(args.results)
        .with_page_size(args.page_size)
        .with_refetch_on_page_change(!args.keep_dataset)
        .with_dark_mode(args.dark)
        .with_event_poll_time(args.poll_ms);
    if let Some(fixture) = &args.fixture {
        config = config.with_fixture(expand_path(fixture)?);
    }
    if let Some(timeout) = args.timeout {
        config = config.with_timeout_secs(timeout);
    }
    config.validate()?;
    Ok(config)
}

fn init_logging(args: &Args) -> Result<PathBuf, TVError> {
    let path = match &args.log_file {
        Some(p) => expand_path(p)?,
        None => std::env::temp_dir().join("usertable.log"),
    };
    let file = File::create(&path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .init();
    Ok(path)
}

/// Raw mode, alternate screen, mouse capture and focus reporting for the
/// lifetime of the value. Dropping it hands the terminal back.
struct TerminalSession;

impl TerminalSession {
    fn start() -> Result<(DefaultTerminal, Self), TVError> {
        let terminal = ratatui::try_init()?;
        // Construct the guard first so a failing execute still restores the screen
        let session = TerminalSession;
        execute!(io::stdout(), EnableMouseCapture, EnableFocusChange)?;
        Ok((terminal, session))
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), DisableFocusChange, DisableMouseCapture) {
            error!("Could not release mouse capture: {e}");
        }
        ratatui::restore();
    }
}

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            error!("Exiting with error: {e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run() -> Result<(), TVError> {
    let args = Args::parse();
    let log_path = init_logging(&args)?;
    let config = build_config(&args)?;
    let source = source_from_config(&config)?;
    info!(
        "Starting usertable with {} (log: {})",
        source.describe(),
        log_path.display()
    );

    let (mut terminal, _session) = TerminalSession::start()?;
    let size = terminal.size()?;

    let mut model = Model::init(&config, source, size.width, size.height)?;
    let mut ui = TableUI::new();
    let controller = Controller::new(&config);

    while model.status != Status::QUITTING {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    info!("Bye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_the_web_api() {
        let args = Args::try_parse_from(["usertable"]).unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.source_url, DEFAULT_SOURCE_URL);
        assert_eq!(config.results, 1000);
        assert_eq!(config.page_size, 40);
        assert!(config.refetch_on_page_change);
        assert_eq!(config.fixture, None);
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn flags_reach_the_config() {
        let args = Args::try_parse_from([
            "usertable",
            "--fixture",
            "tests/fixtures/users.json",
            "--page-size",
            "10",
            "--timeout",
            "5",
            "--keep-dataset",
            "--dark",
        ])
        .unwrap();
        let config = build_config(&args).unwrap();
        assert_eq!(config.fixture, Some(PathBuf::from("tests/fixtures/users.json")));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.timeout_secs, Some(5));
        assert!(!config.refetch_on_page_change);
        assert!(config.dark_mode);
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let args = Args::try_parse_from(["usertable", "--page-size", "0"]).unwrap();
        assert!(matches!(build_config(&args), Err(TVError::InvalidConfig(_))));
    }
}
