pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod registry;
pub mod replay;
pub mod state;
pub mod wizard;

use clap::Parser;

use backend::HttpBackend;
use cli::Cli;
use error::AppError;
use replay::{DryRunBackend, ReplayScript};
use state::AppState;

/// SiteLog entry point.
///
/// Loads config, installs tracing, then replays the script named on the
/// command line against a fresh session and prints the report as JSON.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = config::load_or_default(cli.config.as_deref())?;

    // ── Tracing setup ────────────────────────────────────────────────────────
    //
    // Logs go to a single never-rotated file:
    //   Linux    ~/.local/share/sitelog/sitelog.log
    //   macOS    ~/Library/Application Support/sitelog/sitelog.log
    //   Windows  %LOCALAPPDATA%\sitelog\sitelog.log
    // unless `[logging] directory` says otherwise. RUST_LOG overrides the
    // configured filter.
    let log_dir = config.logging.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "sitelog.log");
    let (non_blocking, _tracing_guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.filter)),
        )
        .with_writer(non_blocking)
        .init();

    tracing::info!(script = %cli.script.display(), dry_run = cli.dry_run, "SiteLog starting");

    let text = std::fs::read_to_string(&cli.script)?;
    let script: ReplayScript =
        serde_json::from_str(&text).map_err(|e| AppError::Io(format!("invalid script: {e}")))?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let state = AppState::new(config);
    let report = if cli.dry_run {
        runtime.block_on(replay::replay(script, &state, &DryRunBackend))?
    } else {
        let backend = HttpBackend::from_config(&state.config.api)?;
        runtime.block_on(replay::replay(script, &state, &backend))?
    };

    let json = serde_json::to_string_pretty(&report).map_err(|e| AppError::Io(e.to_string()))?;
    match &cli.output {
        Some(path) => std::fs::write(path, json)?,
        None => println!("{json}"),
    }

    tracing::info!(
        failures = report.failures(),
        status = ?report.session.status,
        "replay finished"
    );
    Ok(())
}
