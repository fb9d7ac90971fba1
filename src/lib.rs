//! MKV Tracks Swapper - puts the audio and subtitle tracks in a preferred
//! language first in MKV files.
//!
//! Tracks are read with `mkvinfo`, reordered and flagged, then written back
//! with `mkvmerge`.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod error;
pub mod media;
pub mod process;
pub mod swap;
pub mod validation;
pub mod worker;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Cli;
use crate::config::loader;
use crate::config::AppConfig;
use crate::discovery::FileDiscovery;
use crate::swap::{LanguageMatch, LanguageRequest, SwapSettings};
use crate::worker::SwapWorker;

/// Runs the swapper with the provided CLI arguments.
pub async fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level(), cli.json_logs)?;

    if !cli.has_languages() {
        info!("No language specified, nothing to do.");
        return Ok(());
    }

    let config = load_config(&cli)?;
    info!(
        audio = cli.audio.as_deref().unwrap_or("-"),
        subtitles = cli.subtitles.as_deref().unwrap_or("-"),
        overwrite = cli.overwrite,
        dry_run = cli.dry_run,
        "Putting wanted languages first"
    );

    let discovery = FileDiscovery::new(&config.files.patterns)?;
    let files = discovery.collect(&cli.paths);
    for file in &files {
        info!(file = ?file, "Queued");
    }

    if files.is_empty() {
        error!("No valid file found.");
        return Ok(());
    }

    let settings = SwapSettings {
        requests: LanguageRequest::from_languages(cli.audio.as_deref(), cli.subtitles.as_deref()),
        language_match: config.language_match,
        overwrite: cli.overwrite,
        dry_run: cli.dry_run,
    };
    let worker = Arc::new(SwapWorker::from_config(&config, settings));

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining work");
            interrupt.cancel();
        }
    });

    let summary = worker.process_all(files, &cancel).await;

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&summary.reports)?);
    }

    info!(
        total = summary.total(),
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Finished"
    );

    if summary.failed > 0 {
        anyhow::bail!("{} of {} file(s) failed", summary.failed, summary.total());
    }

    Ok(())
}

/// Loads the configuration and applies command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    loader::load_and_validate(cli.config.as_deref(), |config| {
        if cli.exact_language {
            config.language_match = LanguageMatch::Exact;
        }
        if let Some(max_parallel) = cli.max_parallel {
            config.max_parallel = max_parallel;
        }
    })
}

/// Initializes the tracing subscriber for structured logging.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!(e))?;
    }

    Ok(())
}
