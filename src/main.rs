use anyhow::{Context, Result};
use clap::Parser;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tm1_backup::config::{self, ArchiveFormat, BackupRequest, Settings};
use tm1_backup::managers::backup::{BackupManager, BackupReport};
use tm1_backup::managers::logging::{self, LoggingConfig};
use tm1_backup::utils::archive;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "tm1-backup")]
#[command(about = "Back up a TM1 database directory with 7-Zip", long_about = None)]
#[command(version)]
struct Cli {
    /// TM1 instance name
    server: String,

    /// TM1 database location
    source: PathBuf,

    /// Location to place backup files
    destination: PathBuf,

    /// Location of TM1 log files
    logdir: PathBuf,

    /// Back up feeder files
    #[arg(short, long)]
    feeders: bool,

    /// Keep <N> backup files for this server
    #[arg(short, long, value_name = "N", default_value = "1")]
    keep: NonZeroU32,

    /// Keep <DAYS> days of TM1 log files (no log cleanup when omitted)
    #[arg(short, long = "log-days", value_name = "DAYS")]
    log_days: Option<NonZeroU32>,

    /// Use ZIP format instead of 7z
    #[arg(short, long)]
    zip: bool,

    /// Path to the 7-Zip executable (defaults to settings, then PATH)
    #[arg(short, long, value_name = "PATH")]
    sevenzip: Option<PathBuf>,

    /// Path to settings file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Abort the archiver after this many seconds
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

fn main() -> ExitCode {
    let start_time = Instant::now();
    let cli = Cli::parse();

    let settings = match cli.config.as_deref().map(config::load_settings).transpose() {
        Ok(settings) => settings.unwrap_or_default(),
        Err(e) => {
            logging::init_console_logging();
            error!("Invalid settings file {:?}: {}", cli.config, e);
            return ExitCode::FAILURE;
        }
    };

    // Must stay alive until exit so buffered log lines reach the file
    let _log_guard = match logging::init_logging(&LoggingConfig::from_settings(&settings.logging)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_console_logging();
            warn!("File logging unavailable, logging to console only: {:#}", e);
            None
        }
    };

    info!("{} Version: {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    match run(&cli, &settings) {
        Ok(_) => {
            info!(
                "Finished successfully in {:.2} seconds.",
                start_time.elapsed().as_secs_f64()
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Backup failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, settings: &Settings) -> Result<BackupReport> {
    let request = build_request(cli, settings)?;

    let report = BackupManager::new()
        .run(&request)
        .with_context(|| format!("Backup of server '{}' failed", request.server()))?;

    if !report.sweeps_clean() {
        warn!("Backup succeeded but retention cleanup was incomplete, see errors above");
    }

    Ok(report)
}

/// Merge command line arguments over the settings file
fn build_request(cli: &Cli, settings: &Settings) -> Result<BackupRequest> {
    let archiver = cli
        .sevenzip
        .clone()
        .or_else(|| settings.archiver.path.clone())
        .or_else(archive::locate_archiver)
        .context("7-Zip executable not found; pass --sevenzip or set archiver.path in the settings file")?;

    let format = if cli.zip {
        ArchiveFormat::Zip
    } else {
        ArchiveFormat::SevenZip
    };

    let timeout = cli
        .timeout
        .or(settings.archiver.timeout_seconds)
        .map(Duration::from_secs);

    let request = BackupRequest::new(
        cli.server.clone(),
        cli.source.clone(),
        cli.destination.clone(),
        cli.logdir.clone(),
        archiver,
    )?
    .with_auxiliary_files(cli.feeders)
    .with_archive_retention(Some(cli.keep))
    .with_log_retention_days(cli.log_days)
    .with_format(format)
    .with_compression_level(settings.archiver.compression_level)?
    .with_timeout(timeout)?;

    Ok(request)
}
