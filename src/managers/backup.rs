//! Backup manager - orchestrates a single backup run
//!
//! A run validates its inputs, archives the source directory with 7-Zip and,
//! only when the archive is verified on disk, applies the retention sweeps.

use crate::config::BackupRequest;
use crate::managers::retention::{self, RetentionError, SweepReport};
use crate::utils::archive::{self, ArchiveJob};
use crate::utils::command::CommandError;
use crate::utils::executor::{CommandExecutor, RealExecutor};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, error, info, warn};

/// Which input path a precondition refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathRole {
    Source,
    Destination,
    LogDirectory,
    Archiver,
}

impl fmt::Display for PathRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathRole::Source => "Source path",
            PathRole::Destination => "Destination path",
            PathRole::LogDirectory => "TM1 log directory",
            PathRole::Archiver => "7-Zip executable",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathProblem {
    Missing,
    NotADirectory,
    NotAFile,
}

impl fmt::Display for PathProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PathProblem::Missing => "does not exist",
            PathProblem::NotADirectory => "is not a directory",
            PathProblem::NotAFile => "is not a file",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("{role} '{}' {problem}", path.display())]
    Precondition {
        role: PathRole,
        path: PathBuf,
        problem: PathProblem,
    },

    #[error("Could not run archiver: {0}")]
    Launch(#[from] CommandError),

    #[error("Archiver failed with {}", describe_exit(*exit_code))]
    ArchiveExecution {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Archiver reported success but backup file was not created: {}", path.display())]
    ArchiveVerification { path: PathBuf },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

/// What a successful run produced
#[derive(Debug)]
pub struct BackupReport {
    pub archive_path: PathBuf,
    pub archive_size: u64,
    pub elapsed: Duration,
    /// Present when archive retention was requested
    pub archive_sweep: Option<Result<SweepReport, RetentionError>>,
    /// Present when log retention was requested
    pub log_sweep: Option<Result<SweepReport, RetentionError>>,
}

impl BackupReport {
    /// True when every requested sweep ran and removed all it meant to
    pub fn sweeps_clean(&self) -> bool {
        [&self.archive_sweep, &self.log_sweep]
            .into_iter()
            .flatten()
            .all(|sweep| sweep.as_ref().is_ok_and(SweepReport::is_clean))
    }
}

pub struct BackupManager {
    executor: Box<dyn CommandExecutor>,
}

impl Default for BackupManager {
    fn default() -> Self {
        Self::new()
    }
}

impl BackupManager {
    /// Create a backup manager that spawns the real archiver
    pub fn new() -> Self {
        Self::with_executor(Box::new(RealExecutor::new()))
    }

    /// Create a backup manager with a specific command executor
    pub fn with_executor(executor: Box<dyn CommandExecutor>) -> Self {
        Self { executor }
    }

    /// Run one backup end to end.
    ///
    /// Only validation and archiving decide the result; retention failures
    /// are logged and surfaced in the report.
    pub fn run(&self, request: &BackupRequest) -> Result<BackupReport, BackupError> {
        validate_preconditions(request)?;
        log_request(request);

        let job = ArchiveJob::from_request(request);
        self.run_job(request, &job)
    }

    /// Run a prepared job. Preconditions are assumed to hold.
    pub fn run_job(&self, request: &BackupRequest, job: &ArchiveJob) -> Result<BackupReport, BackupError> {
        let start_time = Instant::now();

        info!("Starting backup of '{}'", request.source().display());
        info!("Backup file: {}", job.archive_path().display());
        debug!("Archiver command: {}", job.command_line());

        let output = self
            .executor
            .run_command(job.program(), job.args(), request.timeout())
            .inspect_err(|e| {
                error!("{}", e);
                warn_leftover_archive(job.archive_path());
            })?;

        if !output.success() {
            error!("7-Zip failed with {}", describe_exit(output.exit_code));
            if !output.stderr.is_empty() {
                error!("Error output: {}", output.stderr);
            }
            warn_leftover_archive(job.archive_path());
            return Err(BackupError::ArchiveExecution {
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        info!("Backup compression completed successfully");

        let archive_size = verify_archive(job.archive_path())?;
        info!(
            "Backup file size: {:.2} MB",
            archive_size as f64 / (1024.0 * 1024.0)
        );

        let archive_sweep = request.archive_retention().map(|keep| {
            let pattern = archive::archive_glob(request.server(), request.format());
            retention::sweep_by_count(request.destination(), &pattern, keep)
                .inspect_err(|e| error!("Error during backup cleanup: {}", e))
        });

        let log_sweep = request.log_retention_days().map(|days| {
            retention::sweep_by_age(request.log_directory(), days, SystemTime::now())
                .inspect_err(|e| error!("Error during log cleanup: {}", e))
        });

        let elapsed = start_time.elapsed();
        info!(
            "Backup for server '{}' completed in {:.2}s",
            request.server(),
            elapsed.as_secs_f64()
        );

        Ok(BackupReport {
            archive_path: job.archive_path().to_path_buf(),
            archive_size,
            elapsed,
            archive_sweep,
            log_sweep,
        })
    }
}

/// Check every input path before anything touches the filesystem
pub fn validate_preconditions(request: &BackupRequest) -> Result<(), BackupError> {
    expect_dir(PathRole::Source, request.source())?;
    expect_dir(PathRole::Destination, request.destination())?;
    expect_dir(PathRole::LogDirectory, request.log_directory())?;
    expect_file(PathRole::Archiver, request.archiver())?;
    Ok(())
}

fn expect_dir(role: PathRole, path: &Path) -> Result<(), BackupError> {
    check_path(role, path, path.is_dir(), PathProblem::NotADirectory)
}

fn expect_file(role: PathRole, path: &Path) -> Result<(), BackupError> {
    check_path(role, path, path.is_file(), PathProblem::NotAFile)
}

fn check_path(role: PathRole, path: &Path, kind_ok: bool, wrong_kind: PathProblem) -> Result<(), BackupError> {
    let problem = if !path.exists() {
        PathProblem::Missing
    } else if !kind_ok {
        wrong_kind
    } else {
        return Ok(());
    };

    Err(BackupError::Precondition {
        role,
        path: path.to_path_buf(),
        problem,
    })
}

/// Size of the archive in bytes, or a verification error if it is absent
fn verify_archive(path: &Path) -> Result<u64, BackupError> {
    match std::fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {
            if metadata.len() == 0 {
                warn!("Backup file is empty: {}", path.display());
            }
            Ok(metadata.len())
        }
        _ => {
            error!("Backup file was not created: {}", path.display());
            Err(BackupError::ArchiveVerification {
                path: path.to_path_buf(),
            })
        }
    }
}

/// A failed run can leave a partial archive that later count sweeps would
/// treat as a real backup. Returns whether one was found.
fn warn_leftover_archive(path: &Path) -> bool {
    let leftover = path.is_file();
    if leftover {
        warn!(
            "Partial backup file left by the failed archiver run, remove it manually: {}",
            path.display()
        );
    }
    leftover
}

fn log_request(request: &BackupRequest) {
    info!("Server name: {}", request.server());
    info!("Source path: {}", request.source().display());
    info!("Destination path: {}", request.destination().display());
    info!("Logging path: {}", request.log_directory().display());
    info!("7-Zip located at: {}", request.archiver().display());
    info!("Backup format: {}", request.format());

    if request.include_auxiliary() {
        info!("Feeder files will be included in backup");
    } else {
        info!("Feeder files will be excluded from backup");
    }

    if let Some(keep) = request.archive_retention() {
        info!("Backup file retention: {} files", keep);
    }

    if let Some(days) = request.log_retention_days() {
        info!("Log file retention: {} days", days);
    }

    if let Some(timeout) = request.timeout() {
        info!("Archiver timeout: {}s", timeout.as_secs());
    }
}
