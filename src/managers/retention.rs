//! Retention sweeps over backup archives and TM1 log files
//!
//! Both sweeps are best effort: a file that cannot be removed is logged and
//! reported, and the sweep moves on to the next candidate. Running a sweep
//! again removes whatever an earlier, interrupted sweep left behind.

use globset::{GlobBuilder, GlobMatcher};
use std::fs;
use std::io;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, error, info, warn};

const SECONDS_PER_DAY: u64 = 86_400;

/// TM1 process error logs, e.g. `TM1ProcessError_20250101_Load.log`
pub const PROCESS_ERROR_LOG_GLOB: &str = "TM1ProcessError*.*";

#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("Invalid retention pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to list {}: {source}", dir.display())]
    Listing {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file that a sweep decided to delete but could not
#[derive(Debug, thiserror::Error)]
#[error("Failed to remove {}: {source}", path.display())]
pub struct RetentionDeletionError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Outcome of one sweep
#[derive(Debug, Default)]
pub struct SweepReport {
    /// Number of files matching the sweep's patterns
    pub matched: usize,
    pub removed: Vec<PathBuf>,
    pub failures: Vec<RetentionDeletionError>,
}

impl SweepReport {
    /// Matching files still on disk after the sweep
    pub fn retained(&self) -> usize {
        self.matched - self.removed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn merge(&mut self, other: SweepReport) {
        self.matched += other.matched;
        self.removed.extend(other.removed);
        self.failures.extend(other.failures);
    }
}

/// One family of TM1 log files swept by age
#[derive(Debug, Clone)]
pub struct LogFamily {
    pub name: &'static str,
    pub pattern: String,
}

/// The two log families cleaned by [`sweep_by_age`]; not configurable
pub fn log_families() -> Vec<LogFamily> {
    vec![
        LogFamily {
            name: "process error logs",
            pattern: PROCESS_ERROR_LOG_GLOB.to_string(),
        },
        LogFamily {
            name: "server logs",
            // TM1S followed by a 14 digit timestamp
            pattern: format!("TM1S{}.*", "[0-9]".repeat(14)),
        },
    ]
}

#[derive(Debug, Clone)]
struct Candidate {
    path: PathBuf,
    name: String,
    modified: SystemTime,
}

/// Keep the `keep` most recently modified files in `dir` matching `pattern`
/// and delete the rest. Ties on modification time are ordered by name.
pub fn sweep_by_count(dir: &Path, pattern: &str, keep: NonZeroU32) -> Result<SweepReport, RetentionError> {
    sweep_by_count_with(dir, pattern, keep, |path| fs::remove_file(path))
}

fn sweep_by_count_with<F>(
    dir: &Path,
    pattern: &str,
    keep: NonZeroU32,
    mut remove: F,
) -> Result<SweepReport, RetentionError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    info!("Cleaning backup directory: {}", dir.display());

    let matcher = compile(pattern)?;
    let candidates = retention_set(dir, &matcher)?;
    let excess = candidates.len().saturating_sub(keep.get() as usize);

    let mut report = SweepReport {
        matched: candidates.len(),
        ..Default::default()
    };

    if excess == 0 {
        info!(
            "No backup files to remove ({} found, keeping {})",
            candidates.len(),
            keep
        );
        return Ok(report);
    }

    for candidate in candidates.into_iter().take(excess) {
        info!("Removing old backup: {}", candidate.name);
        delete(candidate, &mut remove, &mut report);
    }

    info!(
        "Backup cleanup complete - removed {} file(s)",
        report.removed.len()
    );
    Ok(report)
}

/// Delete TM1 log files in `log_dir` last modified strictly before
/// `now - days`. Only files of the [`log_families`] are considered.
pub fn sweep_by_age(log_dir: &Path, days: NonZeroU32, now: SystemTime) -> Result<SweepReport, RetentionError> {
    sweep_by_age_with(log_dir, days, now, |path| fs::remove_file(path))
}

fn sweep_by_age_with<F>(
    log_dir: &Path,
    days: NonZeroU32,
    now: SystemTime,
    mut remove: F,
) -> Result<SweepReport, RetentionError>
where
    F: FnMut(&Path) -> io::Result<()>,
{
    info!("Cleaning TM1 log directory: {}", log_dir.display());

    let cutoff = cutoff(now, days);
    let mut report = SweepReport::default();

    for family in log_families() {
        let matcher = compile(&family.pattern)?;
        let candidates = retention_set(log_dir, &matcher)?;

        let mut family_report = SweepReport {
            matched: candidates.len(),
            ..Default::default()
        };

        for candidate in candidates {
            if candidate.modified < cutoff {
                info!("Removing log file: {}", candidate.name);
                delete(candidate, &mut remove, &mut family_report);
            }
        }

        debug!(
            "Swept {}: {} matched, {} removed",
            family.name,
            family_report.matched,
            family_report.removed.len()
        );
        report.merge(family_report);
    }

    info!(
        "Log cleanup complete - removed {} file(s)",
        report.removed.len()
    );
    Ok(report)
}

/// `now` minus `days` whole days, clamped to the epoch
pub fn cutoff(now: SystemTime, days: NonZeroU32) -> SystemTime {
    let window = Duration::from_secs(u64::from(days.get()) * SECONDS_PER_DAY);
    now.checked_sub(window)
        .filter(|t| *t >= SystemTime::UNIX_EPOCH)
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn compile(pattern: &str) -> Result<GlobMatcher, RetentionError> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .case_insensitive(cfg!(windows))
        .build()
        .map(|glob| glob.compile_matcher())
        .map_err(|source| RetentionError::Pattern {
            pattern: pattern.to_string(),
            source,
        })
}

/// Regular files directly inside `dir` whose name matches, oldest first
fn retention_set(dir: &Path, matcher: &GlobMatcher) -> Result<Vec<Candidate>, RetentionError> {
    let entries = fs::read_dir(dir).map_err(|source| RetentionError::Listing {
        dir: dir.to_path_buf(),
        source,
    })?;

    let mut candidates = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if !matcher.is_match(&name) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!("Skipping {}: cannot read metadata: {}", name, e);
                continue;
            }
        };

        if !metadata.is_file() {
            continue;
        }

        match metadata.modified() {
            Ok(modified) => candidates.push(Candidate {
                path: entry.path(),
                name,
                modified,
            }),
            Err(e) => warn!("Skipping {}: no modification time: {}", name, e),
        }
    }

    candidates.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(candidates)
}

fn delete<F>(candidate: Candidate, remove: &mut F, report: &mut SweepReport)
where
    F: FnMut(&Path) -> io::Result<()>,
{
    match remove(&candidate.path) {
        Ok(()) => report.removed.push(candidate.path),
        Err(source) => {
            let failure = RetentionDeletionError {
                path: candidate.path,
                source,
            };
            error!("{}", failure);
            report.failures.push(failure);
        }
    }
}
