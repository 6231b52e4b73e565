//! Archive naming and 7-Zip command line construction
//!
//! Everything here is pure: the same request and timestamp always produce the
//! same archive path and argument list.

use crate::config::{ArchiveFormat, BackupRequest};
use chrono::{DateTime, Local};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Timestamp embedded in archive names, stable to the second
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Separator between server name and timestamp in archive names
pub const ARCHIVE_MARKER: &str = "_Backup_";

/// Exclusion switch for feeder files, recursive over the source tree
pub const FEEDERS_EXCLUSION: &str = "-xr!*.FEEDERS";

/// Executable names probed on PATH when no archiver path is configured
pub const ARCHIVER_CANDIDATES: &[&str] = &["7z", "7za", "7zz"];

/// A single archiver invocation derived from a [`BackupRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveJob {
    timestamp: String,
    archive_path: PathBuf,
    program: PathBuf,
    args: Vec<OsString>,
}

impl ArchiveJob {
    /// Build the job, capturing the current local time once
    pub fn from_request(request: &BackupRequest) -> Self {
        Self::new(request, Local::now())
    }

    pub fn new(request: &BackupRequest, now: DateTime<Local>) -> Self {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        let archive_path = archive_path(
            request.destination(),
            request.server(),
            &timestamp,
            request.format(),
        );
        let args = build_args(request, &archive_path);

        Self {
            timestamp,
            archive_path,
            program: request.archiver().to_path_buf(),
            args,
        }
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Command line as a single string, for logging only
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `<destination>/<server>_Backup_<timestamp>.<ext>`
pub fn archive_path(destination: &Path, server: &str, timestamp: &str, format: ArchiveFormat) -> PathBuf {
    destination.join(format!(
        "{}{}{}.{}",
        server,
        ARCHIVE_MARKER,
        timestamp,
        format.extension()
    ))
}

/// Glob matching every archive produced for `server` in `format`
pub fn archive_glob(server: &str, format: ArchiveFormat) -> String {
    format!(
        "{}{}*.{}",
        globset::escape(server),
        ARCHIVE_MARKER,
        format.extension()
    )
}

fn build_args(request: &BackupRequest, archive_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        "a".into(),
        archive_path.as_os_str().to_owned(),
        format!("-t{}", request.format().extension()).into(),
        "-mmt".into(),
        format!("-mx={}", request.compression_level()).into(),
    ];

    if !request.include_auxiliary() {
        args.push(FEEDERS_EXCLUSION.into());
    }

    // Source goes after the terminator so a leading '-' is never read as a switch
    args.push("--".into());
    args.push(request.source().as_os_str().to_owned());

    args
}

/// Find a 7-Zip executable on PATH
pub fn locate_archiver() -> Option<PathBuf> {
    ARCHIVER_CANDIDATES
        .iter()
        .find_map(|name| which::which(name).ok())
}
