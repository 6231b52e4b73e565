use super::loader::{ConfigError, Result};
use serde::Deserialize;
use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Highest compression level understood by 7-Zip's `-mx` switch
pub const MAX_COMPRESSION_LEVEL: u8 = 9;

/// Container format of the produced archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub enum ArchiveFormat {
    #[default]
    #[serde(rename = "7z")]
    SevenZip,
    #[serde(rename = "zip")]
    Zip,
}

impl ArchiveFormat {
    /// File extension, also the value passed to the archiver's `-t` switch
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::SevenZip => "7z",
            ArchiveFormat::Zip => "zip",
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Input to a single backup run.
///
/// Built once from the command line (or tests) and never mutated after the
/// orchestrator receives it. Retention values are `NonZeroU32`, so a
/// malformed or zero retention can never reach the sweepers.
#[derive(Debug, Clone)]
pub struct BackupRequest {
    server: String,
    source: PathBuf,
    destination: PathBuf,
    log_directory: PathBuf,
    archiver: PathBuf,
    include_auxiliary: bool,
    archive_retention: Option<NonZeroU32>,
    log_retention_days: Option<NonZeroU32>,
    format: ArchiveFormat,
    compression_level: u8,
    timeout: Option<Duration>,
}

impl BackupRequest {
    /// Create a request with default options: auxiliary files excluded,
    /// no retention, 7z format, compression level 5, no timeout.
    pub fn new(
        server: impl Into<String>,
        source: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        log_directory: impl Into<PathBuf>,
        archiver: impl Into<PathBuf>,
    ) -> Result<Self> {
        let server = server.into();
        validate_server_name(&server)?;

        Ok(Self {
            server,
            source: source.into(),
            destination: destination.into(),
            log_directory: log_directory.into(),
            archiver: archiver.into(),
            include_auxiliary: false,
            archive_retention: None,
            log_retention_days: None,
            format: ArchiveFormat::default(),
            compression_level: default_compression_level(),
            timeout: None,
        })
    }

    pub fn with_auxiliary_files(mut self, include: bool) -> Self {
        self.include_auxiliary = include;
        self
    }

    pub fn with_archive_retention(mut self, keep: Option<NonZeroU32>) -> Self {
        self.archive_retention = keep;
        self
    }

    pub fn with_log_retention_days(mut self, days: Option<NonZeroU32>) -> Self {
        self.log_retention_days = days;
        self
    }

    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_compression_level(mut self, level: u8) -> Result<Self> {
        validate_compression_level(level)?;
        self.compression_level = level;
        Ok(self)
    }

    /// Bound the archiver run; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Result<Self> {
        if timeout.is_some_and(|t| t.is_zero()) {
            return Err(ConfigError::ValidationError(
                "Archiver timeout must be greater than zero".to_string(),
            ));
        }
        self.timeout = timeout;
        Ok(self)
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn log_directory(&self) -> &Path {
        &self.log_directory
    }

    pub fn archiver(&self) -> &Path {
        &self.archiver
    }

    pub fn include_auxiliary(&self) -> bool {
        self.include_auxiliary
    }

    pub fn archive_retention(&self) -> Option<NonZeroU32> {
        self.archive_retention
    }

    pub fn log_retention_days(&self) -> Option<NonZeroU32> {
        self.log_retention_days
    }

    pub fn format(&self) -> ArchiveFormat {
        self.format
    }

    pub fn compression_level(&self) -> u8 {
        self.compression_level
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Contents of the optional TOML settings file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub archiver: ArchiverSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiverSettings {
    /// Path to the 7-Zip executable (looked up on PATH when absent)
    #[serde(default)]
    pub path: Option<PathBuf>,

    #[serde(default = "default_compression_level")]
    pub compression_level: u8,

    /// Upper bound on a single archiver run
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl Default for ArchiverSettings {
    fn default() -> Self {
        Self {
            path: None,
            compression_level: default_compression_level(),
            timeout_seconds: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_max_files")]
    pub max_files: u32,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: default_log_directory(),
            level: default_log_level(),
            max_files: default_log_max_files(),
        }
    }
}

fn validate_server_name(server: &str) -> Result<()> {
    if server.trim().is_empty() {
        return Err(ConfigError::InvalidServerName(
            "server name must not be empty".to_string(),
        ));
    }

    if server.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control()) {
        return Err(ConfigError::InvalidServerName(format!(
            "'{}' cannot be used in a file name",
            server
        )));
    }

    Ok(())
}

pub(super) fn validate_compression_level(level: u8) -> Result<()> {
    if level > MAX_COMPRESSION_LEVEL {
        return Err(ConfigError::ValidationError(format!(
            "Compression level must be between 0 and {}, got {}",
            MAX_COMPRESSION_LEVEL, level
        )));
    }
    Ok(())
}

// Default value functions

fn default_compression_level() -> u8 { 5 }
fn default_log_directory() -> PathBuf { PathBuf::from("logs") }
fn default_log_level() -> String { "info".to_string() }
fn default_log_max_files() -> u32 { 7 }
