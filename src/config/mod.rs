//! Configuration for tm1-backup
//!
//! Two layers feed a run:
//! 1. An optional TOML settings file (archiver location, compression level,
//!    timeout and logging)
//! 2. Command line arguments, which build the [`BackupRequest`] and override
//!    the settings file
//!
//! ## Example Usage
//!
//! ```no_run
//! use tm1_backup::config::{self, BackupRequest};
//!
//! let settings = config::load_settings("tm1backup.toml")?;
//! let request = BackupRequest::new("tm1srv", "D:/TM1/Data", "E:/Backups", "D:/TM1/Logs", "C:/7-Zip/7z.exe")?
//!     .with_compression_level(settings.archiver.compression_level)?;
//! # Ok::<(), config::ConfigError>(())
//! ```

mod loader;
mod types;

pub use loader::{load_settings, parse_settings, ConfigError, Result};
pub use types::*;

/// Expand tilde (~) in path
pub fn expand_tilde(path: &std::path::Path) -> std::path::PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}
