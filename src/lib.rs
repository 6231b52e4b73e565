//! TM1 Backup Library
//!
//! Archives a TM1 data directory with 7-Zip and applies archive and log
//! retention afterwards.

pub mod config;
pub mod managers;
pub mod utils;

// Re-export commonly used types
pub use config::{load_settings, ArchiveFormat, BackupRequest, Settings};
pub use managers::backup::{BackupError, BackupManager, BackupReport};
pub use managers::logging::{init_console_logging, init_logging, LogGuard, LoggingConfig};
pub use managers::retention::{sweep_by_age, sweep_by_count, SweepReport};
pub use utils::archive::ArchiveJob;
