//! Test fixtures and sample data
//!
//! Archive and TM1 log file names with controlled modification times.

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tm1_backup::config::ArchiveFormat;
use tm1_backup::utils::archive::{archive_path, TIMESTAMP_FORMAT};

/// One day
pub const DAY: Duration = Duration::from_secs(86_400);

/// A whole-second reference instant, so mtimes set from it read back exactly
pub fn reference_now() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_750_000_000)
}

fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 1, 1)
        .and_then(|d| d.and_hms_opt(2, 0, 0))
        .expect("valid fixture date")
}

/// Archive timestamps one day apart, oldest first
pub fn archive_timestamps(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            (base_time() + ChronoDuration::days(i as i64))
                .format(TIMESTAMP_FORMAT)
                .to_string()
        })
        .collect()
}

/// Create `count` archives for `server` in `dir`, oldest first, each one day
/// newer than the previous and the newest modified one day before `now`
pub fn populate_archives(
    dir: &Path,
    server: &str,
    format: ArchiveFormat,
    count: usize,
    now: SystemTime,
) -> Vec<PathBuf> {
    archive_timestamps(count)
        .iter()
        .enumerate()
        .map(|(i, timestamp)| {
            let path = archive_path(dir, server, timestamp, format);
            let age = DAY * (count - i) as u32;
            touch(&path, now - age);
            path
        })
        .collect()
}

/// A TM1 process error log name, e.g. `TM1ProcessError_20250101020000_Load.log`
pub fn process_error_log(suffix: &str) -> String {
    format!("TM1ProcessError_{}.log", suffix)
}

/// A TM1 server log name, e.g. `TM1S20250101020000.log`
pub fn server_log(timestamp: &str) -> String {
    format!("TM1S{}.log", timestamp)
}

/// Create an empty file modified at `modified`
pub fn touch(path: &Path, modified: SystemTime) {
    let file = File::create(path).expect("Failed to create fixture file");
    file.set_modified(modified)
        .expect("Failed to set fixture modification time");
}

/// Settings file with logging redirected to `log_dir`
pub fn settings_toml(log_dir: &Path) -> String {
    format!(
        r#"
[archiver]
compression_level = 5

[logging]
directory = "{}"
level = "debug"
max_files = 3
"#,
        log_dir.display()
    )
}
