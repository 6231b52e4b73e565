//! Test context and harness for backup run testing
//!
//! Provides a temporary TM1 layout (data, backup and log directories plus a
//! placeholder archiver) and a fluent builder for requests against it.

use std::fs::{self, File};
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tm1_backup::config::{ArchiveFormat, BackupRequest};
use tm1_backup::managers::backup::BackupManager;
use tm1_backup::utils::executor::mock::MockExecutor;

/// Test context that manages a temporary TM1 layout
pub struct TestContext {
    temp_dir: TempDir,
    source: PathBuf,
    destination: PathBuf,
    log_dir: PathBuf,
    archiver: PathBuf,
}

impl TestContext {
    /// Create `data/` (with a few model files), `backups/`, `logs/` and an
    /// archiver placeholder file
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let source = temp_dir.path().join("data");
        let destination = temp_dir.path().join("backups");
        let log_dir = temp_dir.path().join("logs");

        for dir in [&source, &destination, &log_dir] {
            fs::create_dir_all(dir).expect("Failed to create directory");
        }

        for (name, content) in [
            ("tm1s.cfg", "[TM1S]\nServerName=tm1srv\n"),
            ("Sales.cub", "cube data"),
            ("Sales.FEEDERS", "feeder data"),
        ] {
            fs::write(source.join(name), content).expect("Failed to write source file");
        }

        let archiver = temp_dir.path().join("7z.exe");
        fs::write(&archiver, "").expect("Failed to write archiver placeholder");

        Self {
            temp_dir,
            source,
            destination,
            log_dir,
            archiver,
        }
    }

    /// Get the temporary directory path
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn archiver(&self) -> &Path {
        &self.archiver
    }

    /// Start building a request for `server` against this layout
    pub fn request(&self, server: &str) -> RequestBuilder {
        RequestBuilder::new(
            server,
            &self.source,
            &self.destination,
            &self.log_dir,
            &self.archiver,
        )
    }

    /// A backup manager driving `mock` (the mock keeps recording calls)
    pub fn manager(&self, mock: &MockExecutor) -> BackupManager {
        BackupManager::with_executor(Box::new(mock.clone()))
    }

    /// Create a file in the temp dir
    pub fn create_file(&self, name: &str, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Create an empty file in `dir` last modified at `modified`
    pub fn create_file_modified_at(&self, dir: &Path, name: &str, modified: SystemTime) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).expect("Failed to create file");
        file.set_modified(modified).expect("Failed to set modification time");
        path
    }

    /// Create an empty file in `dir` last modified `age` ago
    pub fn create_file_aged(&self, dir: &Path, name: &str, age: Duration) -> PathBuf {
        self.create_file_modified_at(dir, name, SystemTime::now() - age)
    }

    /// Sorted file names directly inside `dir`
    pub fn file_names(&self, dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .expect("Failed to read directory")
            .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Fluent builder for requests in tests
pub struct RequestBuilder {
    request: BackupRequest,
}

impl RequestBuilder {
    pub fn new(server: &str, source: &Path, destination: &Path, log_dir: &Path, archiver: &Path) -> Self {
        let request = BackupRequest::new(server, source, destination, log_dir, archiver)
            .expect("Invalid test request");
        Self { request }
    }

    pub fn with_feeders(mut self) -> Self {
        self.request = self.request.with_auxiliary_files(true);
        self
    }

    pub fn keep(mut self, count: u32) -> Self {
        self.request = self.request.with_archive_retention(NonZeroU32::new(count));
        self
    }

    pub fn log_days(mut self, days: u32) -> Self {
        self.request = self.request.with_log_retention_days(NonZeroU32::new(days));
        self
    }

    pub fn zip(mut self) -> Self {
        self.request = self.request.with_format(ArchiveFormat::Zip);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request = self
            .request
            .with_timeout(Some(timeout))
            .expect("Invalid test timeout");
        self
    }

    pub fn build(self) -> BackupRequest {
        self.request
    }
}

/// Extension trait for assertion helpers
pub trait ResultAssertions<T> {
    /// Assert that the result is Ok and return the value
    fn assert_ok(self) -> T;

    /// Assert that the result is Err and the error message contains the given string
    fn assert_err_contains(self, needle: &str);
}

impl<T: std::fmt::Debug, E: std::fmt::Display> ResultAssertions<T> for Result<T, E> {
    fn assert_ok(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {}", e),
        }
    }

    fn assert_err_contains(self, needle: &str) {
        match self {
            Ok(v) => panic!("Expected Err containing '{}', got Ok: {:?}", needle, v),
            Err(e) => {
                let err_msg = e.to_string();
                assert!(
                    err_msg.contains(needle),
                    "Error '{}' does not contain '{}'",
                    err_msg,
                    needle
                );
            }
        }
    }
}
