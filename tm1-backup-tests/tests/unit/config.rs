//! Unit tests for settings files and backup requests

use rstest::rstest;
use std::num::NonZeroU32;
use std::path::Path;
use std::time::Duration;
use test_utils::{settings_toml, ArchiveFormat, BackupRequest, ResultAssertions, TestContext};
use tm1_backup::config::{load_settings, parse_settings, ConfigError};

#[test]
fn test_load_settings_from_file() {
    let ctx = TestContext::new();
    let app_logs = ctx.temp_dir().join("applogs");
    let path = ctx.create_file("tm1backup.toml", &settings_toml(&app_logs));

    let settings = load_settings(&path).assert_ok();

    assert_eq!(settings.archiver.compression_level, 5);
    assert_eq!(settings.logging.directory, app_logs);
    assert_eq!(settings.logging.level, "debug");
    assert_eq!(settings.logging.max_files, 3);
}

#[test]
fn test_load_settings_missing_file() {
    let ctx = TestContext::new();
    let result = load_settings(ctx.temp_dir().join("absent.toml"));
    assert!(matches!(result, Err(ConfigError::ReadError(_))));
}

#[test]
fn test_archiver_section() {
    let settings = parse_settings(
        r#"
[archiver]
path = "/opt/7-Zip/7zz"
compression_level = 9
timeout_seconds = 3600
"#,
    )
    .assert_ok();

    assert_eq!(settings.archiver.path.as_deref(), Some(Path::new("/opt/7-Zip/7zz")));
    assert_eq!(settings.archiver.compression_level, 9);
    assert_eq!(settings.archiver.timeout_seconds, Some(3600));
}

#[rstest]
#[case("[archiver]\ncompression_level = 10\n", "Compression level")]
#[case("[archiver]\ntimeout_seconds = 0\n", "timeout_seconds")]
#[case("[logging]\nmax_files = 0\n", "max_files")]
#[case("[logging]\nlevel = \"loud\"\n", "unknown level")]
#[case("[archiver\n", "parse")]
fn test_invalid_settings(#[case] contents: &str, #[case] message: &str) {
    parse_settings(contents).assert_err_contains(message);
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("prod/main")]
#[case("prod\\main")]
#[case("C:prod")]
#[case("prod\nmain")]
fn test_invalid_server_names(#[case] server: &str) {
    let result = BackupRequest::new(server, "/data", "/backups", "/logs", "/7z");
    assert!(matches!(result, Err(ConfigError::InvalidServerName(_))));
}

#[test]
fn test_request_defaults() {
    let request = BackupRequest::new("tm1srv", "/data", "/backups", "/logs", "/7z").assert_ok();

    assert_eq!(request.server(), "tm1srv");
    assert!(!request.include_auxiliary());
    assert_eq!(request.archive_retention(), None);
    assert_eq!(request.log_retention_days(), None);
    assert_eq!(request.format(), ArchiveFormat::SevenZip);
    assert_eq!(request.compression_level(), 5);
    assert_eq!(request.timeout(), None);
}

#[test]
fn test_request_options() {
    let request = BackupRequest::new("tm1srv", "/data", "/backups", "/logs", "/7z")
        .assert_ok()
        .with_auxiliary_files(true)
        .with_archive_retention(NonZeroU32::new(4))
        .with_log_retention_days(NonZeroU32::new(30))
        .with_format(ArchiveFormat::Zip)
        .with_compression_level(0)
        .assert_ok()
        .with_timeout(Some(Duration::from_secs(60)))
        .assert_ok();

    assert!(request.include_auxiliary());
    assert_eq!(request.archive_retention(), NonZeroU32::new(4));
    assert_eq!(request.log_retention_days(), NonZeroU32::new(30));
    assert_eq!(request.format(), ArchiveFormat::Zip);
    assert_eq!(request.compression_level(), 0);
    assert_eq!(request.timeout(), Some(Duration::from_secs(60)));
}

#[test]
fn test_request_rejects_bad_level_and_timeout() {
    let request = BackupRequest::new("tm1srv", "/data", "/backups", "/logs", "/7z").assert_ok();

    request
        .clone()
        .with_compression_level(12)
        .assert_err_contains("between 0 and 9");
    request
        .with_timeout(Some(Duration::ZERO))
        .assert_err_contains("greater than zero");
}
