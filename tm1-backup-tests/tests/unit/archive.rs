//! Unit tests for archive naming and the 7-Zip command line

use chrono::{Local, TimeZone};
use rstest::rstest;
use std::path::Path;
use test_utils::{ArchiveFormat, ArchiveJob, TestContext};
use tm1_backup::utils::archive::{archive_glob, archive_path, FEEDERS_EXCLUSION};

fn args_of(job: &ArchiveJob) -> Vec<String> {
    job.args()
        .iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[rstest]
#[case(false, true)]
#[case(true, false)]
fn test_feeder_exclusion(#[case] include_feeders: bool, #[case] expect_exclusion: bool) {
    let ctx = TestContext::new();
    let mut builder = ctx.request("tm1srv");
    if include_feeders {
        builder = builder.with_feeders();
    }

    let job = ArchiveJob::from_request(&builder.build());

    assert_eq!(
        args_of(&job).contains(&FEEDERS_EXCLUSION.to_string()),
        expect_exclusion
    );
}

#[rstest]
#[case(ArchiveFormat::SevenZip, "-t7z", "7z")]
#[case(ArchiveFormat::Zip, "-tzip", "zip")]
fn test_format_switch_matches_extension(
    #[case] format: ArchiveFormat,
    #[case] switch: &str,
    #[case] extension: &str,
) {
    let ctx = TestContext::new();
    let mut builder = ctx.request("tm1srv");
    if format == ArchiveFormat::Zip {
        builder = builder.zip();
    }

    let job = ArchiveJob::from_request(&builder.build());

    assert!(args_of(&job).contains(&switch.to_string()));
    assert_eq!(job.archive_path().extension().unwrap(), extension);
}

#[test]
fn test_archive_path_is_pure() {
    let dest = Path::new("/backups");
    let first = archive_path(dest, "tm1srv", "20250101020000", ArchiveFormat::SevenZip);
    let second = archive_path(dest, "tm1srv", "20250101020000", ArchiveFormat::SevenZip);

    assert_eq!(first, second);
    assert_eq!(first, Path::new("/backups/tm1srv_Backup_20250101020000.7z"));
}

#[test]
fn test_job_places_archive_in_destination() {
    let ctx = TestContext::new();
    let request = ctx.request("tm1srv").build();
    let now = Local.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap();

    let job = ArchiveJob::new(&request, now);

    assert_eq!(
        job.archive_path(),
        ctx.destination().join("tm1srv_Backup_20250630235959.7z")
    );
    assert_eq!(job.program(), ctx.archiver());
}

#[test]
fn test_archive_operation_comes_first_and_source_last() {
    let ctx = TestContext::new();
    let job = ArchiveJob::from_request(&ctx.request("tm1srv").build());
    let args = args_of(&job);

    assert_eq!(args[0], "a");
    assert_eq!(args[1], job.archive_path().to_string_lossy());
    assert!(args.contains(&"-mmt".to_string()));
    assert!(args.contains(&"-mx=5".to_string()));
    assert_eq!(args[args.len() - 2], "--");
    assert_eq!(args[args.len() - 1], ctx.source().to_string_lossy());
}

#[test]
fn test_timestamp_is_fourteen_digits() {
    let ctx = TestContext::new();
    let job = ArchiveJob::from_request(&ctx.request("tm1srv").build());

    assert_eq!(job.timestamp().len(), 14);
    assert!(job.timestamp().chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn test_archive_glob_is_server_scoped() {
    assert_eq!(archive_glob("prod", ArchiveFormat::SevenZip), "prod_Backup_*.7z");
    assert_eq!(archive_glob("prod", ArchiveFormat::Zip), "prod_Backup_*.zip");
}
