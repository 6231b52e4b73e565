//! Backup run tests with a mocked archiver
//!
//! The mock records each invocation and, on success, writes the archive file
//! the way 7-Zip would.

use anyhow::Context;
use std::fs;
use std::time::{Duration, SystemTime};
use test_utils::{
    populate_archives, ArchiveFormat, ArchiveJob, BackupError, MockExecutor, MockResponse,
    PathProblem, PathRole, ResultAssertions, TestContext, TestResult, DAY,
};

#[test]
fn test_backup_without_retention() {
    let ctx = TestContext::new();
    let mock = MockExecutor::new();
    let request = ctx.request("tm1srv").build();

    let report = ctx.manager(&mock).run(&request).assert_ok();

    assert_eq!(mock.call_count(), 1);
    let calls = mock.get_calls();
    let call = &calls[0];
    assert_eq!(call.program, ctx.archiver());
    assert_eq!(call.archive_path().as_deref(), Some(report.archive_path.as_path()));
    assert_eq!(call.args.last().map(String::as_str), ctx.source().to_str());

    assert!(report.archive_path.starts_with(ctx.destination()));
    assert!(report.archive_path.is_file());
    assert!(report.archive_size > 0);
    assert!(report.archive_sweep.is_none());
    assert!(report.log_sweep.is_none());
    assert!(report.sweeps_clean());
    assert_eq!(ctx.file_names(ctx.destination()).len(), 1);
}

#[test]
fn test_backup_keeps_newest_archives() -> TestResult {
    let ctx = TestContext::new();
    let existing = populate_archives(
        ctx.destination(),
        "S",
        ArchiveFormat::SevenZip,
        5,
        SystemTime::now(),
    );
    let mock = MockExecutor::new();
    let request = ctx.request("S").keep(2).build();

    let report = ctx.manager(&mock).run(&request)?;

    let sweep = report.archive_sweep.context("archive sweep requested")??;
    assert_eq!(sweep.matched, 6);
    assert_eq!(sweep.removed.len(), 4);
    assert!(sweep.is_clean());

    // The new archive and the most recent of the old ones survive
    assert!(report.archive_path.exists());
    assert!(existing[4].exists());
    assert!(existing[..4].iter().all(|p| !p.exists()));
    assert_eq!(ctx.file_names(ctx.destination()).len(), 2);
    Ok(())
}

#[test]
fn test_archiver_failure_leaves_destination_untouched() {
    let ctx = TestContext::new();
    let existing = populate_archives(
        ctx.destination(),
        "S",
        ArchiveFormat::SevenZip,
        3,
        SystemTime::now(),
    );
    let mock = MockExecutor::new().failing(1, "ERROR: cannot open source");
    let request = ctx.request("S").keep(1).log_days(1).build();
    let old_log = ctx.create_file_aged(ctx.log_dir(), "TM1ProcessError_old.log", DAY * 10);

    let result = ctx.manager(&mock).run(&request);

    match result {
        Err(BackupError::ArchiveExecution { exit_code, stderr }) => {
            assert_eq!(exit_code, Some(1));
            assert!(stderr.contains("cannot open source"));
        }
        other => panic!("Expected ArchiveExecution, got {:?}", other),
    }

    // No sweep ran
    assert!(existing.iter().all(|p| p.exists()));
    assert_eq!(ctx.file_names(ctx.destination()).len(), 3);
    assert!(old_log.exists());
}

#[test]
fn test_backup_sweeps_old_tm1_logs() -> TestResult {
    let ctx = TestContext::new();
    let old = ctx.create_file_aged(ctx.log_dir(), "TM1ProcessError_old.log", DAY * 10);
    let new = ctx.create_file_aged(ctx.log_dir(), "TM1ProcessError_new.log", DAY);
    let unrelated = ctx.create_file_aged(ctx.log_dir(), "tm1server.log", DAY * 10);
    let mock = MockExecutor::new();
    let request = ctx.request("tm1srv").log_days(7).build();

    let report = ctx.manager(&mock).run(&request)?;

    let sweep = report.log_sweep.context("log sweep requested")??;
    assert_eq!(sweep.removed, vec![old.clone()]);
    assert!(!old.exists());
    assert!(new.exists());
    assert!(unrelated.exists());
    assert!(report.archive_sweep.is_none());
    Ok(())
}

#[test]
fn test_missing_archive_is_a_failure() {
    let ctx = TestContext::new();
    populate_archives(ctx.destination(), "S", ArchiveFormat::SevenZip, 3, SystemTime::now());
    let mock = MockExecutor::new().without_archive();
    let request = ctx.request("S").keep(1).build();

    let result = ctx.manager(&mock).run(&request);

    assert!(matches!(result, Err(BackupError::ArchiveVerification { .. })));
    assert_eq!(ctx.file_names(ctx.destination()).len(), 3);
}

#[test]
fn test_empty_archive_still_succeeds() {
    let ctx = TestContext::new();
    let mock = MockExecutor::new().with_response(MockResponse::Success {
        archive: Some(Vec::new()),
    });
    let request = ctx.request("tm1srv").build();

    let report = ctx.manager(&mock).run(&request).assert_ok();

    assert_eq!(report.archive_size, 0);
}

#[test]
fn test_missing_source_stops_before_archiving() {
    let ctx = TestContext::new();
    fs::remove_dir_all(ctx.source()).unwrap();
    let mock = MockExecutor::new();
    let request = ctx.request("tm1srv").build();

    let result = ctx.manager(&mock).run(&request);

    match result {
        Err(BackupError::Precondition { role, problem, .. }) => {
            assert_eq!(role, PathRole::Source);
            assert_eq!(problem, PathProblem::Missing);
        }
        other => panic!("Expected Precondition, got {:?}", other),
    }
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_archiver_must_be_a_file() {
    let ctx = TestContext::new();
    let mock = MockExecutor::new();
    let request = test_utils::BackupRequest::new(
        "tm1srv",
        ctx.source(),
        ctx.destination(),
        ctx.log_dir(),
        ctx.temp_dir(),
    )
    .assert_ok();

    ctx.manager(&mock)
        .run(&request)
        .assert_err_contains("is not a file");
    assert_eq!(mock.call_count(), 0);
}

#[test]
fn test_timeout_is_passed_through_and_reported() {
    let ctx = TestContext::new();
    let mock = MockExecutor::new().with_response(MockResponse::Timeout);
    let request = ctx
        .request("tm1srv")
        .timeout(Duration::from_secs(90))
        .keep(1)
        .build();

    let result = ctx.manager(&mock).run(&request);

    assert!(matches!(result, Err(BackupError::Launch(_))));
    assert_eq!(mock.get_calls()[0].timeout, Some(Duration::from_secs(90)));
    assert!(ctx.file_names(ctx.destination()).is_empty());
}

#[test]
fn test_run_job_uses_prepared_archive_path() -> TestResult {
    let ctx = TestContext::new();
    let mock = MockExecutor::new();
    let request = ctx.request("tm1srv").zip().with_feeders().build();
    let job = ArchiveJob::from_request(&request);

    let report = ctx.manager(&mock).run_job(&request, &job)?;

    assert_eq!(report.archive_path, job.archive_path());
    assert_eq!(report.archive_path.extension().unwrap(), "zip");
    let calls = mock.get_calls();
    let args = &calls[0].args;
    assert!(args.contains(&"-tzip".to_string()));
    assert!(!args.iter().any(|a| a.contains("FEEDERS")));
    Ok(())
}
