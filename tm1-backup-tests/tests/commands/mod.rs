//! Backup run tests for tm1-backup
//!
//! These tests drive complete runs through the backup manager with a mocked
//! archiver.

mod run;
