//! Test utilities for tm1-backup
//!
//! This crate provides shared test utilities, fixtures and helper functions
//! for testing backup runs and retention sweeps.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use test_utils::{MockExecutor, TestContext};
//!
//! #[test]
//! fn my_test() {
//!     let ctx = TestContext::new();
//!     let request = ctx.request("tm1srv").build();
//!     // ... test code
//! }
//! ```

pub mod fixtures;
pub mod test_context;

// Re-export commonly used items
pub use fixtures::*;
pub use test_context::{RequestBuilder, ResultAssertions, TestContext};

// Re-export types from the main crate for convenience
pub use tm1_backup::config::{ArchiveFormat, BackupRequest, Settings};
pub use tm1_backup::managers::backup::{BackupError, BackupManager, BackupReport, PathProblem, PathRole};
pub use tm1_backup::managers::retention::SweepReport;
pub use tm1_backup::utils::archive::ArchiveJob;

// Re-export mock implementations from the main crate
pub use tm1_backup::utils::executor::mock::{CommandCall, MockExecutor, MockResponse};
pub use tm1_backup::utils::executor::CommandExecutor;

/// Common test result type
pub type TestResult<T = ()> = anyhow::Result<T>;
