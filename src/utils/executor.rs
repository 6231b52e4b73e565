//! Command execution abstraction for testability
//!
//! The orchestrator talks to the archiver through [`CommandExecutor`], so
//! tests can substitute a mock that never spawns a process.

use super::command::{CommandError, CommandOutput};
use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

/// Abstraction for command execution, enabling mocking in tests
pub trait CommandExecutor: Send + Sync {
    /// Run `program` to completion and report how it exited
    fn run_command(
        &self,
        program: &Path,
        args: &[OsString],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError>;
}

/// Default implementation using real subprocess calls
#[derive(Debug, Clone, Default)]
pub struct RealExecutor;

impl RealExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for RealExecutor {
    fn run_command(
        &self,
        program: &Path,
        args: &[OsString],
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, CommandError> {
        super::command::run_command(program, args, timeout)
    }
}

/// A mock executor for testing that records calls and returns configured responses
/// Available for use in external test crates
pub mod mock {
    use super::*;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    /// Recorded command invocation
    #[derive(Clone, Debug)]
    pub struct CommandCall {
        pub program: PathBuf,
        pub args: Vec<String>,
        pub timeout: Option<Duration>,
    }

    impl CommandCall {
        /// The archive path, i.e. the argument following the `a` operation
        pub fn archive_path(&self) -> Option<PathBuf> {
            self.args
                .iter()
                .position(|a| a == "a")
                .and_then(|i| self.args.get(i + 1))
                .map(PathBuf::from)
        }
    }

    /// Response configuration for mock
    #[derive(Clone, Debug)]
    pub enum MockResponse {
        /// Exit 0, writing `archive` (if any) to the archive path like 7-Zip would
        Success { archive: Option<Vec<u8>> },
        /// Exit with the given non-zero code and diagnostic text
        Failure { stderr: String, exit_code: i32 },
        Timeout,
    }

    impl Default for MockResponse {
        fn default() -> Self {
            MockResponse::Success {
                archive: Some(b"7z\xbc\xaf\x27\x1c".to_vec()),
            }
        }
    }

    /// Mock executor for testing
    #[derive(Clone, Default)]
    pub struct MockExecutor {
        /// Recorded command invocations
        pub calls: Arc<Mutex<Vec<CommandCall>>>,
        response: Arc<Mutex<MockResponse>>,
    }

    impl MockExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        /// Set the response returned for every call
        pub fn with_response(self, response: MockResponse) -> Self {
            *self.response.lock().unwrap() = response;
            self
        }

        /// Exit 0 without producing an archive
        pub fn without_archive(self) -> Self {
            self.with_response(MockResponse::Success { archive: None })
        }

        /// Exit with `exit_code` and `stderr`
        pub fn failing(self, exit_code: i32, stderr: &str) -> Self {
            self.with_response(MockResponse::Failure {
                stderr: stderr.to_string(),
                exit_code,
            })
        }

        /// Get all recorded calls
        pub fn get_calls(&self) -> Vec<CommandCall> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }

        fn record_call(&self, program: &Path, args: &[OsString], timeout: Option<Duration>) -> CommandCall {
            let call = CommandCall {
                program: program.to_path_buf(),
                args: args.iter().map(|a| a.to_string_lossy().into_owned()).collect(),
                timeout,
            };
            self.calls.lock().unwrap().push(call.clone());
            call
        }
    }

    impl CommandExecutor for MockExecutor {
        fn run_command(
            &self,
            program: &Path,
            args: &[OsString],
            timeout: Option<Duration>,
        ) -> Result<CommandOutput, CommandError> {
            let call = self.record_call(program, args, timeout);
            let response = self.response.lock().unwrap().clone();

            match response {
                MockResponse::Success { archive } => {
                    if let (Some(bytes), Some(path)) = (archive, call.archive_path()) {
                        std::fs::write(&path, bytes).map_err(|source| CommandError::Spawn {
                            program: program.display().to_string(),
                            source,
                        })?;
                    }
                    Ok(CommandOutput {
                        exit_code: Some(0),
                        stdout: "Everything is Ok".to_string(),
                        stderr: String::new(),
                    })
                }
                MockResponse::Failure { stderr, exit_code } => Ok(CommandOutput {
                    exit_code: Some(exit_code),
                    stdout: String::new(),
                    stderr,
                }),
                MockResponse::Timeout => Err(CommandError::TimedOut {
                    program: program.display().to_string(),
                    timeout: timeout.unwrap_or_default(),
                }),
            }
        }
    }
}
