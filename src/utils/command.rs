//! Running external programs with captured output and an optional timeout

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use tracing::debug;

/// Windows `CREATE_NO_WINDOW` process creation flag
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Failed to execute {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout:?}")]
    TimedOut { program: String, timeout: Duration },
}

/// Result of a finished child process.
///
/// Exit status interpretation is left to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Run a program to completion, optionally bounded by `timeout`
pub fn run_command(
    program: &Path,
    args: &[OsString],
    timeout: Option<Duration>,
) -> Result<CommandOutput, CommandError> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        cmd.creation_flags(CREATE_NO_WINDOW);
    }

    debug!(
        "Running command: {} {}",
        program.display(),
        args.iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    );

    let spawn_error = |source| CommandError::Spawn {
        program: program.display().to_string(),
        source,
    };

    let output = if let Some(timeout_duration) = timeout {
        // The child is killed when the timed-out future drops it
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(spawn_error)?;

        runtime.block_on(async {
            let mut child = tokio::process::Command::from(cmd);
            child.kill_on_drop(true);

            match tokio::time::timeout(timeout_duration, child.output()).await {
                Ok(output) => output.map_err(spawn_error),
                Err(_) => Err(CommandError::TimedOut {
                    program: program.display().to_string(),
                    timeout: timeout_duration,
                }),
            }
        })?
    } else {
        cmd.output().map_err(spawn_error)?
    };

    let output = CommandOutput::from(output);
    if !output.stdout.is_empty() {
        debug!("Command output: {}", output.stdout.trim_end());
    }

    Ok(output)
}
