//! Process invocation capability
//!
//! Everything that shells out goes through [`CommandRunner`] so the pipeline
//! can run against fakes in tests.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

/// Captured result of a finished process
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// Exit code; `None` when the process was terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to execute {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },

    #[error("Expected output file not found: {}", .0.display())]
    MissingOutput(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessError {
    /// Build a `Failed` error from a non-successful output
    pub fn failed(program: &str, output: &CommandOutput) -> Self {
        let status = match output.code {
            Some(code) => code.to_string(),
            None => "signal".to_string(),
        };
        ProcessError::Failed {
            program: program.to_string(),
            status,
            stderr: output.stderr_lossy().trim().to_string(),
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` to completion and capture its output.
    ///
    /// A non-zero exit is not an error here; callers decide.
    async fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError>;
}

/// Runs real processes via `tokio::process`
///
/// Children are killed if the awaiting future is dropped, so cancelling a job
/// also stops its renderer.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, ProcessError> {
        let start = std::time::Instant::now();

        let output = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ProcessError::Launch {
                program: program.to_string(),
                source,
            })?;

        tracing::debug!(
            program = %program,
            exit_code = ?output.status.code(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Process finished"
        );

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
