//! Script execution
//!
//! Runs the configured command through a shell inside the request's download
//! directory. Output is captured to `stdout` and `stderr` files next to the
//! payloads so it survives the process and can be collected later.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use thiserror::Error;

#[cfg(any(test, feature = "testing"))]
use mockall::automock;

pub const STDOUT_FILE: &str = "stdout";
pub const STDERR_FILE: &str = "stderr";

#[derive(Debug, Clone, PartialEq)]
pub struct ScriptOutput {
    pub status_code: i32,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
}

impl ScriptOutput {
    pub fn success(&self) -> bool {
        self.status_code == 0
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to capture output in {path}: {source}")]
    Capture {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to start {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
    #[error("command exited with status {code}")]
    NonZeroExit { code: i32 },
}

/// Trait for running the user's command
#[cfg_attr(any(test, feature = "testing"), automock)]
pub trait ScriptExecutor {
    fn run(&self, command: &str, work_dir: &Path) -> Result<ScriptOutput, ScriptError>;
}

/// Runs commands with `<shell> -c`
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: String,
}

impl ShellExecutor {
    pub fn new(shell: &str) -> Self {
        Self {
            shell: shell.to_string(),
        }
    }
}

fn capture_file(path: &Path) -> Result<File, ScriptError> {
    File::create(path).map_err(|source| ScriptError::Capture {
        path: path.to_path_buf(),
        source,
    })
}

impl ScriptExecutor for ShellExecutor {
    fn run(&self, command: &str, work_dir: &Path) -> Result<ScriptOutput, ScriptError> {
        let stdout_path = work_dir.join(STDOUT_FILE);
        let stderr_path = work_dir.join(STDERR_FILE);

        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(capture_file(&stdout_path)?)
            .stderr(capture_file(&stderr_path)?)
            .status()
            .map_err(|source| ScriptError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        Ok(ScriptOutput {
            // Killed by a signal
            status_code: status.code().unwrap_or(-1),
            stdout_path,
            stderr_path,
        })
    }
}
