//! SafeCommandExecutor: whitelisted execution of external sync tools
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only pre-approved executables can run,
//!   matched on the executable's file name so vendored copies
//!   (e.g. `/opt/tools/s3cmd/s3cmd`) are accepted
//! - **Injection prevention**: Arguments are passed as a vector, never
//!   interpolated into a shell string
//! - **Working directory validation**: Validates existence before execution
//! - **Timeout control**: Long-running processes are killed
//!
//! # Example
//!
//! ```rust,no_run
//! use doc_publisher::SafeCommandExecutor;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), doc_publisher::CommandError> {
//! let mut executor = SafeCommandExecutor::new(std::env::temp_dir())?;
//! executor.set_timeout(Duration::from_secs(600));
//!
//! let output = executor.execute("s3cmd", &["--version"]).await?;
//! println!("{}", String::from_utf8_lossy(&output.stdout));
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Executables the publisher is allowed to run.
const ALLOWED_COMMANDS: &[&str] = &["s3cmd"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),

    /// Command exceeded the timeout duration
    #[error("Command timeout after {0:?}")]
    Timeout(Duration),
}

/// Safe command executor with security controls
#[derive(Debug, Clone)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
    /// Optional timeout for command execution
    timeout: Option<Duration>,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.exists() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self {
            working_dir,
            timeout: None,
        })
    }

    /// Set command execution timeout.
    ///
    /// Commands exceeding this duration will be terminated.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(timeout);
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Check whether `command` names a whitelisted executable
    pub fn is_allowed(command: &str) -> bool {
        Path::new(command)
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| ALLOWED_COMMANDS.contains(&name))
    }

    /// Execute a command with whitelist validation and argument sanitization.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    /// - `CommandError::Timeout` - The process ran past the configured timeout
    ///   and was killed
    pub async fn execute(&self, command: &str, args: &[&str]) -> Result<Output, CommandError> {
        if !Self::is_allowed(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        let mut child = Command::new(command);
        child
            .args(args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let output = child.output();

        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output)
                .await
                .map_err(|_| CommandError::Timeout(timeout))?,
            None => output.await,
        };

        result.map_err(|e| CommandError::ExecutionFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_dir() -> PathBuf {
        std::env::temp_dir()
    }

    #[test]
    fn test_allowed_command_by_file_name() {
        assert!(SafeCommandExecutor::is_allowed("s3cmd"));
        assert!(SafeCommandExecutor::is_allowed("/opt/tools/s3cmd/s3cmd"));
        assert!(!SafeCommandExecutor::is_allowed("/opt/tools/s3cmd/rm"));
        assert!(!SafeCommandExecutor::is_allowed(""));
    }

    #[tokio::test]
    async fn test_rejected_command_rm() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("rm", &["-rf", "/"]).await;
        assert!(
            matches!(result, Err(CommandError::CommandNotAllowed(_))),
            "rm should be rejected as not in whitelist"
        );
    }

    #[tokio::test]
    async fn test_shell_is_rejected() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor.execute("sh", &["-c", "s3cmd sync; rm -rf /"]).await;
        assert!(matches!(result, Err(CommandError::CommandNotAllowed(_))));
    }

    #[test]
    fn test_invalid_working_directory() {
        let result = SafeCommandExecutor::new("/nonexistent/directory/that/does/not/exist");
        assert!(
            matches!(result, Err(CommandError::InvalidWorkingDirectory(_))),
            "Should reject non-existent working directory"
        );
    }

    #[tokio::test]
    async fn test_missing_binary_is_execution_failure() {
        let executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        let result = executor
            .execute("/nonexistent/tools/s3cmd", &["--version"])
            .await;
        assert!(matches!(result, Err(CommandError::ExecutionFailed(_))));
    }

    #[test]
    fn test_set_timeout() {
        let mut executor = SafeCommandExecutor::new(get_test_dir()).unwrap();
        assert_eq!(executor.timeout(), None);

        executor.set_timeout(Duration::from_secs(30));
        assert_eq!(executor.timeout(), Some(Duration::from_secs(30)));
    }
}
