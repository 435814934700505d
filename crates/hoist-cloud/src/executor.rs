use std::process::{Command, Stdio};
use std::rc::Rc;

use crate::az::AzError;

/// Abstraction over `az` CLI execution for testability.
///
/// Production code uses [`RealExecutor`], tests use mockall-generated mocks.
/// Every call blocks until the child process exits.
pub trait AzExecutor {
    /// Execute an az command and capture stdout.
    fn exec(&self, args: &[String]) -> Result<String, AzError>;

    /// Execute an az command, streaming output to the terminal.
    fn exec_streaming(&self, args: &[String]) -> Result<(), AzError>;
}

impl<E: AzExecutor + ?Sized> AzExecutor for Rc<E> {
    fn exec(&self, args: &[String]) -> Result<String, AzError> {
        (**self).exec(args)
    }

    fn exec_streaming(&self, args: &[String]) -> Result<(), AzError> {
        (**self).exec_streaming(args)
    }
}

/// Real az CLI executor.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealExecutor;

impl AzExecutor for RealExecutor {
    fn exec(&self, args: &[String]) -> Result<String, AzError> {
        tracing::debug!(command = ?crate::az::redact_args(args), "az");
        let output = Command::new("az")
            .args(args)
            .arg("--only-show-errors")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| AzError::NotFound { source: e })?;

        if output.status.success() {
            String::from_utf8(output.stdout).map_err(|e| AzError::InvalidUtf8 { source: e })
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            Err(AzError::command_failed(args, stderr))
        }
    }

    fn exec_streaming(&self, args: &[String]) -> Result<(), AzError> {
        tracing::debug!(command = ?crate::az::redact_args(args), "az (streaming)");
        let status = Command::new("az")
            .args(args)
            .arg("--only-show-errors")
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| AzError::NotFound { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(AzError::command_failed(args, format!("exit code: {status}")))
        }
    }
}
