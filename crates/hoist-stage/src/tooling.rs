//! Local companion tooling: Azure Functions Core Tools (`func`) and the JDK.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use hoist_core::JavaVersion;

use crate::extension::{ExtensionError, ExtensionInstaller};

/// Azure Functions Core Tools, resolved on `PATH`.
#[derive(Debug, Clone)]
pub struct FuncCli {
    binary: PathBuf,
}

impl FuncCli {
    /// Locate `func` on `PATH`.
    pub fn locate() -> Result<Self, ToolingError> {
        let binary =
            which::which("func").map_err(|e| ToolingError::FuncNotFound { source: e })?;
        tracing::debug!(path = %binary.display(), "found func");
        Ok(Self { binary })
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Start the functions host on the staged directory, streaming its output.
    pub fn host_start(&self, staging_dir: &Path) -> Result<(), ToolingError> {
        let status = Command::new(&self.binary)
            .args(["host", "start"])
            .current_dir(staging_dir)
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|e| ToolingError::Spawn { source: e })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolingError::HostExited {
                detail: status.to_string(),
            })
        }
    }
}

impl ExtensionInstaller for FuncCli {
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> Result<(), ExtensionError> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["extensions", "install", "--java"]).current_dir(staging_dir);

        // A project-level extensions.csproj pins extension versions.
        if base_dir.join("extensions.csproj").is_file() {
            cmd.arg("--configPath").arg(base_dir);
        }

        tracing::info!(staging = %staging_dir.display(), "installing binding extensions");
        let output = cmd.output().map_err(|e| ExtensionError::Spawn { source: e })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtensionError::InstallFailed {
                detail: format!(
                    "func extensions install exited with {}: {}",
                    output.status,
                    stderr.trim()
                ),
            });
        }
        Ok(())
    }
}

/// Locates `func` only when an install is actually needed, so HTTP-only
/// and bundled projects stage without Core Tools on `PATH`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnDemandFuncCli;

impl ExtensionInstaller for OnDemandFuncCli {
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> Result<(), ExtensionError> {
        FuncCli::locate()
            .map_err(|e| ExtensionError::Unavailable { source: e })?
            .install(staging_dir, base_dir)
    }
}

/// Result of comparing the local JDK with the configured runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaCheck {
    Matches,
    Mismatch { local_major: u32 },
    Unavailable,
}

/// Compare `java -version` against the configured runtime.
///
/// A mismatch is only worth a warning: the app runs on the remote JDK.
pub fn check_local_java(expected: JavaVersion) -> JavaCheck {
    let output = match Command::new("java").arg("-version").output() {
        Ok(output) if output.status.success() => output,
        Ok(output) => {
            tracing::debug!(status = %output.status, "java -version failed");
            return JavaCheck::Unavailable;
        }
        Err(e) => {
            tracing::debug!(error = %e, "java not runnable");
            return JavaCheck::Unavailable;
        }
    };
    // `java -version` prints to stderr.
    let text = String::from_utf8_lossy(&output.stderr);
    match parse_java_major(&text) {
        Some(major) if major == expected.major() => JavaCheck::Matches,
        Some(local_major) => JavaCheck::Mismatch { local_major },
        None => JavaCheck::Unavailable,
    }
}

/// Extract the major version from `java -version` output.
///
/// Handles both `1.8.0_392` and `17.0.9` styles.
pub fn parse_java_major(output: &str) -> Option<u32> {
    let start = output.find('"')? + 1;
    let rest = &output[start..];
    let version = &rest[..rest.find('"')?];
    let mut parts = version.split(['.', '_', '-', '+']).map(str::parse::<u32>);
    // arch-lint: allow(no-silent-result-drop) reason="unparsable version output means the check is skipped"
    let first = parts.next()?.ok()?;
    if first == 1 {
        // arch-lint: allow(no-silent-result-drop) reason="unparsable version output means the check is skipped"
        parts.next()?.ok()
    } else {
        Some(first)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolingError {
    #[error(
        "Azure Functions Core Tools (func) not found (install: https://learn.microsoft.com/azure/azure-functions/functions-run-local)"
    )]
    FuncNotFound { source: which::Error },
    #[error("failed to start func")]
    Spawn { source: std::io::Error },
    #[error("functions host exited: {detail}")]
    HostExited { detail: String },
}
