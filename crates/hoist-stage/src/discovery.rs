use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::function::FunctionEntryPoint;

/// Finds the trigger-bearing methods packaged in the build artifact.
pub trait EntryPointDiscovery {
    fn discover(&self, artifact: &Path) -> Result<Vec<FunctionEntryPoint>, DiscoveryError>;
}

/// Reads entry points from a `functions.toml` manifest emitted at build time.
///
/// ```toml
/// [[function]]
/// name = "Nightly"
/// entry_point = "com.example.Jobs.nightly"
///
/// [[function.binding]]
/// type = "timerTrigger"
/// direction = "in"
/// name = "timer"
/// schedule = "0 0 2 * * *"
/// ```
#[derive(Debug, Clone)]
pub struct ManifestDiscovery {
    manifest: PathBuf,
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(default, rename = "function")]
    functions: Vec<FunctionEntryPoint>,
}

impl ManifestDiscovery {
    pub fn new(manifest: impl Into<PathBuf>) -> Self {
        Self {
            manifest: manifest.into(),
        }
    }
}

impl EntryPointDiscovery for ManifestDiscovery {
    fn discover(&self, artifact: &Path) -> Result<Vec<FunctionEntryPoint>, DiscoveryError> {
        if !self.manifest.exists() {
            tracing::warn!(
                manifest = %self.manifest.display(),
                artifact = %artifact.display(),
                "function manifest not found"
            );
            return Ok(Vec::new());
        }

        let content =
            std::fs::read_to_string(&self.manifest).map_err(|e| DiscoveryError::Read {
                path: self.manifest.clone(),
                source: e,
            })?;
        let manifest: Manifest = toml::from_str(&content).map_err(|e| DiscoveryError::Parse {
            path: self.manifest.clone(),
            source: e,
        })?;

        tracing::debug!(count = manifest.functions.len(), "discovered entry points");
        Ok(manifest.functions)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("failed to read function manifest {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse function manifest {path}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}
