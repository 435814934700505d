use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::function::BindingKind;

pub const HOST_JSON: &str = "host.json";

/// First-party bundle that ships every binding extension.
pub const EXTENSION_BUNDLE_ID: &str = "Microsoft.Azure.Functions.ExtensionBundle";

/// The parts of `host.json` hoist cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostManifest {
    #[serde(default)]
    pub extension_bundle: Option<ExtensionBundle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExtensionBundle {
    pub id: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl HostManifest {
    pub fn load(path: &Path) -> Result<Self, ExtensionError> {
        let content = std::fs::read_to_string(path).map_err(|e| ExtensionError::ReadHost {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| ExtensionError::ParseHost {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn declares_first_party_bundle(&self) -> bool {
        self.extension_bundle
            .as_ref()
            .is_some_and(|b| b.id == EXTENSION_BUNDLE_ID)
    }
}

/// Whether binding extensions must be installed next to the staged functions.
///
/// Not needed when `host.json` already pulls in the first-party bundle, or
/// when every binding is HTTP (served by the host without extensions).
pub fn is_install_extension_needed<'a>(
    host: &HostManifest,
    bindings: impl IntoIterator<Item = &'a BindingKind>,
) -> bool {
    if host.declares_first_party_bundle() {
        tracing::info!("extension bundle declared in host.json, skipping extension install");
        return false;
    }

    if bindings.into_iter().all(BindingKind::is_http) {
        tracing::info!("only HTTP bindings found, skipping extension install");
        return false;
    }
    true
}

/// Installs binding extensions into the staging directory.
pub trait ExtensionInstaller {
    fn install(&self, staging_dir: &Path, base_dir: &Path) -> Result<(), ExtensionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    #[error("failed to read {path}")]
    ReadHost {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}")]
    ParseHost {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("extension install failed: {detail}")]
    InstallFailed { detail: String },
    #[error("failed to run extension installer")]
    Spawn { source: std::io::Error },
    #[error("extension installer is not available")]
    Unavailable {
        source: crate::tooling::ToolingError,
    },
}
