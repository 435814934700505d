use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::runtime::OperatingSystem;
use crate::{Error, Result};

/// Transport used to push the built artifact into the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeploymentKind {
    /// File-by-file upload into `site/wwwroot`.
    Ftp,
    /// Zip deploy of the staging archive.
    Zip,
    /// Web deploy of the staging archive, addressed by app name.
    MsDeploy,
    /// Archive uploaded to blob storage and mounted via `WEBSITE_RUN_FROM_PACKAGE=<url>`.
    RunFromBlob,
    /// Archive zip-deployed and mounted via `WEBSITE_RUN_FROM_PACKAGE=1`.
    RunFromZip,
    /// Container image already pushed to a registry.
    Docker,
}

impl DeploymentKind {
    pub const ALL: [DeploymentKind; 6] = [
        Self::Ftp,
        Self::Zip,
        Self::MsDeploy,
        Self::RunFromBlob,
        Self::RunFromZip,
        Self::Docker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ftp => "ftp",
            Self::Zip => "zip",
            Self::MsDeploy => "msdeploy",
            Self::RunFromBlob => "run_from_blob",
            Self::RunFromZip => "run_from_zip",
            Self::Docker => "docker",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|k| k.as_str()).collect()
    }

    /// Whether the handler uploads through the app's own storage account.
    pub fn needs_storage_connection(self) -> bool {
        self == Self::RunFromBlob
    }

    /// Whether the handler needs an archive of the staging directory.
    pub fn needs_archive(self) -> bool {
        matches!(
            self,
            Self::Zip | Self::MsDeploy | Self::RunFromBlob | Self::RunFromZip
        )
    }
}

impl FromStr for DeploymentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .ok_or_else(|| Error::UnknownDeploymentType(s.to_owned()))
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved transport plus the directory it publishes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentDescriptor {
    pub kind: DeploymentKind,
    pub staging_dir: PathBuf,
}

impl DeploymentDescriptor {
    /// Zip of the staging directory used by the archive-based transports.
    pub fn archive_path(&self) -> PathBuf {
        archive_path_for(&self.staging_dir)
    }
}

/// `<staging_dir>.zip`, next to the staging directory.
pub fn archive_path_for(staging_dir: &Path) -> PathBuf {
    let mut name = staging_dir.as_os_str().to_owned();
    name.push(".zip");
    PathBuf::from(name)
}

/// Decide which transport applies.
///
/// An explicit override always wins when it names a known transport.
/// Otherwise Docker maps to the container image transport, Linux on a
/// consumption plan (no pricing tier) runs from a blob package, and every
/// other combination runs from a zip package.
///
/// # Examples
///
/// ```
/// use hoist_core::{resolve_deployment_kind, DeploymentKind, OperatingSystem};
///
/// let kind = resolve_deployment_kind(None, OperatingSystem::Linux, false).unwrap();
/// assert_eq!(kind, DeploymentKind::RunFromBlob);
/// ```
pub fn resolve_deployment_kind(
    explicit_override: Option<&str>,
    os: OperatingSystem,
    pricing_tier_specified: bool,
) -> Result<DeploymentKind> {
    if let Some(raw) = explicit_override.filter(|s| !s.trim().is_empty()) {
        return raw.parse();
    }

    Ok(match os {
        OperatingSystem::Docker => DeploymentKind::Docker,
        OperatingSystem::Linux if !pricing_tier_specified => DeploymentKind::RunFromBlob,
        OperatingSystem::Linux | OperatingSystem::Windows => DeploymentKind::RunFromZip,
    })
}
