//! Artifact publishing: one handler per transport, chosen from a fixed table.

use std::path::{Path, PathBuf};

use hoist_core::project::LOCAL_SETTINGS_JSON;
use hoist_core::{
    AppServiceTarget, ContainerImage, DeploymentDescriptor, DeploymentKind, RuntimeDescriptor,
};
use secrecy::{ExposeSecret, SecretString};
use time::macros::format_description;
use time::{Duration, OffsetDateTime};
use walkdir::WalkDir;

use crate::az::AzError;

/// App setting that makes the host mount a package instead of `wwwroot`.
pub const RUN_FROM_PACKAGE: &str = "WEBSITE_RUN_FROM_PACKAGE";
/// Storage account the functions host already uses.
pub const STORAGE_CONNECTION_SETTING: &str = hoist_core::settings::STORAGE_CONNECTION;
pub const PACKAGE_CONTAINER: &str = "java-functions-run-from-packages";

const PACKAGE_URL_VALIDITY: Duration = Duration::days(3650);

/// Moves bytes to a provisioned app. Handlers decide what to move and in which order.
pub trait ArtifactTransport {
    /// Push an archive through the platform's zip deploy endpoint.
    fn zip_deploy(&self, target: &AppServiceTarget, archive: &Path) -> Result<(), TransportError>;

    /// Web deploy of an archive to the named app.
    fn web_deploy(
        &self,
        target: &AppServiceTarget,
        app_name: &str,
        archive: &Path,
    ) -> Result<(), TransportError>;

    /// Upload one file below `site/wwwroot`.
    fn upload_file(
        &self,
        target: &AppServiceTarget,
        relative_path: &str,
        file: &Path,
    ) -> Result<(), TransportError>;

    fn app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
    ) -> Result<Option<SecretString>, TransportError>;

    fn set_app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
        value: &str,
    ) -> Result<(), TransportError>;

    fn upload_blob(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        file: &Path,
    ) -> Result<(), TransportError>;

    /// Read-only URL (with SAS) for a blob, valid until `expiry`.
    fn blob_read_url(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        expiry: OffsetDateTime,
    ) -> Result<SecretString, TransportError>;

    fn set_container_image(
        &self,
        target: &AppServiceTarget,
        image: &ContainerImage,
    ) -> Result<(), TransportError>;

    fn restart(&self, target: &AppServiceTarget) -> Result<(), TransportError>;
}

impl<T: ArtifactTransport + ?Sized> ArtifactTransport for &T {
    fn zip_deploy(&self, target: &AppServiceTarget, archive: &Path) -> Result<(), TransportError> {
        (**self).zip_deploy(target, archive)
    }

    fn web_deploy(
        &self,
        target: &AppServiceTarget,
        app_name: &str,
        archive: &Path,
    ) -> Result<(), TransportError> {
        (**self).web_deploy(target, app_name, archive)
    }

    fn upload_file(
        &self,
        target: &AppServiceTarget,
        relative_path: &str,
        file: &Path,
    ) -> Result<(), TransportError> {
        (**self).upload_file(target, relative_path, file)
    }

    fn app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
    ) -> Result<Option<SecretString>, TransportError> {
        (**self).app_setting(target, name)
    }

    fn set_app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
        value: &str,
    ) -> Result<(), TransportError> {
        (**self).set_app_setting(target, name, value)
    }

    fn upload_blob(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        file: &Path,
    ) -> Result<(), TransportError> {
        (**self).upload_blob(connection_string, container, blob_name, file)
    }

    fn blob_read_url(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        expiry: OffsetDateTime,
    ) -> Result<SecretString, TransportError> {
        (**self).blob_read_url(connection_string, container, blob_name, expiry)
    }

    fn set_container_image(
        &self,
        target: &AppServiceTarget,
        image: &ContainerImage,
    ) -> Result<(), TransportError> {
        (**self).set_container_image(target, image)
    }

    fn restart(&self, target: &AppServiceTarget) -> Result<(), TransportError> {
        (**self).restart(target)
    }
}

/// One variant per transport, carrying what that transport needs.
#[derive(Debug, Clone)]
pub enum PublishHandler {
    Ftp { staging_dir: PathBuf },
    Zip { archive: PathBuf },
    MsDeploy { app_name: String, archive: PathBuf },
    RunFromBlob { archive: PathBuf },
    RunFromZip { archive: PathBuf },
    Docker { image: ContainerImage },
}

impl PublishHandler {
    /// Dispatch table from transport kind to handler.
    pub fn for_deployment(
        descriptor: &DeploymentDescriptor,
        target: &AppServiceTarget,
        runtime: &RuntimeDescriptor,
    ) -> Result<Self, PublishError> {
        let archive = descriptor.archive_path();
        Ok(match descriptor.kind {
            DeploymentKind::Ftp => Self::Ftp {
                staging_dir: descriptor.staging_dir.clone(),
            },
            DeploymentKind::Zip => Self::Zip { archive },
            DeploymentKind::MsDeploy => Self::MsDeploy {
                app_name: target.app_name.clone(),
                archive,
            },
            DeploymentKind::RunFromBlob => Self::RunFromBlob { archive },
            DeploymentKind::RunFromZip => Self::RunFromZip { archive },
            DeploymentKind::Docker => Self::Docker {
                image: runtime
                    .container()
                    .cloned()
                    .ok_or(PublishError::MissingContainerImage)?,
            },
        })
    }

    pub fn kind(&self) -> DeploymentKind {
        match self {
            Self::Ftp { .. } => DeploymentKind::Ftp,
            Self::Zip { .. } => DeploymentKind::Zip,
            Self::MsDeploy { .. } => DeploymentKind::MsDeploy,
            Self::RunFromBlob { .. } => DeploymentKind::RunFromBlob,
            Self::RunFromZip { .. } => DeploymentKind::RunFromZip,
            Self::Docker { .. } => DeploymentKind::Docker,
        }
    }

    pub fn publish<T: ArtifactTransport + ?Sized>(
        &self,
        transport: &T,
        target: &AppServiceTarget,
    ) -> Result<(), PublishError> {
        let kind = self.kind();
        let transport_err = |e| PublishError::Transport { kind, source: e };

        match self {
            Self::Ftp { staging_dir } => {
                let files = wwwroot_files(staging_dir)?;
                tracing::info!(files = files.len(), "uploading files");
                for (relative_path, file) in &files {
                    transport
                        .upload_file(target, relative_path, file)
                        .map_err(transport_err)?;
                }
            }
            Self::Zip { archive } => {
                require_archive(archive)?;
                transport.zip_deploy(target, archive).map_err(transport_err)?;
            }
            Self::MsDeploy { app_name, archive } => {
                require_archive(archive)?;
                transport
                    .web_deploy(target, app_name, archive)
                    .map_err(transport_err)?;
            }
            Self::RunFromZip { archive } => {
                require_archive(archive)?;
                transport
                    .set_app_setting(target, RUN_FROM_PACKAGE, "1")
                    .map_err(transport_err)?;
                transport.zip_deploy(target, archive).map_err(transport_err)?;
            }
            Self::RunFromBlob { archive } => {
                require_archive(archive)?;
                let connection = transport
                    .app_setting(target, STORAGE_CONNECTION_SETTING)
                    .map_err(transport_err)?
                    .ok_or_else(|| PublishError::MissingStorageConnection {
                        app: target.app_name.clone(),
                    })?;

                let now = OffsetDateTime::now_utc();
                let blob_name = package_blob_name(&target.app_name, now)?;
                transport
                    .upload_blob(&connection, PACKAGE_CONTAINER, &blob_name, archive)
                    .map_err(transport_err)?;
                let url = transport
                    .blob_read_url(
                        &connection,
                        PACKAGE_CONTAINER,
                        &blob_name,
                        now + PACKAGE_URL_VALIDITY,
                    )
                    .map_err(transport_err)?;
                transport
                    .set_app_setting(target, RUN_FROM_PACKAGE, url.expose_secret())
                    .map_err(transport_err)?;
                tracing::info!(container = PACKAGE_CONTAINER, blob = %blob_name, "package uploaded");
            }
            Self::Docker { image } => {
                transport
                    .set_container_image(target, image)
                    .map_err(transport_err)?;
                transport.restart(target).map_err(transport_err)?;
            }
        }
        Ok(())
    }
}

/// Publishes the artifact with the handler the deployment kind selects.
pub struct ArtifactPublisher<T> {
    transport: T,
}

impl<T: ArtifactTransport> ArtifactPublisher<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn publish(
        &self,
        target: &AppServiceTarget,
        runtime: &RuntimeDescriptor,
        descriptor: &DeploymentDescriptor,
    ) -> Result<(), PublishError> {
        let handler = PublishHandler::for_deployment(descriptor, target, runtime)?;
        tracing::info!(app = %target.app_name, transport = %descriptor.kind, "publishing artifact");
        handler.publish(&self.transport, target)?;
        tracing::info!(app = %target.app_name, "artifact published");
        Ok(())
    }
}

fn require_archive(archive: &Path) -> Result<(), PublishError> {
    if archive.is_file() {
        Ok(())
    } else {
        Err(PublishError::ArchiveMissing(archive.to_path_buf()))
    }
}

/// `<app>-<utc timestamp>.zip`, unique per publish.
fn package_blob_name(app_name: &str, now: OffsetDateTime) -> Result<String, PublishError> {
    let stamp = now
        .format(format_description!(
            "[year][month][day][hour][minute][second]"
        ))
        .map_err(|e| PublishError::Timestamp { source: e })?;
    Ok(format!("{app_name}-{stamp}.zip"))
}

/// Every staged file with its `/`-separated path relative to the staging root.
fn wwwroot_files(staging_dir: &Path) -> Result<Vec<(String, PathBuf)>, PublishError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(staging_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| PublishError::Walk { source: e })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path
            .strip_prefix(staging_dir)
            .map_err(|_| PublishError::OutsideStaging(path.to_path_buf()))?;
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if relative == LOCAL_SETTINGS_JSON {
            continue;
        }
        files.push((relative, path.to_path_buf()));
    }
    Ok(files)
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("path is not valid UTF-8: {0}")]
    InvalidPath(PathBuf),

    #[error("az command failed")]
    Az { source: AzError },

    #[error("unexpected az output")]
    Parse { source: serde_json::Error },

    #[error("failed to format expiry timestamp")]
    Timestamp { source: time::error::Format },
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("{kind} publish failed")]
    Transport {
        kind: DeploymentKind,
        source: TransportError,
    },

    #[error("archive {0} not found (package the staging directory first)")]
    ArchiveMissing(PathBuf),

    #[error("docker deployment requires a container image")]
    MissingContainerImage,

    #[error("app '{app}' has no AzureWebJobsStorage setting to upload the package to")]
    MissingStorageConnection { app: String },

    #[error("failed to walk staging directory")]
    Walk { source: walkdir::Error },

    #[error("{0} is outside the staging directory")]
    OutsideStaging(PathBuf),

    #[error("failed to format package timestamp")]
    Timestamp { source: time::error::Format },
}
