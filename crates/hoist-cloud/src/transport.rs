//! [`ArtifactTransport`] over the `az` CLI.

use std::path::{Path, PathBuf};

use hoist_core::{AppFlavor, AppServiceTarget, ContainerImage};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use time::OffsetDateTime;
use time::macros::format_description;

use crate::control_plane::{AzClient, args};
use crate::executor::AzExecutor;
use crate::publish::{ArtifactTransport, TransportError};

#[derive(Deserialize)]
struct AppSettingEntry {
    name: String,
    #[serde(default)]
    value: Option<String>,
}

impl<E: AzExecutor> AzClient<E> {
    fn run(&self, cmd: &[String]) -> Result<String, TransportError> {
        self.executor
            .exec(cmd)
            .map_err(|e| TransportError::Az { source: e })
    }

    fn run_streaming(&self, cmd: &[String]) -> Result<(), TransportError> {
        self.executor
            .exec_streaming(cmd)
            .map_err(|e| TransportError::Az { source: e })
    }
}

impl<E: AzExecutor> ArtifactTransport for AzClient<E> {
    fn zip_deploy(&self, target: &AppServiceTarget, archive: &Path) -> Result<(), TransportError> {
        let mut cmd = args([cli_group(target), "deployment", "source", "config-zip"]);
        cmd.extend(app_args(target));
        cmd.extend(args(["--src", path_str(archive)?]));
        self.run_streaming(&cmd)
    }

    fn web_deploy(
        &self,
        target: &AppServiceTarget,
        app_name: &str,
        archive: &Path,
    ) -> Result<(), TransportError> {
        let cmd = args([
            "webapp",
            "deploy",
            "--name",
            app_name,
            "--resource-group",
            &target.resource_group,
            "--subscription",
            &target.subscription_id,
            "--src-path",
            path_str(archive)?,
            "--type",
            "zip",
        ]);
        self.run_streaming(&cmd)
    }

    fn upload_file(
        &self,
        target: &AppServiceTarget,
        relative_path: &str,
        file: &Path,
    ) -> Result<(), TransportError> {
        tracing::debug!(file = relative_path, "uploading");
        let target_path = format!("/home/site/wwwroot/{relative_path}");
        let mut cmd = args(["webapp", "deploy"]);
        cmd.extend(app_args(target));
        cmd.extend(args([
            "--src-path",
            path_str(file)?,
            "--type",
            "static",
            "--target-path",
            &target_path,
            "--restart",
            "false",
        ]));
        self.run(&cmd).map(|_| ())
    }

    fn app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
    ) -> Result<Option<SecretString>, TransportError> {
        let mut cmd = args(["webapp", "config", "appsettings", "list"]);
        cmd.extend(app_args(target));
        cmd.extend(args(["--output", "json"]));
        let output = self.run(&cmd)?;

        let entries: Vec<AppSettingEntry> =
            serde_json::from_str(&output).map_err(|e| TransportError::Parse { source: e })?;
        Ok(entries
            .into_iter()
            .find(|entry| entry.name == name)
            .and_then(|entry| entry.value)
            .map(SecretString::from))
    }

    fn set_app_setting(
        &self,
        target: &AppServiceTarget,
        name: &str,
        value: &str,
    ) -> Result<(), TransportError> {
        tracing::info!(app = %target.app_name, setting = name, "updating app setting");
        let setting = format!("{name}={value}");
        let mut cmd = args(["webapp", "config", "appsettings", "set"]);
        cmd.extend(app_args(target));
        cmd.extend(args(["--settings", &setting, "--output", "none"]));
        self.run(&cmd).map(|_| ())
    }

    fn upload_blob(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        file: &Path,
    ) -> Result<(), TransportError> {
        let connection = connection_string.expose_secret();

        // Succeeds (with `created: false`) when the container already exists.
        self.run(&args([
            "storage",
            "container",
            "create",
            "--name",
            container,
            "--connection-string",
            connection,
            "--output",
            "none",
        ]))?;

        self.run(&args([
            "storage",
            "blob",
            "upload",
            "--container-name",
            container,
            "--name",
            blob_name,
            "--file",
            path_str(file)?,
            "--overwrite",
            "--connection-string",
            connection,
            "--output",
            "none",
        ]))
        .map(|_| ())
    }

    fn blob_read_url(
        &self,
        connection_string: &SecretString,
        container: &str,
        blob_name: &str,
        expiry: OffsetDateTime,
    ) -> Result<SecretString, TransportError> {
        let expiry = expiry
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]Z"
            ))
            .map_err(|e| TransportError::Timestamp { source: e })?;

        let output = self.run(&args([
            "storage",
            "blob",
            "generate-sas",
            "--container-name",
            container,
            "--name",
            blob_name,
            "--permissions",
            "r",
            "--expiry",
            &expiry,
            "--https-only",
            "--full-uri",
            "--connection-string",
            connection_string.expose_secret(),
            "--output",
            "tsv",
        ]))?;
        Ok(SecretString::from(output.trim().to_owned()))
    }

    fn set_container_image(
        &self,
        target: &AppServiceTarget,
        image: &ContainerImage,
    ) -> Result<(), TransportError> {
        tracing::info!(app = %target.app_name, image = %image.image, "setting container image");
        let mut cmd = args([cli_group(target), "config", "container", "set"]);
        cmd.extend(app_args(target));

        let (image_flag, server_flag, user_flag, password_flag) = match target.flavor {
            AppFlavor::Function => (
                "--image",
                "--registry-server",
                "--registry-username",
                "--registry-password",
            ),
            AppFlavor::Web => (
                "--container-image-name",
                "--container-registry-url",
                "--container-registry-user",
                "--container-registry-password",
            ),
        };
        cmd.extend(args([image_flag, &image.image]));
        if let Some(registry) = &image.registry {
            cmd.extend(args([
                server_flag,
                &registry.server_url,
                user_flag,
                &registry.username,
                password_flag,
                registry.password.expose_secret(),
            ]));
        }
        self.run(&cmd).map(|_| ())
    }

    fn restart(&self, target: &AppServiceTarget) -> Result<(), TransportError> {
        let mut cmd = args([cli_group(target), "restart"]);
        cmd.extend(app_args(target));
        self.run(&cmd).map(|_| ())
    }
}

// ── Helper ──

/// `az functionapp ...` or `az webapp ...`
fn cli_group(target: &AppServiceTarget) -> &'static str {
    match target.flavor {
        AppFlavor::Function => "functionapp",
        AppFlavor::Web => "webapp",
    }
}

fn app_args(target: &AppServiceTarget) -> Vec<String> {
    args([
        "--name",
        &target.app_name,
        "--resource-group",
        &target.resource_group,
        "--subscription",
        &target.subscription_id,
    ])
}

fn path_str(path: &Path) -> Result<&str, TransportError> {
    path.to_str()
        .ok_or_else(|| TransportError::InvalidPath(PathBuf::from(path)))
}
