use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::target::AppFlavor;

pub const CONFIG_FILE: &str = "hoist.toml";

/// Environment variable holding the private registry password.
pub const REGISTRY_PASSWORD_ENV: &str = "HOIST_REGISTRY_PASSWORD";

/// hoist.toml configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoistConfig {
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    /// User app settings, applied in declaration order.
    #[serde(default)]
    pub app_settings: IndexMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// App name (globally unique host name prefix)
    pub name: Option<String>,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    /// Azure region (defaults to westeurope)
    #[serde(default = "default_region")]
    pub region: String,
    /// Hosting plan SKU, e.g. `EP1` or `P1v2`. Omit for a consumption plan.
    pub pricing_tier: Option<String>,
    /// Hosting plan name (defaults to `<name>-plan`)
    pub plan_name: Option<String>,
    /// Resource group of the hosting plan (defaults to `resource_group`)
    pub plan_resource_group: Option<String>,
    #[serde(default)]
    pub flavor: AppFlavor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// windows | linux | docker (defaults to windows)
    pub os: Option<String>,
    /// 8 | 11 | 17 | 21 (defaults to 17)
    pub java_version: Option<String>,
    /// Web apps only, e.g. `Java SE` or `Tomcat 10.0`
    pub web_container: Option<String>,
    /// Docker only: image reference
    pub image: Option<String>,
    pub registry_url: Option<String>,
    pub registry_username: Option<String>,
    /// Read from [`REGISTRY_PASSWORD_ENV`], never from the file.
    #[serde(skip)]
    pub registry_password: Option<SecretString>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentConfig {
    /// Explicit transport override (ftp, zip, msdeploy, run_from_blob, run_from_zip, docker)
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Staging directory (defaults to `.hoist/staging/<app name>`)
    pub staging_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Primary build artifact. When omitted the single jar in `target/` is used.
    pub artifact: Option<PathBuf>,
    /// Directory holding dependency jars
    #[serde(default = "default_dependencies_dir")]
    pub dependencies: PathBuf,
    /// Function entry-point manifest
    #[serde(default = "default_functions_manifest")]
    pub functions_manifest: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: None,
            subscription_id: None,
            resource_group: None,
            region: default_region(),
            pricing_tier: None,
            plan_name: None,
            plan_resource_group: None,
            flavor: AppFlavor::default(),
        }
    }
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            artifact: None,
            dependencies: default_dependencies_dir(),
            functions_manifest: default_functions_manifest(),
        }
    }
}

impl HoistConfig {
    /// Load from hoist.toml at the given path, or return defaults if not found.
    ///
    /// The registry password is taken from `HOIST_REGISTRY_PASSWORD` when set.
    pub fn load(project_dir: &Path) -> crate::Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        let mut config: Self = if config_path.exists() {
            let content =
                std::fs::read_to_string(&config_path).map_err(|e| crate::Error::ConfigLoad {
                    path: config_path.clone(),
                    source: e,
                })?;
            toml::from_str(&content).map_err(|e| crate::Error::ConfigParse {
                path: config_path,
                source: e,
            })?
        } else {
            tracing::debug!(dir = %project_dir.display(), "no hoist.toml, using defaults");
            Self::default()
        };

        config.runtime.registry_password = std::env::var(REGISTRY_PASSWORD_ENV)
            // arch-lint: allow(no-silent-result-drop) reason="an unset password means the registry is public"
            .ok()
            .filter(|p| !p.is_empty())
            .map(SecretString::from);

        Ok(config)
    }
}

fn default_region() -> String {
    "westeurope".to_owned()
}

fn default_dependencies_dir() -> PathBuf {
    PathBuf::from("target/lib")
}

fn default_functions_manifest() -> PathBuf {
    PathBuf::from("functions.toml")
}
