//! ARM resource shapes: the request bodies hoist sends and the handles it reads back.

use std::fmt;

use hoist_core::{
    AppFlavor, AppServiceTarget, AppSettingsMap, ContainerImage, OperatingSystem, PricingTier,
    Region, RuntimeDescriptor, RuntimeStack, WebContainer,
};
use indexmap::IndexMap;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::{Map, Value, json};

pub const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";
pub const WEB_API_VERSION: &str = "2022-09-01";

// ── Resource ids ──

pub fn resource_group_id(subscription_id: &str, name: &str) -> String {
    format!("/subscriptions/{subscription_id}/resourcegroups/{name}")
}

pub fn plan_id(target: &AppServiceTarget) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/serverfarms/{}",
        target.subscription_id, target.plan_resource_group, target.plan_name
    )
}

pub fn app_id(target: &AppServiceTarget) -> String {
    format!(
        "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/sites/{}",
        target.subscription_id, target.resource_group, target.app_name
    )
}

// ── Handles ──

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceGroup {
    pub id: String,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Sku {
    pub name: String,
    #[serde(default)]
    pub tier: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PlanProperties {
    /// `true` for Linux plans
    #[serde(default)]
    pub reserved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostingPlan {
    pub id: String,
    pub name: String,
    pub location: String,
    pub sku: Sku,
    #[serde(default)]
    pub properties: PlanProperties,
}

impl HostingPlan {
    pub fn has_size(&self, tier: &PricingTier) -> bool {
        self.sku.name.eq_ignore_ascii_case(tier.size())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default)]
    pub default_host_name: Option<String>,
    #[serde(default)]
    pub server_farm_id: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WebApp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub properties: SiteProperties,
}

impl WebApp {
    pub fn url(&self) -> Option<String> {
        self.properties
            .default_host_name
            .as_ref()
            .map(|host| format!("https://{host}"))
    }
}

// ── Hosting plan ──

/// Desired shape of a hosting plan that does not exist yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanDefinition {
    pub region: Region,
    pub tier: PricingTier,
    pub linux: bool,
}

impl PlanDefinition {
    pub fn new(target: &AppServiceTarget, os: OperatingSystem) -> Self {
        Self {
            region: target.region.clone(),
            tier: target.effective_pricing_tier(),
            linux: os.is_linux_host(),
        }
    }

    pub fn to_body(&self) -> Value {
        let kind = if self.tier == PricingTier::CONSUMPTION {
            "functionapp"
        } else if self.linux {
            "linux"
        } else {
            "app"
        };
        json!({
            "location": self.region.as_str(),
            "kind": kind,
            "sku": sku_body(&self.tier),
            "properties": { "reserved": self.linux },
        })
    }
}

pub fn sku_body(tier: &PricingTier) -> Value {
    json!({ "name": tier.size(), "tier": tier.tier() })
}

// ── Runtime site config ──

/// Runtime part of `siteConfig`, one variant per host OS.
#[derive(Debug, Clone)]
pub enum SiteRuntime {
    Windows {
        java_version: &'static str,
        /// `javaContainer` / `javaContainerVersion`, web apps only
        container: Option<(&'static str, String)>,
    },
    Linux {
        linux_fx_version: String,
    },
    Container {
        image: ContainerImage,
    },
}

impl SiteRuntime {
    pub fn for_runtime(runtime: &RuntimeDescriptor, flavor: AppFlavor) -> Self {
        let (version, web_container) = match runtime.stack() {
            RuntimeStack::Container(image) => {
                return Self::Container {
                    image: image.clone(),
                };
            }
            RuntimeStack::Java {
                version,
                web_container,
            } => (*version, web_container.as_ref()),
        };
        let web_container = match web_container {
            Some(container) => container,
            None => &WebContainer::JavaSe,
        };

        match (runtime.os(), flavor) {
            (OperatingSystem::Windows, AppFlavor::Function) => Self::Windows {
                java_version: version.windows_value(),
                container: None,
            },
            (OperatingSystem::Windows, AppFlavor::Web) => {
                let (name, container_version) = web_container.windows_container();
                Self::Windows {
                    java_version: version.windows_value(),
                    container: Some((name, container_version.to_owned())),
                }
            }
            (_, AppFlavor::Function) => Self::Linux {
                linux_fx_version: format!("Java|{}", version.major()),
            },
            (_, AppFlavor::Web) => Self::Linux {
                linux_fx_version: web_container.linux_fx_version(version),
            },
        }
    }

    pub fn is_linux(&self) -> bool {
        !matches!(self, Self::Windows { .. })
    }

    /// Settings the platform needs to pull a private image.
    fn registry_settings(&self) -> Vec<(String, String)> {
        let Self::Container {
            image:
                ContainerImage {
                    registry: Some(registry),
                    ..
                },
        } = self
        else {
            return Vec::new();
        };
        vec![
            (
                "DOCKER_REGISTRY_SERVER_URL".to_owned(),
                registry.server_url.clone(),
            ),
            (
                "DOCKER_REGISTRY_SERVER_USERNAME".to_owned(),
                registry.username.clone(),
            ),
            (
                "DOCKER_REGISTRY_SERVER_PASSWORD".to_owned(),
                registry.password.expose_secret().to_owned(),
            ),
        ]
    }

    fn insert_into(&self, config: &mut Map<String, Value>) {
        match self {
            Self::Windows {
                java_version,
                container,
            } => {
                config.insert("javaVersion".to_owned(), json!(java_version));
                if let Some((name, version)) = container {
                    config.insert("javaContainer".to_owned(), json!(name));
                    config.insert("javaContainerVersion".to_owned(), json!(version));
                }
            }
            Self::Linux { linux_fx_version } => {
                config.insert("linuxFxVersion".to_owned(), json!(linux_fx_version));
            }
            Self::Container { image } => {
                config.insert(
                    "linuxFxVersion".to_owned(),
                    json!(format!("DOCKER|{}", image.image)),
                );
            }
        }
    }
}

// ── App ──

/// Full desired definition of the app: plan, runtime, and settings.
#[derive(Clone)]
pub struct AppDefinition {
    pub kind: &'static str,
    pub region: Region,
    pub plan_id: String,
    pub runtime: SiteRuntime,
    pub app_settings: Vec<(String, String)>,
}

impl AppDefinition {
    pub fn new(
        target: &AppServiceTarget,
        runtime: &RuntimeDescriptor,
        app_settings: &AppSettingsMap,
    ) -> Self {
        Self {
            kind: app_kind(target.flavor, runtime.os()),
            region: target.region.clone(),
            plan_id: plan_id(target),
            runtime: SiteRuntime::for_runtime(runtime, target.flavor),
            app_settings: app_settings
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        }
    }

    /// App settings followed by the registry credentials a private image needs.
    pub fn settings(&self) -> Vec<(String, String)> {
        self.app_settings
            .iter()
            .cloned()
            .chain(self.runtime.registry_settings())
            .collect()
    }

    pub fn to_create_body(&self) -> Value {
        let mut site_config = self.site_config();
        let settings: Vec<Value> = self
            .settings()
            .into_iter()
            .map(|(name, value)| json!({ "name": name, "value": value }))
            .collect();
        site_config.insert("appSettings".to_owned(), Value::Array(settings));

        json!({
            "location": self.region.as_str(),
            "kind": self.kind,
            "properties": {
                "serverFarmId": self.plan_id,
                "reserved": self.runtime.is_linux(),
                "siteConfig": site_config,
            },
        })
    }

    /// Patch body. Properties not named here (tags included) are left as they are.
    ///
    /// `siteConfig.appSettings` replaces the whole set, so settings are left
    /// out here and written through [`SiteAppSettings`] instead.
    pub fn to_update_body(&self) -> Value {
        json!({
            "kind": self.kind,
            "properties": {
                "serverFarmId": self.plan_id,
                "siteConfig": self.site_config(),
            },
        })
    }

    fn site_config(&self) -> Map<String, Value> {
        let mut config = Map::new();
        self.runtime.insert_into(&mut config);
        config
    }
}

// Setting values may hold secrets; only names are shown.
impl fmt::Debug for AppDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.app_settings.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("AppDefinition")
            .field("kind", &self.kind)
            .field("region", &self.region)
            .field("plan_id", &self.plan_id)
            .field("runtime", &self.runtime)
            .field("app_settings", &names)
            .finish()
    }
}

// ── App settings ──

/// The app's settings as stored remotely, in `config/appsettings` shape.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SiteAppSettings {
    #[serde(default)]
    pub properties: IndexMap<String, String>,
}

impl SiteAppSettings {
    /// Set every key in `desired`, keeping keys that are only present remotely.
    pub fn overlay(mut self, desired: impl IntoIterator<Item = (String, String)>) -> Self {
        self.properties.extend(desired);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn to_body(&self) -> Value {
        json!({ "properties": self.properties })
    }
}

impl fmt::Debug for SiteAppSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.properties.keys()).finish()
    }
}

fn app_kind(flavor: AppFlavor, os: OperatingSystem) -> &'static str {
    match (flavor, os) {
        (AppFlavor::Function, OperatingSystem::Windows) => "functionapp",
        (AppFlavor::Function, OperatingSystem::Linux) => "functionapp,linux",
        (AppFlavor::Function, OperatingSystem::Docker) => "functionapp,linux,container",
        (AppFlavor::Web, OperatingSystem::Windows) => "app",
        (AppFlavor::Web, OperatingSystem::Linux) => "app,linux",
        (AppFlavor::Web, OperatingSystem::Docker) => "app,linux,container",
    }
}
