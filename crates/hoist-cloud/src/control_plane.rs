use hoist_core::{AppServiceTarget, PricingTier, Region};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::arm::{
    self, AppDefinition, HostingPlan, PlanDefinition, RESOURCE_GROUP_API_VERSION, ResourceGroup,
    SiteAppSettings, WEB_API_VERSION, WebApp,
};
use crate::az::AzError;
use crate::executor::{AzExecutor, RealExecutor};

/// Remote control plane operations the provisioner builds on.
///
/// Lookups return `Ok(None)` when the resource does not exist; every other
/// failure is an error.
pub trait ControlPlane {
    fn get_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
    ) -> Result<Option<ResourceGroup>, ControlPlaneError>;

    fn create_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
        region: &Region,
    ) -> Result<ResourceGroup, ControlPlaneError>;

    fn get_hosting_plan(
        &self,
        target: &AppServiceTarget,
    ) -> Result<Option<HostingPlan>, ControlPlaneError>;

    fn create_hosting_plan(
        &self,
        target: &AppServiceTarget,
        definition: &PlanDefinition,
    ) -> Result<HostingPlan, ControlPlaneError>;

    fn update_pricing_tier(
        &self,
        target: &AppServiceTarget,
        tier: &PricingTier,
    ) -> Result<HostingPlan, ControlPlaneError>;

    fn get_app(&self, target: &AppServiceTarget) -> Result<Option<WebApp>, ControlPlaneError>;

    fn create_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError>;

    fn update_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError>;

    fn list_app_settings(
        &self,
        target: &AppServiceTarget,
    ) -> Result<SiteAppSettings, ControlPlaneError>;

    /// Replace the app's settings with exactly `settings`.
    fn replace_app_settings(
        &self,
        target: &AppServiceTarget,
        settings: &SiteAppSettings,
    ) -> Result<SiteAppSettings, ControlPlaneError>;
}

impl<C: ControlPlane + ?Sized> ControlPlane for &C {
    fn get_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
    ) -> Result<Option<ResourceGroup>, ControlPlaneError> {
        (**self).get_resource_group(subscription_id, name)
    }

    fn create_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
        region: &Region,
    ) -> Result<ResourceGroup, ControlPlaneError> {
        (**self).create_resource_group(subscription_id, name, region)
    }

    fn get_hosting_plan(
        &self,
        target: &AppServiceTarget,
    ) -> Result<Option<HostingPlan>, ControlPlaneError> {
        (**self).get_hosting_plan(target)
    }

    fn create_hosting_plan(
        &self,
        target: &AppServiceTarget,
        definition: &PlanDefinition,
    ) -> Result<HostingPlan, ControlPlaneError> {
        (**self).create_hosting_plan(target, definition)
    }

    fn update_pricing_tier(
        &self,
        target: &AppServiceTarget,
        tier: &PricingTier,
    ) -> Result<HostingPlan, ControlPlaneError> {
        (**self).update_pricing_tier(target, tier)
    }

    fn get_app(&self, target: &AppServiceTarget) -> Result<Option<WebApp>, ControlPlaneError> {
        (**self).get_app(target)
    }

    fn create_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError> {
        (**self).create_app(target, definition)
    }

    fn update_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError> {
        (**self).update_app(target, definition)
    }

    fn list_app_settings(
        &self,
        target: &AppServiceTarget,
    ) -> Result<SiteAppSettings, ControlPlaneError> {
        (**self).list_app_settings(target)
    }

    fn replace_app_settings(
        &self,
        target: &AppServiceTarget,
        settings: &SiteAppSettings,
    ) -> Result<SiteAppSettings, ControlPlaneError> {
        (**self).replace_app_settings(target, settings)
    }
}

/// Azure client backed by the `az` CLI, parameterized over the executor for testability.
///
/// Control plane calls go through `az rest` against ARM.
pub struct AzClient<E: AzExecutor = RealExecutor> {
    pub(crate) executor: E,
}

impl AzClient<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl Default for AzClient<RealExecutor> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Post => "post",
            Self::Put => "put",
            Self::Patch => "patch",
        }
    }
}

impl<E: AzExecutor> AzClient<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }

    fn rest(&self, method: Method, url: &str, body: Option<&Value>) -> Result<String, AzError> {
        let mut cmd = args(["rest", "--method", method.as_str(), "--url", url]);
        if let Some(body) = body {
            cmd.push("--body".to_owned());
            cmd.push(body.to_string());
        }
        self.executor.exec(&cmd)
    }

    /// GET a resource, mapping "not found" to `None`.
    fn lookup<T: DeserializeOwned>(
        &self,
        resource: &str,
        url: &str,
    ) -> Result<Option<T>, ControlPlaneError> {
        match self.rest(Method::Get, url, None) {
            Ok(body) => parse(resource, &body).map(Some),
            Err(e) if e.is_not_found() => {
                tracing::debug!(resource, "not found");
                Ok(None)
            }
            Err(e) => Err(ControlPlaneError::Request {
                resource: resource.to_owned(),
                source: e,
            }),
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        url: &str,
        body: Option<&Value>,
    ) -> Result<T, ControlPlaneError> {
        let response = self
            .rest(method, url, body)
            .map_err(|e| ControlPlaneError::Request {
                resource: resource.to_owned(),
                source: e,
            })?;
        parse(resource, &response)
    }
}

impl<E: AzExecutor> ControlPlane for AzClient<E> {
    // ── Resource groups ──

    fn get_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
    ) -> Result<Option<ResourceGroup>, ControlPlaneError> {
        let url = versioned(
            &arm::resource_group_id(subscription_id, name),
            RESOURCE_GROUP_API_VERSION,
        );
        self.lookup(&format!("resource group '{name}'"), &url)
    }

    fn create_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
        region: &Region,
    ) -> Result<ResourceGroup, ControlPlaneError> {
        let url = versioned(
            &arm::resource_group_id(subscription_id, name),
            RESOURCE_GROUP_API_VERSION,
        );
        let body = json!({ "location": region.as_str() });
        self.send(Method::Put, &format!("resource group '{name}'"), &url, Some(&body))
    }

    // ── Hosting plans ──

    fn get_hosting_plan(
        &self,
        target: &AppServiceTarget,
    ) -> Result<Option<HostingPlan>, ControlPlaneError> {
        let url = versioned(&arm::plan_id(target), WEB_API_VERSION);
        self.lookup(&format!("hosting plan '{}'", target.plan_name), &url)
    }

    fn create_hosting_plan(
        &self,
        target: &AppServiceTarget,
        definition: &PlanDefinition,
    ) -> Result<HostingPlan, ControlPlaneError> {
        let url = versioned(&arm::plan_id(target), WEB_API_VERSION);
        self.send(
            Method::Put,
            &format!("hosting plan '{}'", target.plan_name),
            &url,
            Some(&definition.to_body()),
        )
    }

    fn update_pricing_tier(
        &self,
        target: &AppServiceTarget,
        tier: &PricingTier,
    ) -> Result<HostingPlan, ControlPlaneError> {
        let url = versioned(&arm::plan_id(target), WEB_API_VERSION);
        let body = json!({ "sku": arm::sku_body(tier) });
        self.send(
            Method::Patch,
            &format!("hosting plan '{}'", target.plan_name),
            &url,
            Some(&body),
        )
    }

    // ── Apps ──

    fn get_app(&self, target: &AppServiceTarget) -> Result<Option<WebApp>, ControlPlaneError> {
        let url = versioned(&arm::app_id(target), WEB_API_VERSION);
        self.lookup(&format!("app '{}'", target.app_name), &url)
    }

    fn create_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError> {
        let url = versioned(&arm::app_id(target), WEB_API_VERSION);
        self.send(
            Method::Put,
            &format!("app '{}'", target.app_name),
            &url,
            Some(&definition.to_create_body()),
        )
    }

    fn update_app(
        &self,
        target: &AppServiceTarget,
        definition: &AppDefinition,
    ) -> Result<WebApp, ControlPlaneError> {
        let url = versioned(&arm::app_id(target), WEB_API_VERSION);
        self.send(
            Method::Patch,
            &format!("app '{}'", target.app_name),
            &url,
            Some(&definition.to_update_body()),
        )
    }

    // ── App settings ──

    fn list_app_settings(
        &self,
        target: &AppServiceTarget,
    ) -> Result<SiteAppSettings, ControlPlaneError> {
        let url = versioned(
            &format!("{}/config/appsettings/list", arm::app_id(target)),
            WEB_API_VERSION,
        );
        self.send(
            Method::Post,
            &format!("settings of app '{}'", target.app_name),
            &url,
            None,
        )
    }

    fn replace_app_settings(
        &self,
        target: &AppServiceTarget,
        settings: &SiteAppSettings,
    ) -> Result<SiteAppSettings, ControlPlaneError> {
        let url = versioned(
            &format!("{}/config/appsettings", arm::app_id(target)),
            WEB_API_VERSION,
        );
        self.send(
            Method::Put,
            &format!("settings of app '{}'", target.app_name),
            &url,
            Some(&settings.to_body()),
        )
    }
}

// ── Helper ──

pub(crate) fn args<const N: usize>(a: [&str; N]) -> Vec<String> {
    a.iter().map(|s| (*s).to_owned()).collect()
}

fn versioned(resource_id: &str, api_version: &str) -> String {
    format!("{resource_id}?api-version={api_version}")
}

fn parse<T: DeserializeOwned>(resource: &str, body: &str) -> Result<T, ControlPlaneError> {
    serde_json::from_str(body).map_err(|e| ControlPlaneError::Parse {
        resource: resource.to_owned(),
        source: e,
    })
}

// ── Error types ──

#[derive(Debug, thiserror::Error)]
pub enum ControlPlaneError {
    #[error("request for {resource} failed")]
    Request { resource: String, source: AzError },

    #[error("unexpected response for {resource}")]
    Parse {
        resource: String,
        source: serde_json::Error,
    },
}
