use std::path::Path;

use crate::config::HoistConfig;
use crate::deployment::{DeploymentDescriptor, resolve_deployment_kind};
use crate::runtime::{RuntimeDescriptor, non_empty, resolve_runtime};
use crate::settings::{AppSettingsMap, AppSettingsMerger, STORAGE_CONNECTION};
use crate::target::{AppFlavor, AppServiceTarget, PricingTier, Region};
use crate::{Error, Result, Violation};

/// Everything needed to provision and publish, resolved before any remote call.
#[derive(Debug, Clone)]
pub struct DeployPlan {
    pub target: AppServiceTarget,
    pub runtime: RuntimeDescriptor,
    pub deployment: DeploymentDescriptor,
    pub app_settings: AppSettingsMap,
}

impl DeployPlan {
    /// Validate the configuration and resolve every decision up front.
    ///
    /// All problems are collected and reported together as
    /// [`Error::InvalidConfiguration`] instead of stopping at the first one.
    pub fn resolve(config: &HoistConfig, project_dir: &Path) -> Result<Self> {
        let mut violations = Vec::new();
        let app = &config.app;

        let name = require(&mut violations, "app.name", app.name.as_deref());
        let subscription_id = require(
            &mut violations,
            "app.subscription_id",
            app.subscription_id.as_deref(),
        );
        let resource_group = require(
            &mut violations,
            "app.resource_group",
            app.resource_group.as_deref(),
        );
        let region = check(&mut violations, "app.region", app.region.parse::<Region>());
        let pricing_tier = match non_empty(app.pricing_tier.as_deref()) {
            Some(raw) => check(&mut violations, "app.pricing_tier", raw.parse::<PricingTier>())
                .map(Some),
            None => Some(None),
        };
        let runtime = check(&mut violations, "runtime", resolve_runtime(&config.runtime));

        let (
            Some(name),
            Some(subscription_id),
            Some(resource_group),
            Some(region),
            Some(pricing_tier),
            Some(runtime),
        ) = (
            name,
            subscription_id,
            resource_group,
            region,
            pricing_tier,
            runtime,
        )
        else {
            // Deployment type is still checked so its error is not hidden.
            if let Some(raw) = non_empty(config.deployment.kind.as_deref()) {
                check(&mut violations, "deployment.type", raw.parse::<crate::DeploymentKind>());
            }
            return Err(Error::InvalidConfiguration { violations });
        };

        // Web apps always sit on a dedicated plan.
        let tier_specified = pricing_tier.is_some() || app.flavor == AppFlavor::Web;
        let kind = check(
            &mut violations,
            "deployment.type",
            resolve_deployment_kind(
                config.deployment.kind.as_deref(),
                runtime.os(),
                tier_specified,
            ),
        );
        let Some(kind) = kind else {
            return Err(Error::InvalidConfiguration { violations });
        };
        // Nothing provisions a storage account, so the connection must come from the user.
        if kind.needs_storage_connection()
            && non_empty(config.app_settings.get(STORAGE_CONNECTION).map(String::as_str)).is_none()
        {
            violations.push(Violation::new(
                "app_settings",
                format!("{STORAGE_CONNECTION} is required for {kind} deployments"),
            ));
        }
        if !violations.is_empty() {
            return Err(Error::InvalidConfiguration { violations });
        }

        let staging_dir = match &config.deployment.staging_dir {
            Some(dir) => project_dir.join(dir),
            None => project_dir.join(".hoist").join("staging").join(name),
        };

        let plan_name = match non_empty(app.plan_name.as_deref()) {
            Some(plan_name) => plan_name.to_owned(),
            None => format!("{name}-plan"),
        };
        let plan_resource_group = match non_empty(app.plan_resource_group.as_deref()) {
            Some(group) => group.to_owned(),
            None => resource_group.to_owned(),
        };

        let merger = match app.flavor {
            AppFlavor::Function => AppSettingsMerger::for_function_app(),
            AppFlavor::Web => AppSettingsMerger::for_web_app(),
        };
        let app_settings = merger.merge(&config.app_settings).settings;

        let target = AppServiceTarget {
            subscription_id: subscription_id.to_owned(),
            resource_group: resource_group.to_owned(),
            app_name: name.to_owned(),
            region,
            pricing_tier,
            plan_name,
            plan_resource_group,
            flavor: app.flavor,
        };

        tracing::info!(
            app = %target.app_name,
            region = %target.region,
            os = %runtime.os(),
            deployment = %kind,
            "resolved deploy plan"
        );

        Ok(Self {
            target,
            runtime,
            deployment: DeploymentDescriptor { kind, staging_dir },
            app_settings,
        })
    }
}

fn require<'a>(
    violations: &mut Vec<Violation>,
    field: &'static str,
    value: Option<&'a str>,
) -> Option<&'a str> {
    let value = non_empty(value);
    if value.is_none() {
        violations.push(Violation::new(field, "is required"));
    }
    value
}

fn check<T>(violations: &mut Vec<Violation>, field: &'static str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            violations.push(Violation::new(field, e.to_string()));
            None
        }
    }
}
