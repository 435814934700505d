//! Create-or-update engine for the remote resource graph.
//!
//! ```text
//! ProvisionPlan
//!   1. ensure resource group (app)
//!   2. ensure resource group (plan)   only when it differs from the app's
//!   3. ensure hosting plan
//!   4. create or update app
//! ```
//!
//! Steps run strictly in order and the first failure aborts the rest.
//! Resources created before the failure are left in place.

use std::fmt;

use hoist_core::{
    AppServiceTarget, AppSettingsMap, DeployPlan, OperatingSystem, Region, RuntimeDescriptor,
};

use crate::arm::{AppDefinition, HostingPlan, PlanDefinition, ResourceGroup, WebApp};
use crate::control_plane::{ControlPlane, ControlPlaneError};

/// What provisioning did to one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Updated,
    Unchanged,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Unchanged => "unchanged",
        })
    }
}

/// A resource handle plus what was done to reach it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ensured<T> {
    pub resource: T,
    pub change: Change,
}

impl<T> Ensured<T> {
    fn new(resource: T, change: Change) -> Self {
        Self { resource, change }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionStep {
    ResourceGroup { name: String },
    HostingPlan { name: String },
    App { name: String },
}

impl fmt::Display for ProvisionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceGroup { name } => write!(f, "ensure resource group '{name}'"),
            Self::HostingPlan { name } => write!(f, "ensure hosting plan '{name}'"),
            Self::App { name } => write!(f, "create or update app '{name}'"),
        }
    }
}

/// Ordered provisioning work for one app. Built once, executed once.
#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    target: AppServiceTarget,
    runtime: RuntimeDescriptor,
    app_settings: AppSettingsMap,
    steps: Vec<ProvisionStep>,
}

impl ProvisionPlan {
    pub fn new(
        target: AppServiceTarget,
        runtime: RuntimeDescriptor,
        app_settings: AppSettingsMap,
    ) -> Self {
        let mut steps = vec![ProvisionStep::ResourceGroup {
            name: target.resource_group.clone(),
        }];
        if target.plan_in_separate_group() {
            steps.push(ProvisionStep::ResourceGroup {
                name: target.plan_resource_group.clone(),
            });
        }
        steps.push(ProvisionStep::HostingPlan {
            name: target.plan_name.clone(),
        });
        steps.push(ProvisionStep::App {
            name: target.app_name.clone(),
        });

        Self {
            target,
            runtime,
            app_settings,
            steps,
        }
    }

    pub fn from_deploy_plan(plan: &DeployPlan) -> Self {
        Self::new(
            plan.target.clone(),
            plan.runtime.clone(),
            plan.app_settings.clone(),
        )
    }

    pub fn steps(&self) -> &[ProvisionStep] {
        &self.steps
    }

    pub fn target(&self) -> &AppServiceTarget {
        &self.target
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: ProvisionStep,
    pub change: Change,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    /// One entry per executed step, in execution order
    pub outcomes: Vec<StepOutcome>,
    pub app: WebApp,
}

impl ProvisionReport {
    pub fn change_of(&self, step: &ProvisionStep) -> Option<Change> {
        self.outcomes
            .iter()
            .find(|o| &o.step == step)
            .map(|o| o.change)
    }

    pub fn created(&self) -> impl Iterator<Item = &ProvisionStep> {
        self.outcomes
            .iter()
            .filter(|o| o.change == Change::Created)
            .map(|o| &o.step)
    }
}

/// Idempotently creates or updates the resource group(s), hosting plan, and app.
pub struct ResourceProvisioner<C> {
    client: C,
}

impl<C: ControlPlane> ResourceProvisioner<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Look the group up; create it only when it does not exist.
    ///
    /// An existing group is returned as is: its region is never changed.
    pub fn ensure_resource_group(
        &self,
        subscription_id: &str,
        name: &str,
        region: &Region,
    ) -> Result<Ensured<ResourceGroup>, ControlPlaneError> {
        if let Some(group) = self.client.get_resource_group(subscription_id, name)? {
            tracing::debug!(resource_group = %name, "resource group exists");
            return Ok(Ensured::new(group, Change::Unchanged));
        }

        tracing::info!(resource_group = %name, region = %region, "creating resource group");
        let group = self
            .client
            .create_resource_group(subscription_id, name, region)?;
        Ok(Ensured::new(group, Change::Created))
    }

    /// Create the plan when missing; otherwise move it to the requested tier in place.
    pub fn ensure_hosting_plan(
        &self,
        target: &AppServiceTarget,
        os: OperatingSystem,
    ) -> Result<Ensured<HostingPlan>, ControlPlaneError> {
        let Some(plan) = self.client.get_hosting_plan(target)? else {
            let definition = PlanDefinition::new(target, os);
            tracing::info!(
                plan = %target.plan_name,
                tier = %definition.tier,
                region = %definition.region,
                linux = definition.linux,
                "creating hosting plan"
            );
            let plan = self.client.create_hosting_plan(target, &definition)?;
            return Ok(Ensured::new(plan, Change::Created));
        };

        match &target.pricing_tier {
            Some(tier) if !plan.has_size(tier) => {
                tracing::info!(
                    plan = %target.plan_name,
                    from = %plan.sku.name,
                    to = %tier,
                    "updating pricing tier"
                );
                let plan = self.client.update_pricing_tier(target, tier)?;
                Ok(Ensured::new(plan, Change::Updated))
            }
            _ => {
                tracing::debug!(plan = %target.plan_name, sku = %plan.sku.name, "hosting plan exists");
                Ok(Ensured::new(plan, Change::Unchanged))
            }
        }
    }

    /// One creation call when the app is missing. Otherwise one update call,
    /// then the desired settings are written over the ones already on the app.
    pub fn create_or_update_app(
        &self,
        target: &AppServiceTarget,
        runtime: &RuntimeDescriptor,
        app_settings: &AppSettingsMap,
    ) -> Result<Ensured<WebApp>, ControlPlaneError> {
        let definition = AppDefinition::new(target, runtime, app_settings);

        if self.client.get_app(target)?.is_some() {
            tracing::info!(app = %target.app_name, kind = definition.kind, "updating app");
            let app = self.client.update_app(target, &definition)?;

            // Settings set outside hoist (storage connection included) must survive.
            let existing = self.client.list_app_settings(target)?;
            let kept = existing.properties.len();
            let merged = existing.overlay(definition.settings());
            tracing::debug!(
                app = %target.app_name,
                existing = kept,
                total = merged.properties.len(),
                "overlaying app settings"
            );
            self.client.replace_app_settings(target, &merged)?;
            return Ok(Ensured::new(app, Change::Updated));
        }

        tracing::info!(app = %target.app_name, kind = definition.kind, "creating app");
        let app = self.client.create_app(target, &definition)?;
        Ok(Ensured::new(app, Change::Created))
    }

    /// Run every step of `plan` in order, stopping at the first failure.
    pub fn orchestrate(&self, plan: ProvisionPlan) -> Result<ProvisionReport, ProvisionError> {
        let ProvisionPlan {
            target,
            runtime,
            app_settings,
            steps,
        } = plan;

        let mut outcomes = Vec::with_capacity(steps.len());
        let mut app = None;

        for step in steps {
            let result = match &step {
                ProvisionStep::ResourceGroup { name } => self
                    .ensure_resource_group(&target.subscription_id, name, &target.region)
                    .map(|ensured| ensured.change),
                ProvisionStep::HostingPlan { .. } => self
                    .ensure_hosting_plan(&target, runtime.os())
                    .map(|ensured| ensured.change),
                ProvisionStep::App { .. } => self
                    .create_or_update_app(&target, &runtime, &app_settings)
                    .map(|ensured| {
                        app = Some(ensured.resource);
                        ensured.change
                    }),
            };

            match result {
                Ok(change) => outcomes.push(StepOutcome { step, change }),
                Err(source) => return Err(ProvisionError::Step { step, source }),
            }
        }

        let app = app.ok_or(ProvisionError::AppStepMissing)?;
        tracing::info!(
            app = %app.name,
            url = app.url().as_deref().unwrap_or("-"),
            "provisioning complete"
        );
        Ok(ProvisionReport { outcomes, app })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProvisionError {
    #[error("provisioning failed at step: {step}")]
    Step {
        step: ProvisionStep,
        source: ControlPlaneError,
    },

    #[error("provision plan has no app step")]
    AppStepMissing,
}
