//! Core types and decisions for hoist.
//!
//! This crate defines the `hoist.toml` schema ([`HoistConfig`]), resolves
//! it into a [`DeployPlan`] (runtime, target, deployment transport, and
//! merged app settings), and holds the shared error types. Nothing here
//! talks to the network.

pub mod config;
pub mod deployment;
pub mod error;
pub mod plan;
pub mod project;
pub mod runtime;
pub mod settings;
pub mod target;

pub use config::{AppConfig, DeploymentConfig, HoistConfig, ProjectConfig, RuntimeConfig};
pub use deployment::{DeploymentDescriptor, DeploymentKind, resolve_deployment_kind};
pub use error::{Error, Result, Violation};
pub use plan::DeployPlan;
pub use project::ProjectDescriptor;
pub use runtime::{
    ContainerImage, JavaVersion, OperatingSystem, RegistryCredentials, RuntimeDescriptor,
    RuntimeStack, WebContainer, resolve_runtime,
};
pub use settings::{AppSettingsMap, AppSettingsMerger, MergeNote, MergeOutcome, Provenance};
pub use target::{AppFlavor, AppServiceTarget, PricingTier, Region};
