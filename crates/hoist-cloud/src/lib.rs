//! Azure side of hoist: the control plane client, the resource provisioner,
//! and the artifact publisher.
//!
//! ```text
//! DeployContext ── CredentialProvider ──► AzClient (memoized)
//!     │
//!     ├─ ResourceProvisioner<ControlPlane>    resource group(s) → plan → app
//!     └─ ArtifactPublisher<ArtifactTransport> PublishHandler per DeploymentKind
//! ```

pub mod arm;
pub mod az;
pub mod context;
pub mod control_plane;
pub mod executor;
pub mod provision;
pub mod publish;
pub mod transport;

pub use arm::{
    AppDefinition, HostingPlan, PlanDefinition, ResourceGroup, SiteAppSettings, SiteRuntime,
    WebApp,
};
pub use az::AzError;
pub use context::{AuthError, AzCliCredentials, CredentialProvider, DeployContext};
pub use control_plane::{AzClient, ControlPlane, ControlPlaneError};
pub use executor::{AzExecutor, RealExecutor};
pub use provision::{
    Change, Ensured, ProvisionError, ProvisionPlan, ProvisionReport, ProvisionStep,
    ResourceProvisioner, StepOutcome,
};
pub use publish::{
    ArtifactPublisher, ArtifactTransport, PublishError, PublishHandler, TransportError,
};
