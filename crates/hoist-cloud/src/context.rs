use std::path::Path;

use hoist_core::DeployPlan;
use once_cell::unsync::OnceCell;

use crate::az::AzError;
use crate::control_plane::{AzClient, args};
use crate::executor::{AzExecutor, RealExecutor};

/// Produces an authenticated client for one subscription.
pub trait CredentialProvider {
    type Client;

    fn authenticate(&self, subscription_id: &str) -> Result<Self::Client, AuthError>;
}

/// Reuses the login of the local `az` CLI.
#[derive(Debug, Clone, Default)]
pub struct AzCliCredentials<E: AzExecutor + Clone = RealExecutor> {
    executor: E,
}

impl AzCliCredentials<RealExecutor> {
    pub fn new() -> Self {
        Self {
            executor: RealExecutor,
        }
    }
}

impl<E: AzExecutor + Clone> AzCliCredentials<E> {
    pub fn with_executor(executor: E) -> Self {
        Self { executor }
    }
}

impl<E: AzExecutor + Clone> CredentialProvider for AzCliCredentials<E> {
    type Client = AzClient<E>;

    fn authenticate(&self, subscription_id: &str) -> Result<Self::Client, AuthError> {
        let account = self
            .executor
            .exec(&args([
                "account",
                "show",
                "--subscription",
                subscription_id,
                "--query",
                "user.name",
                "--output",
                "tsv",
            ]))
            .map_err(|e| match e {
                AzError::NotFound { .. } => AuthError::CliMissing { source: e },
                other => AuthError::NotAuthenticated {
                    subscription_id: subscription_id.to_owned(),
                    source: other,
                },
            })?;

        tracing::info!(account = %account.trim(), subscription = %subscription_id, "authenticated");
        Ok(AzClient::with_executor(self.executor.clone()))
    }
}

/// Per-invocation deploy state, built once and threaded through every step.
///
/// The authenticated client is created on first use and reused afterwards.
pub struct DeployContext<P: CredentialProvider> {
    plan: DeployPlan,
    credentials: P,
    client: OnceCell<P::Client>,
}

impl<P: CredentialProvider> DeployContext<P> {
    pub fn new(plan: DeployPlan, credentials: P) -> Self {
        Self {
            plan,
            credentials,
            client: OnceCell::new(),
        }
    }

    pub fn plan(&self) -> &DeployPlan {
        &self.plan
    }

    pub fn credentials(&self) -> &P {
        &self.credentials
    }

    /// Resolved when the plan was built; never recomputed.
    pub fn staging_dir(&self) -> &Path {
        &self.plan.deployment.staging_dir
    }

    pub fn client(&self) -> Result<&P::Client, AuthError> {
        self.client.get_or_try_init(|| {
            self.credentials
                .authenticate(&self.plan.target.subscription_id)
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Azure CLI (az) is not installed")]
    CliMissing { source: AzError },

    #[error("not authenticated for subscription '{subscription_id}' (run: az login)")]
    NotAuthenticated {
        subscription_id: String,
        source: AzError,
    },
}
