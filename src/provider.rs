//! Interfaces to the workspace service.
//!
//! Everything amlkit knows about remote resources comes through these
//! traits. The entity wrappers capture `Arc<dyn ...>` handles in their
//! collection producers; [`crate::snapshot`] implements all of them over a
//! JSON file.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Shared handle to an experiment.
pub type ExperimentHandle = Arc<dyn ExperimentProvider>;
/// Shared handle to a run.
pub type RunHandle = Arc<dyn RunProvider>;
/// Shared handle to a compute target.
pub type ComputeTargetHandle = Arc<dyn ComputeTargetProvider>;

/// A workspace: the root of experiments and compute targets.
pub trait WorkspaceProvider: Send + Sync {
    /// Workspace name.
    fn name(&self) -> &str;
    /// Azure region.
    fn location(&self) -> &str;
    /// Owning subscription.
    fn subscription_id(&self) -> &str;
    /// Owning resource group.
    fn resource_group(&self) -> &str;
    /// Full workspace description (includes `containerRegistry`).
    fn details(&self) -> Result<Value>;
    /// Experiments keyed by name, in service order.
    fn experiments(&self) -> Result<Vec<(String, ExperimentHandle)>>;
    /// Compute targets keyed by name, in service order.
    fn compute_targets(&self) -> Result<Vec<(String, ComputeTargetHandle)>>;
}

/// An experiment.
pub trait ExperimentProvider: Send + Sync {
    /// Experiment name.
    fn name(&self) -> &str;
    /// Runs of this experiment, newest first.
    fn runs(&self) -> Result<Vec<RunHandle>>;
}

/// A single run of an experiment.
pub trait RunProvider: Send + Sync {
    /// Run identifier.
    fn id(&self) -> &str;
    /// Run details (`runId`, `status`, `startTimeUtc`, ...).
    fn details(&self) -> Result<Map<String, Value>>;
    /// Run details including the `logFiles` mapping.
    fn details_with_logs(&self) -> Result<Map<String, Value>>;
}

/// A compute target attached to a workspace.
pub trait ComputeTargetProvider: Send + Sync {
    /// Target name.
    fn name(&self) -> &str;
    /// Serialized resource description.
    fn serialize(&self) -> Result<Value>;
}

/// A subscription visible to the signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    /// Display name.
    pub display_name: String,
    /// Subscription id.
    pub subscription_id: String,
}

/// Lists subscriptions.
pub trait SubscriptionProvider: Send + Sync {
    /// All visible subscriptions.
    fn subscriptions(&self) -> Result<Vec<Subscription>>;
}

/// Credentials returned by a container registry.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryCredentials {
    /// Admin user name.
    pub username: String,
    /// Admin passwords, primary first.
    pub passwords: Vec<String>,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("passwords", &format_args!("[{} redacted]", self.passwords.len()))
            .finish()
    }
}

/// Container registry management.
pub trait ContainerRegistryProvider: Send + Sync {
    /// Login server address of a registry.
    fn login_server(&self, resource_group: &str, registry_name: &str) -> Result<String>;
    /// Admin credentials of a registry.
    fn list_credentials(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<RegistryCredentials>;
}
