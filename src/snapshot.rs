//! JSON snapshot provider.
//!
//! A snapshot is a JSON document describing a workspace: its experiments
//! and runs, compute target descriptions, visible subscriptions and
//! container registries. [`SnapshotWorkspace`] implements every provider
//! trait over it, so the library and CLI work without a live service.
//!
//! When opened from a file, experiment and run listings re-read the file on
//! every fetch, so refreshing a collection picks up edits.
//!
//! ```json
//! {
//!   "name": "distributed_benchmark",
//!   "location": "eastus",
//!   "subscription_id": "...",
//!   "resource_group": "msdistbenchaml",
//!   "details": {"containerRegistry": ".../registries/benchacr"},
//!   "experiments": [
//!     {"name": "tf_bench", "runs": [
//!       {"id": "tf_1", "details": {"runId": "tf_1", "status": "Completed"},
//!        "logFiles": {"azureml-logs/70_driver_log.txt": "https://..."}}
//!     ]}
//!   ],
//!   "compute_targets": [{"name": "gpucluster", "location": "eastus", "properties": {}}]
//! }
//! ```

use crate::error::{AmlError, Result};
use crate::provider::{
    ComputeTargetHandle, ComputeTargetProvider, ContainerRegistryProvider, ExperimentHandle,
    ExperimentProvider, RegistryCredentials, RunHandle, RunProvider, Subscription,
    SubscriptionProvider, WorkspaceProvider,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// A recorded run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    /// Run id.
    pub id: String,
    /// Run details.
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Log file locations keyed by file name.
    #[serde(rename = "logFiles", default, skip_serializing_if = "Option::is_none")]
    pub log_files: Option<Map<String, Value>>,
}

impl RunProvider for RunSnapshot {
    fn id(&self) -> &str {
        &self.id
    }

    fn details(&self) -> Result<Map<String, Value>> {
        let mut details = self.details.clone();
        details
            .entry("runId")
            .or_insert_with(|| Value::from(self.id.as_str()));
        Ok(details)
    }

    fn details_with_logs(&self) -> Result<Map<String, Value>> {
        let mut details = self.details()?;
        if let Some(logs) = &self.log_files {
            details.insert("logFiles".to_string(), Value::Object(logs.clone()));
        }
        Ok(details)
    }
}

/// A recorded experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSnapshot {
    /// Experiment name.
    pub name: String,
    /// Runs, newest first.
    #[serde(default)]
    pub runs: Vec<RunSnapshot>,
}

impl ExperimentProvider for ExperimentSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn runs(&self) -> Result<Vec<RunHandle>> {
        Ok(self
            .runs
            .iter()
            .map(|run| Arc::new(run.clone()) as RunHandle)
            .collect())
    }
}

/// A recorded compute target description.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputeTargetSnapshot {
    name: String,
    description: Value,
}

impl ComputeTargetSnapshot {
    /// Wrap a serialized compute target; its name is read from `name`.
    ///
    /// # Errors
    ///
    /// Returns `MissingField` if the description has no string `name`.
    pub fn from_description(description: Value) -> Result<Self> {
        let name = description
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AmlError::missing_field("compute target", "name"))?
            .to_string();
        Ok(Self { name, description })
    }

    /// The serialized description.
    #[must_use]
    pub fn description(&self) -> &Value {
        &self.description
    }
}

impl ComputeTargetProvider for ComputeTargetSnapshot {
    fn name(&self) -> &str {
        &self.name
    }

    fn serialize(&self) -> Result<Value> {
        Ok(self.description.clone())
    }
}

/// A recorded container registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Resource group holding the registry.
    pub resource_group: String,
    /// Registry name.
    pub name: String,
    /// Login server address.
    pub login_server: String,
    /// Admin credentials.
    pub credentials: RegistryCredentials,
}

/// A recorded workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSnapshot {
    /// Workspace name.
    pub name: String,
    /// Azure region.
    pub location: String,
    /// Owning subscription.
    #[serde(default)]
    pub subscription_id: String,
    /// Owning resource group.
    pub resource_group: String,
    /// Full workspace description.
    #[serde(default)]
    pub details: Value,
    /// Experiments in service order.
    #[serde(default)]
    pub experiments: Vec<ExperimentSnapshot>,
    /// Serialized compute targets.
    #[serde(default)]
    pub compute_targets: Vec<Value>,
    /// Visible subscriptions.
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
    /// Container registries.
    #[serde(default)]
    pub registries: Vec<RegistrySnapshot>,
}

impl WorkspaceSnapshot {
    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading workspace snapshot");
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the snapshot as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// Experiment handle that can re-read its snapshot file.
#[derive(Debug, Clone)]
struct SnapshotExperiment {
    path: Option<PathBuf>,
    snapshot: ExperimentSnapshot,
}

impl ExperimentProvider for SnapshotExperiment {
    fn name(&self) -> &str {
        &self.snapshot.name
    }

    fn runs(&self) -> Result<Vec<RunHandle>> {
        let Some(path) = &self.path else {
            return self.snapshot.runs();
        };
        WorkspaceSnapshot::load(path)?
            .experiments
            .iter()
            .find(|e| e.name == self.snapshot.name)
            .ok_or_else(|| AmlError::not_found("experiment", &self.snapshot.name))?
            .runs()
    }
}

/// Provider backed by a [`WorkspaceSnapshot`].
#[derive(Debug, Clone)]
pub struct SnapshotWorkspace {
    path: Option<PathBuf>,
    snapshot: WorkspaceSnapshot,
}

impl SnapshotWorkspace {
    /// Serve an in-memory snapshot.
    #[must_use]
    pub fn new(snapshot: WorkspaceSnapshot) -> Self {
        Self {
            path: None,
            snapshot,
        }
    }

    /// Serve a snapshot file, re-reading it on every listing.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors from the initial read.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let snapshot = WorkspaceSnapshot::load(&path)?;
        Ok(Self {
            path: Some(path),
            snapshot,
        })
    }

    /// Serve a snapshot given as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns a JSON error if the value is not a snapshot.
    pub fn from_value(value: Value) -> Result<Self> {
        Ok(Self::new(serde_json::from_value(value)?))
    }

    /// Snapshot as first loaded.
    #[must_use]
    pub fn snapshot(&self) -> &WorkspaceSnapshot {
        &self.snapshot
    }

    fn current(&self) -> Result<Cow<'_, WorkspaceSnapshot>> {
        match &self.path {
            Some(path) => Ok(Cow::Owned(WorkspaceSnapshot::load(path)?)),
            None => Ok(Cow::Borrowed(&self.snapshot)),
        }
    }
}

impl WorkspaceProvider for SnapshotWorkspace {
    fn name(&self) -> &str {
        &self.snapshot.name
    }

    fn location(&self) -> &str {
        &self.snapshot.location
    }

    fn subscription_id(&self) -> &str {
        &self.snapshot.subscription_id
    }

    fn resource_group(&self) -> &str {
        &self.snapshot.resource_group
    }

    fn details(&self) -> Result<Value> {
        Ok(self.current()?.details.clone())
    }

    fn experiments(&self) -> Result<Vec<(String, ExperimentHandle)>> {
        Ok(self
            .current()?
            .experiments
            .iter()
            .map(|e| {
                let handle = SnapshotExperiment {
                    path: self.path.clone(),
                    snapshot: e.clone(),
                };
                (e.name.clone(), Arc::new(handle) as ExperimentHandle)
            })
            .collect())
    }

    fn compute_targets(&self) -> Result<Vec<(String, ComputeTargetHandle)>> {
        self.current()?
            .compute_targets
            .iter()
            .map(|description| {
                let target = ComputeTargetSnapshot::from_description(description.clone())?;
                Ok((target.name.clone(), Arc::new(target) as ComputeTargetHandle))
            })
            .collect()
    }
}

impl SubscriptionProvider for SnapshotWorkspace {
    fn subscriptions(&self) -> Result<Vec<Subscription>> {
        Ok(self.current()?.subscriptions.clone())
    }
}

impl SnapshotWorkspace {
    fn registry(&self, resource_group: &str, registry_name: &str) -> Result<RegistrySnapshot> {
        self.current()?
            .registries
            .iter()
            .find(|r| r.resource_group == resource_group && r.name == registry_name)
            .cloned()
            .ok_or_else(|| {
                AmlError::not_found("container registry", format!("{resource_group}/{registry_name}"))
            })
    }
}

impl ContainerRegistryProvider for SnapshotWorkspace {
    fn login_server(&self, resource_group: &str, registry_name: &str) -> Result<String> {
        Ok(self.registry(resource_group, registry_name)?.login_server)
    }

    fn list_credentials(
        &self,
        resource_group: &str,
        registry_name: &str,
    ) -> Result<RegistryCredentials> {
        Ok(self.registry(resource_group, registry_name)?.credentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn snapshot_json() -> Value {
        json!({
            "name": "ws",
            "location": "westeurope",
            "resource_group": "rg",
            "experiments": [{"name": "exp", "runs": [{"id": "r1", "details": {"status": "Completed"}}]}],
            "compute_targets": [{"name": "cpu", "location": "westeurope", "properties": {}}],
            "subscriptions": [{"display_name": "Dev", "subscription_id": "sub-1"}],
            "registries": [{
                "resource_group": "rg",
                "name": "acr",
                "login_server": "acr.azurecr.io",
                "credentials": {"username": "acr", "passwords": ["p1", "p2"]}
            }]
        })
    }

    #[test]
    fn test_run_details_fill_run_id() {
        let run = RunSnapshot {
            id: "r1".to_string(),
            details: Map::new(),
            log_files: None,
        };
        assert_eq!(run.details().unwrap()["runId"], json!("r1"));
        assert!(!run.details_with_logs().unwrap().contains_key("logFiles"));
    }

    #[test]
    fn test_workspace_listings() {
        let ws = SnapshotWorkspace::from_value(snapshot_json()).unwrap();
        assert_eq!(ws.name(), "ws");
        assert_eq!(ws.subscription_id(), "");
        assert_eq!(ws.details().unwrap(), Value::Null);

        let experiments = ws.experiments().unwrap();
        assert_eq!(experiments.len(), 1);
        assert_eq!(experiments[0].1.runs().unwrap()[0].id(), "r1");

        let targets = ws.compute_targets().unwrap();
        assert_eq!(targets[0].0, "cpu");

        assert_eq!(ws.subscriptions().unwrap()[0].subscription_id, "sub-1");
        assert_eq!(ws.login_server("rg", "acr").unwrap(), "acr.azurecr.io");
        assert_eq!(ws.list_credentials("rg", "acr").unwrap().passwords.len(), 2);
        assert!(ws.login_server("rg", "other").unwrap_err().is_not_found());
    }

    #[test]
    fn test_compute_target_without_name() {
        let err = ComputeTargetSnapshot::from_description(json!({"location": "x"})).unwrap_err();
        assert!(matches!(err, AmlError::MissingField { .. }));
    }

    #[test]
    fn test_file_snapshot_rereads() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("workspace.json");
        let mut snapshot: WorkspaceSnapshot = serde_json::from_value(snapshot_json()).unwrap();
        snapshot.save(&path).unwrap();

        let ws = SnapshotWorkspace::open(&path).unwrap();
        let experiment = ws.experiments().unwrap().remove(0).1;
        assert_eq!(experiment.runs().unwrap().len(), 1);

        snapshot.experiments[0].runs.push(RunSnapshot {
            id: "r2".to_string(),
            details: Map::new(),
            log_files: None,
        });
        snapshot.save(&path).unwrap();
        assert_eq!(experiment.runs().unwrap().len(), 2);
    }

    #[test]
    fn test_open_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = SnapshotWorkspace::open(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AmlError::Io(_)));
    }
}
