//! Workspaces: the entry point for browsing experiments and compute.

use crate::collection::{Entries, LazyCollection};
use crate::compute::ComputeTarget;
use crate::error::Result;
use crate::experiment::Experiment;
use crate::provider::WorkspaceProvider;
use crate::table::Table;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Columns of [`Workspace::experiments_to_table`].
pub const EXPERIMENT_COLUMNS: &[&str] = &[
    "workspace",
    "experiment",
    "runId",
    "status",
    "startTimeUtc",
    "endTimeUtc",
];

fn fetch_experiments(workspace: &dyn WorkspaceProvider) -> Result<Entries<Experiment>> {
    Ok(workspace
        .experiments()?
        .into_iter()
        .map(|(name, handle)| (name.clone(), Experiment::new(name, handle)))
        .collect())
}

fn fetch_compute_targets(workspace: &dyn WorkspaceProvider) -> Result<Entries<ComputeTarget>> {
    Ok(workspace
        .compute_targets()?
        .into_iter()
        .map(|(name, handle)| (name.clone(), ComputeTarget::new(name, handle)))
        .collect())
}

/// A workspace with lazily fetched experiments and compute targets.
pub struct Workspace {
    handle: Arc<dyn WorkspaceProvider>,
    /// Experiments keyed by name.
    pub experiments: LazyCollection<Experiment>,
    /// Compute targets keyed by name.
    pub compute_targets: LazyCollection<ComputeTarget>,
}

impl Workspace {
    /// Wrap a workspace handle. Nothing is fetched yet.
    #[must_use]
    pub fn new(handle: Arc<dyn WorkspaceProvider>) -> Self {
        info!(
            workspace = handle.name(),
            region = handle.location(),
            subscription = handle.subscription_id(),
            resource_group = handle.resource_group(),
            "opened workspace"
        );
        let for_experiments = Arc::clone(&handle);
        let for_compute = Arc::clone(&handle);
        Self {
            experiments: LazyCollection::new("experiment", move || {
                fetch_experiments(for_experiments.as_ref())
            }),
            compute_targets: LazyCollection::new("compute target", move || {
                fetch_compute_targets(for_compute.as_ref())
            }),
            handle,
        }
    }

    /// Underlying provider handle.
    #[must_use]
    pub fn handle(&self) -> &Arc<dyn WorkspaceProvider> {
        &self.handle
    }

    /// Workspace name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Name, region, subscription and resource group, one per line.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Workspace name: {}\nAzure region: {}\nSubscription id: {}\nResource group: {}",
            self.handle.name(),
            self.handle.location(),
            self.handle.subscription_id(),
            self.handle.resource_group()
        )
    }

    /// Runs of every experiment in one table with [`EXPERIMENT_COLUMNS`].
    ///
    /// # Errors
    ///
    /// Returns the first provider error.
    pub fn experiments_to_table(&mut self) -> Result<Table> {
        let workspace = Value::from(self.handle.name());
        let mut tables = Vec::new();
        for experiment in self.experiments.values_mut()? {
            let name = Value::from(experiment.name());
            tables.push(
                experiment
                    .runs_to_table()?
                    .with_column("experiment", name)
                    .with_column("workspace", workspace.clone()),
            );
        }
        if tables.is_empty() {
            return Ok(Table::new(EXPERIMENT_COLUMNS.iter().copied()));
        }
        Table::concat(tables).select(EXPERIMENT_COLUMNS)
    }

    /// One flattened row per compute target.
    ///
    /// # Errors
    ///
    /// Returns provider errors or `MalformedPath` for incomplete targets.
    pub fn compute_targets_to_table(&mut self) -> Result<Table> {
        let rows = self
            .compute_targets
            .values()?
            .map(ComputeTarget::to_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(Table::from_records(rows))
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("name", &self.handle.name())
            .field("experiments", &self.experiments)
            .field("compute_targets", &self.compute_targets)
            .finish()
    }
}
