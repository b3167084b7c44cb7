//! Convenient re-exports for common usage.
//!
//! ```
//! use amlkit::prelude::*;
//! ```

// Core types
pub use crate::collection::{CacheState, Entries, LazyCollection, SharedCollection};
pub use crate::error::{AmlError, Result};
pub use crate::flatten::{flatten, flatten_row, PathTemplate, Row, COMPUTE_TARGET_PATH};
pub use crate::table::Table;

// Entities
pub use crate::compute::ComputeTarget;
pub use crate::experiment::{Experiment, MonitorOptions, RunSelector};
pub use crate::run::{Run, DEFAULT_RUN_DETAILS};
pub use crate::workspace::{Workspace, EXPERIMENT_COLUMNS};

// Providers
pub use crate::provider::{
    ComputeTargetProvider, ContainerRegistryProvider, ExperimentProvider, RunProvider,
    Subscription, SubscriptionProvider, WorkspaceProvider,
};
pub use crate::snapshot::{SnapshotWorkspace, WorkspaceSnapshot};

// Configuration
pub use crate::config::{AuthMethod, WorkspaceConfig};
