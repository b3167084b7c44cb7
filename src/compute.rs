//! Compute targets.

use crate::error::Result;
use crate::flatten::{flatten_row, Row, COMPUTE_TARGET_PATH};
use crate::provider::{ComputeTargetHandle, ComputeTargetProvider};
use crate::table::Table;
use std::fmt;

/// Flatten a compute target's description along [`COMPUTE_TARGET_PATH`].
///
/// # Errors
///
/// Returns the provider's error, or `MalformedPath` when the description
/// lacks a field on the path.
pub fn compute_target_row(target: &dyn ComputeTargetProvider) -> Result<Row> {
    let description = target.serialize()?;
    flatten_row(&description, COMPUTE_TARGET_PATH)
}

/// A compute target attached to a workspace.
#[derive(Clone)]
pub struct ComputeTarget {
    name: String,
    handle: ComputeTargetHandle,
}

impl ComputeTarget {
    /// Wrap a compute target handle.
    #[must_use]
    pub fn new(name: impl Into<String>, handle: ComputeTargetHandle) -> Self {
        Self {
            name: name.into(),
            handle,
        }
    }

    /// Target name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying provider handle.
    #[must_use]
    pub fn handle(&self) -> &ComputeTargetHandle {
        &self.handle
    }

    /// Flattened description.
    ///
    /// # Errors
    ///
    /// See [`compute_target_row`].
    pub fn to_row(&self) -> Result<Row> {
        compute_target_row(self.handle.as_ref())
    }

    /// Single-row table of the flattened description.
    ///
    /// # Errors
    ///
    /// See [`compute_target_row`].
    pub fn to_table(&self) -> Result<Table> {
        Ok(Table::from_records([self.to_row()?]))
    }
}

impl fmt::Debug for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputeTarget")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for ComputeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComputeTarget {}", self.name)
    }
}
