//! Experiment runs.

use crate::collection::{Entries, LazyCollection};
use crate::error::{AmlError, Result};
use crate::flatten::Row;
use crate::provider::{RunHandle, RunProvider};
use crate::table::{cell, Table};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Detail fields reported for a run unless others are requested.
pub const DEFAULT_RUN_DETAILS: &[&str] = &["runId", "status", "startTimeUtc", "endTimeUtc"];

/// Pick `selected` fields out of a run's details. Absent fields are null.
///
/// # Errors
///
/// Returns the provider's error.
pub fn extract_details<S: AsRef<str>>(run: &dyn RunProvider, selected: &[S]) -> Result<Row> {
    let details = run.details()?;
    Ok(selected
        .iter()
        .map(|field| {
            let field = field.as_ref();
            let value = details.get(field).cloned().unwrap_or(Value::Null);
            (field.to_string(), value)
        })
        .collect())
}

/// Log files of a run, keyed by file name.
///
/// # Errors
///
/// Returns `MissingField` if the details carry no `logFiles` mapping.
pub fn extract_logs(run: &dyn RunProvider) -> Result<Entries<String>> {
    let details = run.details_with_logs()?;
    let logs = details
        .get("logFiles")
        .and_then(Value::as_object)
        .ok_or_else(|| AmlError::missing_field(format!("run {}", run.id()), "logFiles"))?;
    Ok(logs.iter().map(|(name, location)| (name.clone(), cell(location))).collect())
}

/// One row of default details per run.
///
/// # Errors
///
/// Returns the first provider error.
pub fn runs_to_table<'a, I>(runs: I) -> Result<Table>
where
    I: IntoIterator<Item = &'a dyn RunProvider>,
{
    let records = runs
        .into_iter()
        .map(|run| extract_details(run, DEFAULT_RUN_DETAILS))
        .collect::<Result<Vec<_>>>()?;
    if records.is_empty() {
        return Ok(Table::new(DEFAULT_RUN_DETAILS.iter().copied()));
    }
    Ok(Table::from_records(records))
}

/// A run together with its lazily fetched log files.
pub struct Run {
    id: String,
    handle: RunHandle,
    /// Log file locations keyed by file name.
    pub logs: LazyCollection<String>,
}

impl Run {
    /// Wrap a run handle.
    #[must_use]
    pub fn new(handle: RunHandle) -> Self {
        let producer_handle = Arc::clone(&handle);
        Self {
            id: handle.id().to_string(),
            logs: LazyCollection::new("log file", move || extract_logs(producer_handle.as_ref())),
            handle,
        }
    }

    /// Run identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Underlying provider handle.
    #[must_use]
    pub fn handle(&self) -> &RunHandle {
        &self.handle
    }

    /// Default detail fields.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn details(&self) -> Result<Row> {
        self.details_for(DEFAULT_RUN_DETAILS)
    }

    /// Selected detail fields.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn details_for<S: AsRef<str>>(&self, selected: &[S]) -> Result<Row> {
        extract_details(self.handle.as_ref(), selected)
    }

    /// One-line status summary.
    ///
    /// # Errors
    ///
    /// Returns the provider's error.
    pub fn summary(&self) -> Result<String> {
        let details = self.details()?;
        let field = |name: &str| details.get(name).map_or_else(|| "-".to_string(), cell);
        Ok(format!(
            "Run: {} Status: {} Start Time: {} End Time: {}",
            field("runId"),
            field("status"),
            field("startTimeUtc"),
            field("endTimeUtc")
        ))
    }
}

impl fmt::Debug for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Run")
            .field("id", &self.id)
            .field("logs", &self.logs)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Run {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Run {}", self.id)
    }
}
