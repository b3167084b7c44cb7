//! Experiments and their runs.

use crate::collection::{Entries, LazyCollection};
use crate::error::{AmlError, Result};
use crate::provider::{ExperimentHandle, ExperimentProvider};
use crate::run::{self, Run};
use crate::table::Table;
use chrono::Utc;
use std::fmt;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How to pick a run out of an experiment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSelector {
    /// By run id.
    Id(String),
    /// By position in service order; negative counts from the end.
    Index(i64),
}

/// Options for [`Experiment::monitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorOptions {
    /// Keep polling until stopped.
    pub watch: bool,
    /// Delay between polls.
    pub interval: Duration,
}

impl Default for MonitorOptions {
    fn default() -> Self {
        Self {
            watch: false,
            interval: Duration::from_secs(5),
        }
    }
}

fn fetch_runs(experiment: &dyn ExperimentProvider) -> Result<Entries<Run>> {
    Ok(experiment
        .runs()?
        .into_iter()
        .map(|handle| (handle.id().to_string(), Run::new(handle)))
        .collect())
}

/// An experiment with its lazily fetched runs.
pub struct Experiment {
    name: String,
    handle: ExperimentHandle,
    /// Runs keyed by run id.
    pub runs: LazyCollection<Run>,
}

impl Experiment {
    /// Wrap an experiment handle.
    #[must_use]
    pub fn new(name: impl Into<String>, handle: ExperimentHandle) -> Self {
        let producer_handle = Arc::clone(&handle);
        Self {
            name: name.into(),
            runs: LazyCollection::new("run", move || fetch_runs(producer_handle.as_ref())),
            handle,
        }
    }

    /// Experiment name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying provider handle.
    #[must_use]
    pub fn handle(&self) -> &ExperimentHandle {
        &self.handle
    }

    /// Default run details, one row per run.
    ///
    /// # Errors
    ///
    /// Returns the first provider error.
    pub fn runs_to_table(&mut self) -> Result<Table> {
        run::runs_to_table(self.runs.values()?.map(|r| r.handle().as_ref()))
    }

    /// Find a run by id or position.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown id or an out-of-range index.
    pub fn select_run(&mut self, selector: &RunSelector) -> Result<&Run> {
        match selector {
            RunSelector::Id(id) => self.runs.get(id),
            RunSelector::Index(index) => {
                let len = i64::try_from(self.runs.len()?)
                    .map_err(|_| AmlError::Validation("too many runs".to_string()))?;
                let position = if *index < 0 { len + index } else { *index };
                let out_of_range = || AmlError::not_found("run", format!("#{index}"));
                let position = usize::try_from(position).map_err(|_| out_of_range())?;
                self.runs.values()?.nth(position).ok_or_else(out_of_range)
            }
        }
    }

    /// Print the run table to `out`, re-fetching runs on every poll.
    ///
    /// Without `watch` a single table is printed. With `watch` polling
    /// continues every `interval` until `stop` returns true. Returns the
    /// number of polls made.
    ///
    /// # Errors
    ///
    /// Returns provider or write errors.
    pub fn monitor<W: Write>(
        &mut self,
        options: &MonitorOptions,
        out: &mut W,
        mut stop: impl FnMut() -> bool,
    ) -> Result<usize> {
        if options.watch {
            info!(experiment = %self.name, "monitoring experiment, interrupt to stop");
        }
        let mut polls = 0;
        loop {
            self.runs.refresh()?;
            let table = self.runs_to_table()?;
            writeln!(
                out,
                "Experiment {} @ {}",
                self.name,
                Utc::now().format("%Y-%m-%d %H:%M:%S")
            )?;
            write!(out, "{table}")?;
            out.flush()?;
            polls += 1;

            if !options.watch || stop() {
                break;
            }
            std::thread::sleep(options.interval);
            if stop() {
                break;
            }
        }
        if options.watch {
            info!(experiment = %self.name, polls, "stopped monitoring");
        }
        Ok(polls)
    }
}

impl fmt::Debug for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Experiment")
            .field("name", &self.name)
            .field("runs", &self.runs)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Experiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Experiment {}", self.name)
    }
}
