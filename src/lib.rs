// Clippy configuration for amlkit crate
// Allow similar names in table code
#![allow(clippy::similar_names)]
// Allow redundant closures for clarity
#![allow(clippy::redundant_closure_for_method_calls)]
// Allow format string style choices
#![allow(clippy::uninlined_format_args)]
// Doc backticks optional
#![allow(clippy::doc_markdown)]
// Allow missing docs for internal items
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Allow unwrap in verified contexts
#![allow(clippy::unwrap_used)]
// Allow map_or patterns
#![allow(clippy::option_if_let_else)]
// Allow pass-by-value for small types
#![allow(clippy::needless_pass_by_value)]
// Collections expose len() that may fetch, so is_empty() is fallible too
#![allow(clippy::len_without_is_empty)]

//! amlkit: lazy browsing and tabular reporting for ML workspaces
//!
//! amlkit wraps the workspace, experiment, run and compute-target handles
//! of a machine-learning workspace service. Child entities live in
//! [`LazyCollection`]s that fetch on first access and cache afterwards;
//! nested resource descriptions are flattened into report rows along a
//! path template.
//!
//! # Quick Start
//!
//! ```no_run
//! use amlkit::prelude::*;
//! use std::sync::Arc;
//!
//! let provider = SnapshotWorkspace::open("workspace.json")?;
//! let mut workspace = Workspace::new(Arc::new(provider));
//!
//! // Nothing has been fetched yet.
//! assert!(!workspace.experiments.is_populated());
//!
//! // First access fetches and caches.
//! let experiment = workspace.experiments.get_mut("tf_bench")?;
//! println!("{}", experiment.runs_to_table()?);
//!
//! println!("{}", workspace.compute_targets_to_table()?);
//! # Ok::<(), amlkit::AmlError>(())
//! ```
//!
//! # Architecture
//!
//! - **Core** - [`collection`] (lazy cached collections) and [`flatten`]
//!   (path-driven tree flattening), reported through [`table`]
//! - **Entities** - [`workspace`], [`experiment`], [`run`], [`compute`]
//! - **Providers** - [`provider`] traits for the remote service, with a
//!   JSON-file implementation in [`snapshot`]
//! - **Glue** - [`config`], [`subscription`], [`registry`], [`cli`]

pub mod cli;
pub mod collection;
pub mod compute;
pub mod config;
pub mod error;
pub mod experiment;
pub mod flatten;
pub mod prelude;
pub mod provider;
pub mod registry;
pub mod run;
pub mod snapshot;
pub mod subscription;
pub mod table;
pub mod workspace;

pub use collection::{LazyCollection, SharedCollection};
pub use error::{AmlError, Result};
