//! Path-driven flattening of nested property trees.
//!
//! Remote resources serialize to nested JSON objects. For tabular reporting
//! a path template picks the interesting leaves out of that tree: the path
//! is read left to right, a key holding an object moves the cursor into it,
//! and any other key is emitted as a `(key, value)` pair. The cursor never
//! moves back up, so leaves at a level must be listed before the next branch.

use crate::error::{AmlError, Result};
use indexmap::IndexMap;
use serde_json::Value;
use std::iter::Enumerate;
use std::slice;

/// Path used to report compute targets.
pub const COMPUTE_TARGET_PATH: &[&str] = &[
    "name",
    "location",
    "properties",
    "computeType",
    "provisioningState",
    "properties",
    "vmSize",
    "vmPriority",
    "scaleSettings",
    "minNodeCount",
    "maxNodeCount",
    "nodeIdleTimeBeforeScaleDown",
];

/// A flattened record.
pub type Row = IndexMap<String, Value>;

/// Lazy iterator over the leaves selected by a path.
///
/// Fused after the first error.
#[derive(Debug)]
pub struct Flatten<'a, 'p, S> {
    cursor: &'a Value,
    path: Enumerate<slice::Iter<'p, S>>,
    failed: bool,
}

/// Walk `tree` along `path`, yielding leaf pairs in path order.
///
/// The tree is never modified; each call starts a new pass.
pub fn flatten<'a, 'p, S: AsRef<str>>(tree: &'a Value, path: &'p [S]) -> Flatten<'a, 'p, S> {
    Flatten {
        cursor: tree,
        path: path.iter().enumerate(),
        failed: false,
    }
}

/// Collect the leaves selected by `path` into an ordered row.
///
/// # Errors
///
/// Returns `MalformedPath` if a key cannot be resolved.
pub fn flatten_row<S: AsRef<str>>(tree: &Value, path: &[S]) -> Result<Row> {
    flatten(tree, path)
        .map(|pair| pair.map(|(key, value)| (key.to_string(), value.clone())))
        .collect()
}

impl<'a, 'p, S: AsRef<str>> Flatten<'a, 'p, S> {
    fn fail(&mut self, key: &str, position: usize, reason: &str) -> AmlError {
        self.failed = true;
        AmlError::MalformedPath {
            key: key.to_string(),
            position,
            reason: reason.to_string(),
        }
    }
}

impl<'a, 'p, S: AsRef<str>> Iterator for Flatten<'a, 'p, S> {
    type Item = Result<(&'p str, &'a Value)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let (position, key) = self.path.next()?;
            let key = key.as_ref();
            let cursor: &'a Value = self.cursor;
            let Some(level) = cursor.as_object() else {
                return Some(Err(self.fail(key, position, "parent is not a mapping")));
            };
            match level.get(key) {
                None => return Some(Err(self.fail(key, position, "key not present"))),
                Some(branch @ Value::Object(_)) => self.cursor = branch,
                Some(leaf) => return Some(Ok((key, leaf))),
            }
        }
    }
}

impl<'a, 'p, S: AsRef<str>> std::iter::FusedIterator for Flatten<'a, 'p, S> {}

/// An owned, named path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    name: String,
    keys: Vec<String>,
}

impl PathTemplate {
    /// Create a template from its keys.
    pub fn new<I, S>(name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }

    /// Template for compute targets.
    #[must_use]
    pub fn compute_target() -> Self {
        Self::new("compute_target", COMPUTE_TARGET_PATH.iter().copied())
    }

    /// Template name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// See [`flatten`].
    pub fn flatten<'a, 'p>(&'p self, tree: &'a Value) -> Flatten<'a, 'p, String> {
        flatten(tree, self.keys.as_slice())
    }

    /// See [`flatten_row`].
    ///
    /// # Errors
    ///
    /// Returns `MalformedPath` if a key cannot be resolved.
    pub fn row(&self, tree: &Value) -> Result<Row> {
        flatten_row(tree, self.keys.as_slice())
    }
}
