//! Error types for amlkit operations.

use thiserror::Error;

/// Result type alias for amlkit operations.
pub type Result<T> = std::result::Result<T, AmlError>;

/// Errors that can occur while browsing a workspace.
#[derive(Error, Debug)]
pub enum AmlError {
    /// Key, attribute or entity absent after population.
    #[error("not found: {kind} '{name}'")]
    NotFound {
        /// Kind of entry (experiment, run, compute target, ...).
        kind: String,
        /// Name that was requested.
        name: String,
    },

    /// A provider call failed. Carried through collections untouched.
    #[error("provider error: {0}")]
    Provider(String),

    /// A flattening path could not be resolved against the tree.
    #[error("malformed path: key '{key}' at position {position}: {reason}")]
    MalformedPath {
        /// Path key that failed to resolve.
        key: String,
        /// Zero-based position of the key in the path.
        position: usize,
        /// What went wrong.
        reason: String,
    },

    /// A provider payload lacks a required field.
    #[error("{context}: missing field '{field}'")]
    MissingField {
        /// What was being read.
        context: String,
        /// Field that is absent.
        field: String,
    },

    /// Invalid argument or configuration value.
    #[error("validation error: {0}")]
    Validation(String),

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization failed.
    #[error("TOML error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),
}

impl AmlError {
    /// Shorthand for a [`AmlError::NotFound`].
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Shorthand for a [`AmlError::MissingField`].
    pub fn missing_field(context: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            context: context.into(),
            field: field.into(),
        }
    }

    /// Whether this is a not-found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
