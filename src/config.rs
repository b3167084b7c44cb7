//! Workspace configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML settings
//! file, then environment variables. The workspace config file
//! (`aml_config/azml_config.json` by default) is the JSON file the service
//! SDK reads to locate a workspace.

use crate::error::{AmlError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location of the workspace config file.
pub const DEFAULT_AML_PATH: &str = "aml_config/azml_config.json";
/// Default workspace name.
pub const DEFAULT_WORKSPACE: &str = "distributed_benchmark";
/// Default resource group.
pub const DEFAULT_RESOURCE_GROUP: &str = "msdistbenchaml";
/// Default region.
pub const DEFAULT_REGION: &str = "eastus";

const ENV_AML_PATH: &str = "DEFAULT_AML_PATH";
const ENV_WORKSPACE: &str = "WORKSPACE";
const ENV_RESOURCE_GROUP: &str = "RESOURCE_GROUP";
const ENV_SUBSCRIPTION_ID: &str = "SUBSCRIPTION_ID";
const ENV_REGION: &str = "REGION";
const ENV_SP_PASSWORD: &str = "AML_SP_PASSWORD";
const ENV_SP_TENANT: &str = "AML_SP_TENNANT_ID";
const ENV_SP_USERNAME: &str = "AML_SP_USERNAME";

/// Where to find (or create) a workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Workspace name.
    pub workspace_name: String,
    /// Resource group.
    pub resource_group: String,
    /// Subscription id; empty when unknown.
    pub subscription_id: String,
    /// Region for new workspaces.
    pub region: String,
    /// Workspace config file path.
    pub config_path: PathBuf,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            workspace_name: DEFAULT_WORKSPACE.to_string(),
            resource_group: DEFAULT_RESOURCE_GROUP.to_string(),
            subscription_id: String::new(),
            region: DEFAULT_REGION.to_string(),
            config_path: PathBuf::from(DEFAULT_AML_PATH),
        }
    }
}

impl WorkspaceConfig {
    /// Defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse TOML settings; absent keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a TOML error on malformed input.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML settings file.
    ///
    /// # Errors
    ///
    /// Returns IO or TOML errors.
    pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "reading settings");
        Self::from_toml_str(&fs::read_to_string(path)?)
    }

    /// Defaults, then `settings` if given, then the environment.
    ///
    /// # Errors
    ///
    /// Returns IO or TOML errors from the settings file.
    pub fn resolve(settings: Option<&Path>) -> Result<Self> {
        let base = match settings {
            Some(path) => Self::load_settings(path)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(v) = lookup(ENV_WORKSPACE) {
            self.workspace_name = v;
        }
        if let Some(v) = lookup(ENV_RESOURCE_GROUP) {
            self.resource_group = v;
        }
        if let Some(v) = lookup(ENV_SUBSCRIPTION_ID) {
            self.subscription_id = v;
        }
        if let Some(v) = lookup(ENV_REGION) {
            self.region = v;
        }
        if let Some(v) = lookup(ENV_AML_PATH) {
            self.config_path = PathBuf::from(v);
        }
        self
    }

    /// Subscription id, if one is configured.
    #[must_use]
    pub fn subscription(&self) -> Option<&str> {
        Some(self.subscription_id.as_str()).filter(|s| !s.is_empty())
    }

    /// Check that the names needed to address a workspace are present.
    ///
    /// # Errors
    ///
    /// Returns `Validation` naming the first empty field.
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("workspace_name", &self.workspace_name),
            ("resource_group", &self.resource_group),
            ("region", &self.region),
        ] {
            if value.trim().is_empty() {
                return Err(AmlError::Validation(format!("{field} must not be empty")));
            }
        }
        Ok(())
    }

    /// The workspace config file contents for this config.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if no subscription is configured.
    pub fn to_config_file(&self) -> Result<AmlConfigFile> {
        let subscription_id = self
            .subscription()
            .ok_or_else(|| AmlError::Validation("subscription id is required".to_string()))?;
        Ok(AmlConfigFile {
            subscription_id: subscription_id.to_string(),
            resource_group: self.resource_group.clone(),
            workspace_name: self.workspace_name.clone(),
        })
    }
}

/// Contents of the workspace config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmlConfigFile {
    /// Subscription id.
    pub subscription_id: String,
    /// Resource group.
    pub resource_group: String,
    /// Workspace name.
    pub workspace_name: String,
}

impl AmlConfigFile {
    /// Read a workspace config file.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the config file, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns IO or JSON errors.
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), "wrote workspace config");
        Ok(())
    }
}

/// How the service SDK should authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Service principal credentials.
    ServicePrincipal {
        /// Tenant id.
        tenant_id: String,
        /// Application (client) id.
        username: String,
        /// Client secret.
        password: String,
    },
    /// The Azure CLI's cached login.
    Cli,
}

impl AuthMethod {
    /// Pick a method from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Service principal when a password is present, otherwise CLI.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        match lookup(ENV_SP_PASSWORD) {
            Some(password) => Self::ServicePrincipal {
                tenant_id: lookup(ENV_SP_TENANT).unwrap_or_default(),
                username: lookup(ENV_SP_USERNAME).unwrap_or_default(),
                password,
            },
            None => Self::Cli,
        }
    }
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServicePrincipal {
                tenant_id,
                username,
                ..
            } => f
                .debug_struct("ServicePrincipal")
                .field("tenant_id", tenant_id)
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Cli => write!(f, "Cli"),
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ServicePrincipal { .. } => write!(f, "service principal"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.workspace_name, "distributed_benchmark");
        assert_eq!(config.resource_group, "msdistbenchaml");
        assert_eq!(config.region, "eastus");
        assert_eq!(config.config_path, PathBuf::from("aml_config/azml_config.json"));
        assert_eq!(config.subscription(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = WorkspaceConfig::default().with_overrides(env(&[
            ("WORKSPACE", "ws2"),
            ("SUBSCRIPTION_ID", "sub-9"),
            ("DEFAULT_AML_PATH", "/tmp/cfg.json"),
        ]));
        assert_eq!(config.workspace_name, "ws2");
        assert_eq!(config.subscription(), Some("sub-9"));
        assert_eq!(config.config_path, PathBuf::from("/tmp/cfg.json"));
        assert_eq!(config.resource_group, "msdistbenchaml");
    }

    #[test]
    fn test_toml_settings_partial() {
        let config = WorkspaceConfig::from_toml_str(
            r#"
            workspace_name = "gpu_bench"
            region = "westus2"
            "#,
        )
        .unwrap();
        assert_eq!(config.workspace_name, "gpu_bench");
        assert_eq!(config.region, "westus2");
        assert_eq!(config.resource_group, DEFAULT_RESOURCE_GROUP);

        assert!(WorkspaceConfig::from_toml_str("workspace_name = ").is_err());
    }

    #[test]
    fn test_validate_and_config_file() {
        let mut config = WorkspaceConfig::default();
        assert!(config.to_config_file().is_err());

        config.subscription_id = "sub".to_string();
        let file = config.to_config_file().unwrap();
        assert_eq!(file.workspace_name, "distributed_benchmark");

        config.workspace_name = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "validation error: workspace_name must not be empty");
    }

    #[test]
    fn test_config_file_roundtrip_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aml_config").join("azml_config.json");
        let file = AmlConfigFile {
            subscription_id: "sub".to_string(),
            resource_group: "rg".to_string(),
            workspace_name: "ws".to_string(),
        };
        file.write(&path).unwrap();
        assert_eq!(AmlConfigFile::load(&path).unwrap(), file);
    }

    #[test]
    fn test_auth_method_selection() {
        assert_eq!(AuthMethod::from_lookup(env(&[])), AuthMethod::Cli);

        let auth = AuthMethod::from_lookup(env(&[
            ("AML_SP_PASSWORD", "s3cret"),
            ("AML_SP_TENNANT_ID", "tenant"),
            ("AML_SP_USERNAME", "app"),
        ]));
        assert_eq!(auth.to_string(), "service principal");
        let debug = format!("{auth:?}");
        assert!(debug.contains("tenant"));
        assert!(!debug.contains("s3cret"));
    }
}
