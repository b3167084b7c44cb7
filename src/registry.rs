//! Container registry credentials for a workspace.
//!
//! Workspaces push images to a container registry. This module resolves
//! the registry behind a workspace and reads its address and admin
//! credentials through a [`ContainerRegistryProvider`], or extracts them
//! from a workspace `listKeys` payload.

use crate::error::{AmlError, Result};
use crate::provider::{ContainerRegistryProvider, WorkspaceProvider};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Endpoint listing a workspace's keys.
#[must_use]
pub fn keys_url(subscription_id: &str, resource_group: &str, workspace_name: &str) -> String {
    format!(
        "https://management.azure.com/subscriptions/{subscription_id}/resourceGroups/{resource_group}\
         /providers/Microsoft.MachineLearningServices/workspaces/{workspace_name}/listKeys"
    )
}

/// Address and admin credentials of a container registry.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RegistryProperties {
    /// Login server.
    pub address: String,
    /// Admin user.
    pub username: String,
    /// Admin password.
    pub password: String,
}

impl RegistryProperties {
    /// Copy with the password masked.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            password: "********".to_string(),
            ..self.clone()
        }
    }
}

impl fmt::Debug for RegistryProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryProperties")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Username and primary password from a `listKeys` payload.
///
/// # Errors
///
/// Returns `MissingField` if the payload has no registry credentials.
pub fn extract_credentials(payload: &Value) -> Result<(String, String)> {
    const CONTEXT: &str = "workspace keys";
    let creds = payload
        .get("containerRegistryCredentials")
        .ok_or_else(|| AmlError::missing_field(CONTEXT, "containerRegistryCredentials"))?;
    let username = creds
        .get("username")
        .and_then(Value::as_str)
        .ok_or_else(|| AmlError::missing_field(CONTEXT, "username"))?;
    let password = creds
        .get("passwords")
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("value"))
        .and_then(Value::as_str)
        .ok_or_else(|| AmlError::missing_field(CONTEXT, "passwords[0].value"))?;
    Ok((username.to_string(), password.to_string()))
}

/// Registry name from workspace details: the last segment of the
/// `containerRegistry` resource id.
///
/// # Errors
///
/// Returns `MissingField` if the details carry no registry id.
pub fn registry_name_from(details: &Value) -> Result<String> {
    details
        .get("containerRegistry")
        .and_then(Value::as_str)
        .and_then(|id| id.rsplit('/').next())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AmlError::missing_field("workspace details", "containerRegistry"))
}

/// Address and credentials of a registry.
///
/// # Errors
///
/// Returns provider errors, or `NotFound` if `password_index` is out of
/// range.
pub fn properties(
    provider: &dyn ContainerRegistryProvider,
    resource_group: &str,
    registry_name: &str,
    password_index: usize,
) -> Result<RegistryProperties> {
    let creds = provider.list_credentials(resource_group, registry_name)?;
    let password = creds
        .passwords
        .get(password_index)
        .cloned()
        .ok_or_else(|| AmlError::not_found("registry password", password_index.to_string()))?;
    Ok(RegistryProperties {
        address: provider.login_server(resource_group, registry_name)?,
        username: creds.username,
        password,
    })
}

/// Properties of the registry attached to `workspace`.
///
/// # Errors
///
/// See [`registry_name_from`] and [`properties`].
pub fn properties_from(
    workspace: &dyn WorkspaceProvider,
    provider: &dyn ContainerRegistryProvider,
) -> Result<RegistryProperties> {
    let name = registry_name_from(&workspace.details()?)?;
    properties(provider, workspace.resource_group(), &name, 0)
}
