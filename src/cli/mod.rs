//! CLI command handlers.
//!
//! This module contains the business logic for CLI commands,
//! separated from argument parsing for testability.

use crate::config::{AuthMethod, WorkspaceConfig};
use crate::prelude::*;
use crate::registry::{self, RegistryProperties};
use crate::subscription::subscription_table;
use serde_json::Value;
use std::fmt::Write;

/// Render a table as text, or as JSON records.
pub fn format_table(table: &Table, json: bool) -> Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(table)?;
        out.push('\n');
        Ok(out)
    } else {
        Ok(table.render())
    }
}

/// Workspace identification lines.
pub fn format_workspace(workspace: &Workspace) -> String {
    let mut out = workspace.summary();
    out.push('\n');
    out
}

/// Runs of every experiment.
pub fn handle_experiments(workspace: &mut Workspace, json: bool) -> Result<String> {
    format_table(&workspace.experiments_to_table()?, json)
}

/// Runs of one experiment.
pub fn handle_runs(workspace: &mut Workspace, experiment: &str, json: bool) -> Result<String> {
    let experiment = workspace.experiments.lookup_mut(experiment)?;
    format_table(&experiment.runs_to_table()?, json)
}

/// Details and log file names of one run.
pub fn handle_run(workspace: &mut Workspace, experiment: &str, run_id: &str) -> Result<String> {
    let experiment = workspace.experiments.lookup_mut(experiment)?;
    let run = experiment.runs.lookup_mut(run_id)?;

    let mut out = String::new();
    let _ = writeln!(out, "{}", run.summary()?);
    let details = run.details_for(&["target", "runType"])?;
    for (key, value) in &details {
        if !value.is_null() {
            let _ = writeln!(out, "  {key}: {}", crate::table::cell(value));
        }
    }
    match run.logs.len() {
        Ok(0) => out.push_str("  Logs: none\n"),
        Ok(count) => {
            let _ = writeln!(out, "  Logs ({count}):");
            for name in run.logs.keys()? {
                let _ = writeln!(out, "    {name}");
            }
        }
        Err(AmlError::MissingField { .. }) => out.push_str("  Logs: not available\n"),
        Err(e) => return Err(e),
    }
    Ok(out)
}

/// Log file locations of one run.
pub fn handle_logs(
    workspace: &mut Workspace,
    experiment: &str,
    run_id: &str,
    json: bool,
) -> Result<String> {
    let experiment = workspace.experiments.lookup_mut(experiment)?;
    let run = experiment.runs.lookup_mut(run_id)?;
    let mut table = Table::new(["file", "location"]);
    for (name, location) in run.logs.iter()? {
        table.push_record(
            [
                ("file".to_string(), Value::from(name.as_str())),
                ("location".to_string(), Value::from(location.as_str())),
            ]
            .into_iter()
            .collect(),
        );
    }
    format_table(&table, json)
}

/// Flattened compute targets.
pub fn handle_compute(workspace: &mut Workspace, json: bool) -> Result<String> {
    format_table(&workspace.compute_targets_to_table()?, json)
}

/// Visible subscriptions.
pub fn handle_subscriptions(provider: &dyn SubscriptionProvider, json: bool) -> Result<String> {
    format_table(&subscription_table(provider)?, json)
}

/// Container registry of a workspace.
pub fn handle_registry(
    workspace: &dyn WorkspaceProvider,
    registries: &dyn ContainerRegistryProvider,
    show_password: bool,
    json: bool,
) -> Result<String> {
    let props = registry::properties_from(workspace, registries)?;
    let props = if show_password { props } else { props.redacted() };
    if json {
        let mut out = serde_json::to_string_pretty(&props)?;
        out.push('\n');
        return Ok(out);
    }
    Ok(format_registry(&props))
}

/// Format registry properties for display.
pub fn format_registry(props: &RegistryProperties) -> String {
    let mut out = String::new();
    out.push_str("Container Registry:\n");
    let _ = writeln!(out, "  Address:  {}", props.address);
    let _ = writeln!(out, "  Username: {}", props.username);
    let _ = writeln!(out, "  Password: {}", props.password);
    out
}

/// Format resolved configuration for display.
pub fn format_config(config: &WorkspaceConfig, auth: &AuthMethod) -> String {
    let mut out = String::new();
    out.push_str("Configuration:\n");
    let _ = writeln!(out, "  Workspace:      {}", config.workspace_name);
    let _ = writeln!(out, "  Resource group: {}", config.resource_group);
    let _ = writeln!(
        out,
        "  Subscription:   {}",
        config.subscription().unwrap_or("(not set)")
    );
    let _ = writeln!(out, "  Region:         {}", config.region);
    let _ = writeln!(out, "  Config file:    {}", config.config_path.display());
    let _ = writeln!(out, "  Auth:           {auth}");
    out
}
