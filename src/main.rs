//! amlkit CLI - browse ML workspace experiments, runs and compute

use amlkit::cli;
use amlkit::prelude::*;
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "amlkit")]
#[command(author, version, about = "Browse ML workspace experiments, runs and compute", long_about = None)]
struct Cli {
    /// Workspace snapshot file (JSON)
    #[arg(long, global = true, env = "AMLKIT_SNAPSHOT")]
    snapshot: Option<PathBuf>,

    /// Settings file (TOML)
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Print tables as JSON records
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show workspace identification
    Workspace,
    /// List runs of every experiment
    Experiments,
    /// List runs of one experiment
    Runs {
        /// Experiment name
        experiment: String,
        /// Keep polling until interrupted
        #[arg(long, short)]
        watch: bool,
        /// Seconds between polls
        #[arg(long, short, default_value_t = 5)]
        interval: u64,
    },
    /// Show details of one run
    Run {
        /// Experiment name
        experiment: String,
        /// Run id
        run_id: String,
    },
    /// List log files of one run
    Logs {
        /// Experiment name
        experiment: String,
        /// Run id
        run_id: String,
    },
    /// List compute targets
    Compute,
    /// List visible subscriptions
    Subscriptions,
    /// Show the workspace container registry
    Registry {
        /// Print the admin password in clear
        #[arg(long)]
        show_password: bool,
    },
    /// Show resolved configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn open_snapshot(path: Option<PathBuf>) -> amlkit::Result<SnapshotWorkspace> {
    let path = path.ok_or_else(|| {
        AmlError::Validation("no workspace snapshot given (--snapshot or AMLKIT_SNAPSHOT)".into())
    })?;
    SnapshotWorkspace::open(path)
}

fn run(cli: Cli) -> amlkit::Result<()> {
    let json = cli.json;

    match cli.command {
        Commands::Config => {
            let config = WorkspaceConfig::resolve(cli.settings.as_deref())?;
            config.validate()?;
            print!("{}", cli::format_config(&config, &AuthMethod::from_env()));
        }
        Commands::Subscriptions => {
            let provider = open_snapshot(cli.snapshot)?;
            print!("{}", cli::handle_subscriptions(&provider, json)?);
        }
        Commands::Registry { show_password } => {
            let provider = open_snapshot(cli.snapshot)?;
            print!(
                "{}",
                cli::handle_registry(&provider, &provider, show_password, json)?
            );
        }
        command => {
            let mut workspace = Workspace::new(Arc::new(open_snapshot(cli.snapshot)?));
            handle_workspace(&mut workspace, command, json)?;
        }
    }

    Ok(())
}

fn handle_workspace(workspace: &mut Workspace, command: Commands, json: bool) -> amlkit::Result<()> {
    match command {
        Commands::Workspace => print!("{}", cli::format_workspace(workspace)),
        Commands::Experiments => print!("{}", cli::handle_experiments(workspace, json)?),
        Commands::Runs {
            experiment,
            watch,
            interval,
        } => {
            if !watch {
                print!("{}", cli::handle_runs(workspace, &experiment, json)?);
                return Ok(());
            }
            let options = MonitorOptions {
                watch,
                interval: Duration::from_secs(interval),
            };
            let experiment = workspace.experiments.lookup_mut(&experiment)?;
            experiment.monitor(&options, &mut io::stdout(), || false)?;
        }
        Commands::Run { experiment, run_id } => {
            print!("{}", cli::handle_run(workspace, &experiment, &run_id)?);
        }
        Commands::Logs { experiment, run_id } => {
            print!("{}", cli::handle_logs(workspace, &experiment, &run_id, json)?);
        }
        Commands::Compute => print!("{}", cli::handle_compute(workspace, json)?),
        Commands::Config | Commands::Subscriptions | Commands::Registry { .. } => {}
    }
    Ok(())
}
