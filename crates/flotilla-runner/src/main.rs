//! Flotilla CLI - run a task definition file.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use flotilla_core::TaskDefinition;
use flotilla_runner::{output, OutputFormat, RunnerConfig};

/// Flotilla - run a batch of tasks, one container each
#[derive(Parser)]
#[command(name = "flotilla")]
#[command(about = "Run a batch of containerized tasks concurrently", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every task in a definition file
    Run {
        /// Path to the task definition YAML
        file: PathBuf,

        /// Container engine endpoint (defaults to DOCKER_HOST or the local socket)
        #[arg(long)]
        docker_host: Option<String>,

        /// Maximum tasks running at once (0 = unbounded)
        #[arg(long, env = "FLOTILLA_MAX_CONCURRENT", default_value_t = 0)]
        max_concurrent: usize,

        /// Cancel tasks still running after this many seconds (0 = no deadline)
        #[arg(long, env = "FLOTILLA_TIMEOUT", default_value_t = 0)]
        timeout: u64,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run {
            file,
            docker_host,
            max_concurrent,
            timeout,
            json,
        } => {
            let mut config = RunnerConfig::default()
                .with_max_concurrent_tasks(max_concurrent)
                .with_timeout_secs(timeout)
                .with_output(if json { OutputFormat::Json } else { OutputFormat::Text });
            if let Some(host) = docker_host {
                config = config.with_docker_host(host);
            }

            run(file, config).await
        }
    }
}

async fn run(file: PathBuf, config: RunnerConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let definition = TaskDefinition::load(&file)?;
    info!(
        file = %file.display(),
        version = %definition.version,
        tasks = definition.len(),
        "Loaded task definition"
    );

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(cancel.clone(), config.timeout);

    let summary = flotilla_runner::run(&definition, &config, cancel.clone()).await?;
    cancel.cancel();

    output::emit(&summary, config.output)?;

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Cancel the run on Ctrl-C or when the deadline passes.
fn spawn_cancel_triggers(cancel: CancellationToken, timeout: Option<Duration>) {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };
        let interrupted = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = interrupted => {
                warn!("Interrupted, cancelling running tasks");
                cancel.cancel();
            }
            _ = deadline => {
                warn!(
                    timeout_secs = timeout.map(|t| t.as_secs()).unwrap_or_default(),
                    "Run deadline reached, cancelling running tasks"
                );
                cancel.cancel();
            }
        }
    });
}
