//! Crewflow: simulated agent crew workflows in the terminal and over HTTP.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crewflow_console::commands;
use crewflow_console::file_server::FileServer;
use crewflow_console::operator_console::run_operator_console;
use crewflow_console::{spawn_runner, Config, DashboardState};

/// Crewflow - agent crew workflow simulator
#[derive(Parser)]
#[command(name = "crewflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Simulate agent crews working through their workflows")]
#[command(long_about = r#"
Crewflow simulates crews of agents handing work to each other and draws the
resulting workflow graph.

Examples:
  crewflow console --system content          # Terminal dashboard for one crew
  crewflow serve                             # HTTP API for every crew
  crewflow run --system sales --ticks 50     # Headless run, prints JSON
  crewflow systems                           # List known crews
"#)]
struct Cli {
    /// Config file (defaults to ~/.crewflow/config.toml)
    #[arg(short, long, env = "CREWFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal dashboard
    Console {
        /// Systems to load; all catalog systems when omitted
        #[arg(short, long)]
        system: Vec<String>,
    },

    /// Serve the HTTP API and WebSocket stream
    Serve {
        /// Override `[server].bind_addr`
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run a simulation without a timer and print the final state as JSON
    Run {
        #[arg(short, long)]
        system: String,

        #[arg(short, long, default_value = "20")]
        ticks: u64,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },

    /// List the agent systems in the catalog
    Systems,
}

fn init_tracing(verbose: bool, quiet: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("crewflow={level},warn").into());
    let registry = tracing_subscriber::registry().with(filter);

    // The terminal UI owns stdout; logging to it would corrupt the screen.
    if quiet {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

async fn load_state(config: &Config, system_ids: &[String]) -> Result<Arc<RwLock<DashboardState>>> {
    let catalog = config.catalog();
    let ids = if system_ids.is_empty() {
        catalog.ids()
    } else {
        system_ids.to_vec()
    };
    let source = config.workflow_source();
    let state = DashboardState::load(&catalog, source.as_ref(), &ids, &config.simulation)
        .await
        .context("loading agent systems")?;
    Ok(Arc::new(RwLock::new(state)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, matches!(cli.command, Commands::Console { .. }));

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Console { system } => {
            let state = load_state(&config, &system).await?;
            let ids: Vec<String> = state
                .read()
                .await
                .sessions()
                .map(|s| s.system().id.clone())
                .collect();
            let runner = spawn_runner(state.clone(), config.simulation.tick_interval());
            let result = run_operator_console(state, order_like(&system, ids)).await;
            runner.shutdown().await;
            result?;
        }
        Commands::Serve { bind } => {
            let state = load_state(&config, &[]).await?;
            let runner = spawn_runner(state.clone(), config.simulation.tick_interval());
            let shutdown = runner.cancellation_token();
            tokio::spawn({
                let shutdown = shutdown.clone();
                async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        tracing::info!("Shutdown requested");
                    }
                    shutdown.cancel();
                }
            });

            let server = FileServer::new(
                bind.unwrap_or_else(|| config.server.bind_addr.clone()),
                state,
                Duration::from_millis(config.server.stream_interval_ms),
            );
            let result = server.run(shutdown).await;
            runner.shutdown().await;
            result?;
        }
        Commands::Run {
            system,
            ticks,
            seed,
        } => {
            let output = commands::run_headless(&config, &system, ticks, seed).await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Commands::Systems => {
            for line in commands::system_lines(&config) {
                println!("{line}");
            }
        }
    }

    Ok(())
}

/// Keep the order the user asked for; loaded sessions are otherwise sorted by id.
fn order_like(requested: &[String], loaded: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        return loaded;
    }
    requested
        .iter()
        .filter(|id| loaded.contains(id))
        .cloned()
        .collect()
}
