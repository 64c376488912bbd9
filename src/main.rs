//! CLI Entry Point for port-registry
//!
//! Runs the registry against the simulated controller described in the
//! configuration file:
//! - `status`: print the binding table after initialization
//! - `check`: validate every expected port once
//! - `watch`: poll expected ports until Ctrl-C
//! - `config`: print the effective configuration
//!
//! # Usage
//!
//! ```bash
//! port-registry check --config config/port_registry.toml
//! port-registry status --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use port_registry::config::{RegistryConfig, DEFAULT_CONFIG_PATH};
use port_registry::hardware::{port_number, MockProbe, PortRegistry, PortWarningFlags};
use port_registry::logging;
use port_registry::monitor::PortMonitor;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Parser)]
#[command(name = "port-registry")]
#[command(about = "Smart-port registry with plug reconciliation", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize and print the binding table
    Status {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Validate every expected port once (non-zero exit on any fault)
    Check,

    /// Poll expected ports until Ctrl-C
    Watch,

    /// Print the effective configuration (file + environment) as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = RegistryConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;

    if let Commands::Config = cli.command {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    logging::init_from_config(&config)?;

    let probe = Arc::new(MockProbe::from_config(&config.simulation)?);
    let registry = Arc::new(PortRegistry::new(
        probe,
        Arc::new(PortWarningFlags::new()),
        config.registry.warning_reset,
    ));
    registry.initialize().await;

    match cli.command {
        Commands::Status { json } => print_status(&registry, json),
        Commands::Check => run_check(registry, &config).await,
        Commands::Watch => run_watch(registry, &config).await,
        Commands::Config => Ok(()),
    }
}

fn print_status(registry: &PortRegistry, json: bool) -> Result<()> {
    let report = registry.status_report();
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<6} {:<10} {:<10} handle", "port", "bound", "plugged");
    for status in report {
        let handle = status
            .handle
            .map(|raw| format!("{raw:#x}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<10} {:<10} {}",
            status.port, status.bound, status.plugged, handle
        );
    }
    Ok(())
}

async fn run_check(registry: Arc<PortRegistry>, config: &RegistryConfig) -> Result<()> {
    let monitor = PortMonitor::from_config(registry, config)?;
    let report = monitor.poll_once().await?;

    for (port, outcome) in &report.outcomes {
        println!("port {:<3} {}", port_number(*port), outcome.as_str());
    }

    if !report.all_consistent() {
        anyhow::bail!("{} port(s) not consistent", report.faulty().count());
    }
    Ok(())
}

async fn run_watch(registry: Arc<PortRegistry>, config: &RegistryConfig) -> Result<()> {
    let monitor = PortMonitor::from_config(registry, config)?;
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let polls = monitor.run(shutdown_rx).await?;
    println!("Stopped after {polls} polls");
    Ok(())
}
