//! dockmon - a terminal dashboard for Docker hosts
//!
//! Shows host CPU/RAM and every container's state, ports, uptime and
//! memory in one live table, with single-key lifecycle commands.

mod actions;
mod config;
mod core;
mod integrations;
mod ui;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::core::app::App;
use crate::core::snapshot::SnapshotBuilder;
use crate::integrations::docker::{ContainerRuntime, DockerClient};
use crate::integrations::ports::IptablesNat;

#[derive(Parser)]
#[command(name = "dockmon")]
#[command(version = "0.1.0")]
#[command(about = "Terminal dashboard for Docker hosts", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Refresh interval in seconds (overrides config)
    #[arg(short, long, value_name = "SECS")]
    interval: Option<u64>,

    /// Docker socket path (overrides config)
    #[arg(short, long, value_name = "PATH")]
    socket: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the container table once and exit
    Ps,
}

fn setup_logging(verbosity: u8) -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // The terminal is taken over by the TUI, so logs go to a file.
    let log_dir = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dockmon")
        .join("logs");

    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "dockmon.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(guard)
}

async fn connect_runtime(socket: Option<&str>) -> Result<Arc<dyn ContainerRuntime>> {
    let client = match socket {
        Some(path) => DockerClient::with_socket(path)?,
        None => DockerClient::new()?,
    };
    let runtime: Arc<dyn ContainerRuntime> = Arc::new(client);

    tokio::time::timeout(Duration::from_secs(5), runtime.ping())
        .await
        .context("timed out connecting to the container runtime")?
        .context("cannot reach the container runtime (is the Docker daemon running?)")?;

    Ok(runtime)
}

async fn print_containers(runtime: Arc<dyn ContainerRuntime>, config: &config::Config) -> Result<()> {
    let builder = SnapshotBuilder::new(
        runtime,
        Arc::new(IptablesNat),
        config.refresh.stats_workers,
        Duration::from_millis(config.refresh.call_timeout_ms),
    );
    let containers = builder.build().await?;

    println!(
        "{:<13}{:<20}{:<24}{:<24}{:<11}{:<9}{}",
        "ID", "NAME", "IMAGE", "PORTS", "STATUS", "UPTIME", "RAM"
    );
    for container in &containers {
        println!(
            "{:<13}{:<20}{:<24}{:<24}{:<11}{:<9}{}",
            container.short_id(),
            container.name,
            container.image,
            container.ports_display(),
            container.status,
            container.uptime_display(),
            humansize::format_size(container.memory_bytes, humansize::BINARY),
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive for the duration of the program
    let _logging_guard = setup_logging(cli.verbose)?;

    let config_path = cli.config.or_else(|| {
        let default_config = config::Config::default_path()?;
        default_config.exists().then_some(default_config)
    });

    let mut config = if let Some(path) = config_path {
        config::Config::load(&path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?
    } else {
        config::Config::default()
    };

    if let Some(interval) = cli.interval {
        config.refresh.interval_secs = interval;
    }
    if let Some(socket) = cli.socket {
        config.docker.socket = Some(socket);
    }

    let runtime = connect_runtime(config.docker.socket.as_deref()).await?;

    match cli.command {
        Some(Commands::Ps) => {
            print_containers(runtime, &config).await?;
        }
        None => {
            let mut app = App::new(runtime, config)?;
            app.run().await?;
        }
    }

    Ok(())
}
