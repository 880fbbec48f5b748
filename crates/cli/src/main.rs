//! `hotline`: run the call center server, talk to it, or drive an in-process
//! engine from an interactive shell.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use hotline_call_engine::logging::{log_welcome, setup_logging};
use hotline_call_engine::prelude::*;

mod connect;
mod shell;

#[derive(Parser, Debug)]
#[command(name = "hotline", author, version, about = "Hotline call center routing engine", long_about = None)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "HOTLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the engine over TCP
    Serve {
        /// Listen address
        #[arg(short, long)]
        bind: Option<String>,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Connect to a running server and send commands interactively
    Connect {
        /// Server address
        #[arg(short, long, default_value = "127.0.0.1:5678")]
        addr: String,
    },

    /// Run an engine in this process and drive it from the terminal
    Shell {
        #[command(flatten)]
        engine: EngineArgs,
    },
}

/// Engine settings that override the configuration file
#[derive(Args, Debug)]
struct EngineArgs {
    /// Number of operators (1 to 26)
    #[arg(short, long)]
    operators: Option<usize>,

    /// Ring timeout in milliseconds
    #[arg(long)]
    ring_timeout_ms: Option<u64>,

    /// Never time out ringing operators
    #[arg(long)]
    no_timeout: bool,
}

impl EngineArgs {
    fn apply(&self, config: &mut HotlineConfig) {
        if let Some(count) = self.operators {
            config.operators.count = count;
        }
        if let Some(ms) = self.ring_timeout_ms {
            config.routing.ring_timeout_ms = ms;
        }
        if self.no_timeout {
            config.routing.enable_ring_timeout = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Serve { bind, engine } => {
            if let Some(bind) = bind {
                config.server.bind_addr = bind.clone();
            }
            engine.apply(&mut config);
        }
        Commands::Shell { engine } => {
            engine.apply(&mut config);
            // Keep the terminal for command output
            config.logging.level = "warn".to_string();
        }
        Commands::Connect { .. } => {
            config.logging.level = "warn".to_string();
        }
    }
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    config.validate().context("invalid configuration")?;
    setup_logging(&config.logging)?;

    match cli.command {
        Commands::Serve { .. } => serve(config).await,
        Commands::Connect { addr } => connect::run(&addr).await,
        Commands::Shell { .. } => shell::run(&config).await,
    }
}

/// Explicit file first, then the per-user default if it exists
fn load_config(path: Option<&Path>) -> Result<HotlineConfig> {
    if let Some(path) = path {
        return HotlineConfig::load(Some(path))
            .with_context(|| format!("failed to load configuration from {}", path.display()));
    }

    let default_path = dirs::config_dir().map(|dir| dir.join("hotline").join("hotline.toml"));
    match default_path {
        Some(path) if path.exists() => HotlineConfig::load(Some(&path))
            .with_context(|| format!("failed to load configuration from {}", path.display())),
        _ => HotlineConfig::load(None).context("failed to load configuration"),
    }
}

async fn serve(config: HotlineConfig) -> Result<()> {
    log_welcome("hotline", env!("CARGO_PKG_VERSION"));

    let mut server = HotlineServerBuilder::new()
        .with_config(config)
        .build()
        .await
        .context("failed to start server")?;

    println!("📞 Hotline listening on {} (Ctrl+C to stop)", server.local_addr());

    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Received Ctrl+C, shutting down"),
                Err(e) => warn!("Failed to listen for Ctrl+C: {}", e),
            }
        })
        .await?;

    Ok(())
}
