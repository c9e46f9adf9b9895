//! # beacon-node
//!
//! Beacon control-plane server binary — opens the registry database, runs
//! migrations, seeds the bootstrap credential, and serves HTTP until SIGINT.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use beacon_registry::{ConnectionConfig, Registry};
use beacon_server::{BeaconServer, ServerConfig};

/// Beacon control-plane server.
#[derive(Parser, Debug)]
#[command(name = "beacon-node", about = "Beacon control-plane server")]
struct Cli {
    /// Host to bind.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind (0 for auto-assign).
    #[arg(long, default_value = "7332")]
    port: u16,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// API credential seeded into the registry at startup.
    #[arg(long, env = "BEACON_API_KEY")]
    bootstrap_key: Option<String>,

    /// Path prefix the access gate leaves open for signaling traffic.
    #[arg(long, default_value = "/signal")]
    signaling_path: String,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".beacon").join("beacon.db")
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();

    let db_path = args.db_path.unwrap_or_else(Cli::default_db_path);
    ensure_parent_dir(&db_path)?;
    let registry = Registry::open(&db_path.to_string_lossy(), &ConnectionConfig::default())
        .context("Failed to open registry database")?;

    if args.bootstrap_key.is_none() {
        tracing::warn!("no bootstrap key configured — only pre-seeded credentials will work");
    }

    let config = ServerConfig {
        host: args.host,
        port: args.port,
        signaling_path: args.signaling_path,
        bootstrap_api_key: args.bootstrap_key,
    };
    let server = BeaconServer::new(config, registry).context("Failed to build server")?;

    let (addr, handle) = server.listen().await.context("Failed to bind server")?;
    tracing::info!("Beacon control plane listening on http://{addr}");

    server.shutdown().cancel_on_ctrl_c().await;

    tracing::info!("Shutting down...");
    server.shutdown().drain(vec![handle], None).await;

    tracing::info!("Shutdown complete");
    Ok(())
}
