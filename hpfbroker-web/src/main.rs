//! HPFBroker management server
//!
//! Loads the TOML configuration, applies environment and command-line
//! overrides, then serves the management API.

use anyhow::{anyhow, Context};
use clap::Parser;
use hpfbroker_core::{init_logging, BrokerConfig};
use hpfbroker_web::BrokerServer;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "hpfbroker")]
#[command(about = "Management API for the HPFBroker hpfeeds broker")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Address for the HTTP API, overrides http.addr
    #[arg(long)]
    addr: Option<String>,

    /// Database file, overrides database.path
    #[arg(long)]
    db_path: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(&self, config: &mut BrokerConfig) {
        if let Some(addr) = &self.addr {
            config.http.addr = addr.clone();
        }
        if let Some(path) = &self.db_path {
            config.database.path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = BrokerConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    config.apply_env_overrides()?;
    args.apply(&mut config);
    config.validate()?;

    init_logging(&config.logging).map_err(|e| anyhow!("failed to initialise logging: {}", e))?;

    info!("Starting hpfbroker {}", env!("CARGO_PKG_VERSION"));
    info!(database = %config.database.path, "Opening store");

    let server = BrokerServer::new(config).await?;
    server.start().await?;

    Ok(())
}
