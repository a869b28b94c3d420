// src/bin/resdb-gateway.rs
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use resdb_gateway::config::{GatewayConfig, LedgerMode};
use resdb_gateway::service::Keys;
use resdb_gateway::{api, build_ledger, Gateway};
use std::collections::HashMap;
use std::env;
use tracing::info;
use tracing_subscriber::EnvFilter;
use yansi::Paint;

#[derive(Parser)]
#[command(name = "resdb-gateway", about = "Record gateway over a ResilientDB ledger", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the gateway API
    Serve {
        /// Ledger base URL (overrides RESDB_URL)
        #[arg(long)]
        resdb_url: Option<String>,

        /// Listen address (overrides API_ADDR)
        #[arg(long)]
        api_addr: Option<String>,

        /// Ledger backend: http or memory (overrides LEDGER_MODE)
        #[arg(long)]
        ledger: Option<String>,
    },

    /// Validate configuration and exit
    CheckConfig,

    /// Print a fresh Ed25519 key pair
    Keys,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            resdb_url,
            api_addr,
            ledger,
        } => {
            let mut overrides = HashMap::new();
            if let Some(v) = resdb_url {
                overrides.insert("RESDB_URL", v);
            }
            if let Some(v) = api_addr {
                overrides.insert("API_ADDR", v);
            }
            if let Some(v) = ledger {
                overrides.insert("LEDGER_MODE", v);
            }

            let (config, validation) = GatewayConfig::from_lookup(|key| {
                overrides.get(key).cloned().or_else(|| env::var(key).ok())
            });
            validation.print_summary();
            if !validation.valid {
                bail!("invalid configuration");
            }
            serve(config).await?;
        }

        Commands::CheckConfig => {
            let (_, validation) = GatewayConfig::from_env();
            validation.print_summary();
            if !validation.valid {
                bail!("invalid configuration");
            }
        }

        Commands::Keys => {
            let keys: Keys = resdb_sdk::generate_keypair().into();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
    }

    Ok(())
}

async fn serve(config: GatewayConfig) -> anyhow::Result<()> {
    let ledger = build_ledger(&config).context("failed to build ledger client")?;
    let gateway = Gateway::new(ledger);
    let router = api::router(gateway);

    let backend = match config.ledger_mode {
        LedgerMode::Http => config.resdb_url.clone(),
        LedgerMode::Memory => "in-memory".to_string(),
    };
    println!(
        "{} API -> http://{}   ledger -> {}",
        Paint::blue("[starting]").bold(),
        config.api_addr,
        backend
    );

    axum::Server::bind(&config.api_addr)
        .serve(router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server crashed")?;

    info!("gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
