//! Omnichain Token Relay Service
//!
//! Deploys the configured network, runs the relay worker, performs the configured
//! startup deposits and reports how each one was delivered.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin oft-relay -- --config config/oft-relay.toml
//! ```
//!
//! Or set the config path via environment variable:
//!
//! ```bash
//! OFT_RELAY_CONFIG_PATH=config/oft-relay.toml cargo run --bin oft-relay
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use oft_core::{DeliveryStatus, Network};
use oft_relay::config::{parse_field_address, Config, CONFIG_PATH_ENV};
use oft_relay::{build_network, execute_transfer, Relay, RelayTransport};
use tokio::signal;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "oft-relay")]
#[command(about = "Deploys an omnichain token network and relays messages between its chains")]
struct Args {
    /// Path to configuration file (default: config/oft-relay.toml or OFT_RELAY_CONFIG_PATH env var)
    #[arg(short, long)]
    config: Option<String>,

    /// Use the built-in two-chain configuration instead of a file
    #[arg(long, conflicts_with = "config")]
    local: bool,
}

// ============================================================================
// MAIN APPLICATION ENTRY POINT
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting Omnichain Token Relay");

    // Priority: --local > CLI arg > env var > default
    let config = if args.local {
        info!("Using built-in local configuration");
        let config = Config::default();
        config.validate()?;
        config
    } else if let Some(path) = args.config {
        info!("Loading configuration from: {}", path);
        Config::load_from(Path::new(&path))?
    } else {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            info!("Loading configuration from {}: {}", CONFIG_PATH_ENV, path);
        }
        Config::load()?
    };
    info!(
        "Configuration loaded: {} chains, {} transfers",
        config.chains.len(),
        config.transfers.len()
    );

    let (transport, inbox) = RelayTransport::channel();
    let network = Arc::new(RwLock::new(build_network(&config, transport)?));

    let relay = Relay::new(network.clone(), inbox, &config.relay);
    let mut reports = relay.subscribe();
    let worker = relay.spawn();

    let mut expected = 0usize;
    for transfer in &config.transfers {
        let mut guard = network.write().await;
        match execute_transfer(&config, &mut guard, transfer) {
            Ok(_) => expected += 1,
            Err(e) => error!("Transfer failed: {:#}", e),
        }
    }

    // Held messages are reported again once released, so they do not count.
    let mut settled = 0usize;
    while settled < expected {
        tokio::select! {
            report = reports.recv() => match report {
                Ok(report) => {
                    if report.status != DeliveryStatus::Held {
                        settled += 1;
                    }
                    info!(
                        "Delivered 0x{}: {}",
                        hex::encode(report.guid.as_bytes()),
                        serde_json::to_string(&report.status)?
                    );
                }
                Err(e) => {
                    warn!("Delivery reports unavailable: {}", e);
                    break;
                }
            },
            _ = signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    summarize(&config, &*network.read().await)?;
    worker.abort();
    Ok(())
}

/// Log pending deliveries and vault balances of every configured beneficiary.
fn summarize(config: &Config, network: &Network<RelayTransport>) -> Result<()> {
    for chain_config in &config.chains {
        let chain = network.chain(chain_config.chain_id)?;
        info!(
            "Chain {} ({}): locked={}, pending_deliveries={}",
            chain_config.chain_id,
            chain_config.name,
            chain.token().locked(),
            chain.pending_deliveries().count()
        );

        let Some(vault_config) = &chain_config.vault else {
            continue;
        };
        let vault = chain.vault(&parse_field_address("vault.address", &vault_config.address)?)?;
        for transfer in config
            .transfers
            .iter()
            .filter(|t| t.dst_chain_id == chain_config.chain_id)
        {
            let beneficiary = parse_field_address("beneficiary", &transfer.beneficiary)?;
            info!(
                "  vault balance of {}: {}",
                transfer.beneficiary,
                vault.balance_of(&beneficiary)
            );
        }
    }
    Ok(())
}
