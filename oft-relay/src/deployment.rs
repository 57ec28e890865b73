//! Deployment Module
//!
//! Builds a [`Network`] from a validated [`Config`]: deploys each chain's token and
//! vault, installs prices and gas minimums, mints genesis balances, then connects
//! every pair of chains (trusted remotes between tokens, remote staking contracts
//! between vaults).

use anyhow::{anyhow, Context, Result};
use oft_core::{
    AdapterParams, Chain, DeliveryReceipt, MessageTransport, Network, TokenConfig,
    PT_SEND_AND_CALL,
};
use tracing::info;

use crate::config::{parse_amount, parse_field_address, ChainConfig, Config, TransferConfig};

// ============================================================================
// NETWORK CONSTRUCTION
// ============================================================================

/// Deploy every configured chain onto `transport` and connect them pairwise.
pub fn build_network<T: MessageTransport>(config: &Config, transport: T) -> Result<Network<T>> {
    let mut network = Network::new(transport);

    for chain_config in &config.chains {
        let chain = deploy_chain(chain_config)
            .with_context(|| format!("Failed to deploy chain '{}'", chain_config.name))?;
        network.add_chain(chain)?;
    }

    for (index, a) in config.chains.iter().enumerate() {
        for b in &config.chains[index + 1..] {
            network.pair_tokens(a.chain_id, b.chain_id)?;
            if let (Some(vault_a), Some(vault_b)) = (&a.vault, &b.vault) {
                network.pair_vaults(
                    a.chain_id,
                    parse_field_address("vault.address", &vault_a.address)?,
                    b.chain_id,
                    parse_field_address("vault.address", &vault_b.address)?,
                )?;
            }
            info!("Connected chain {} <-> chain {}", a.chain_id, b.chain_id);
        }
    }

    Ok(network)
}

fn deploy_chain(config: &ChainConfig) -> Result<Chain> {
    let owner = parse_field_address("owner", &config.owner)?;
    let mut chain = Chain::new(
        config.chain_id,
        TokenConfig {
            address: parse_field_address("token_address", &config.token_address)?,
            owner,
            custody: config.custody,
            local_decimals: config.local_decimals,
            shared_decimals: config.shared_decimals,
        },
    )?;

    if let Some(vault) = &config.vault {
        let address = parse_field_address("vault.address", &vault.address)?;
        let vault_owner = parse_field_address("vault.owner", &vault.owner)?;
        chain.deploy_vault(address, vault_owner)?;
        chain.set_dst_gas_for_call(&vault_owner, &address, vault.dst_gas_for_call)?;
    }

    for price in &config.gas_prices {
        chain.set_dst_price(&owner, price.dst_chain_id, price.to_dst_price())?;
    }
    for min_gas in &config.min_dst_gas {
        chain.set_min_dst_gas(&owner, min_gas.dst_chain_id, min_gas.packet_type, min_gas.min_gas)?;
    }
    chain.set_use_custom_adapter_params(&owner, config.use_custom_adapter_params)?;

    for balance in &config.genesis {
        let account = parse_field_address("genesis.account", &balance.account)?;
        chain.mint(&owner, account, parse_amount(&balance.amount)?)?;
    }

    info!(
        "Deployed chain {} ({}): token={}, custody={:?}, vault={}",
        config.chain_id,
        config.name,
        config.token_address,
        config.custody,
        config.vault.as_ref().map(|v| v.address.as_str()).unwrap_or("none")
    );
    Ok(chain)
}

// ============================================================================
// STARTUP TRANSFERS
// ============================================================================

/// Adapter params a deposit from `chain` to `dst_chain_id` is sent with.
///
/// Empty unless the chain uses custom adapter params, in which case the gas is
/// `adapter_gas` or, if absent, the configured minimum plus the vault's gas for call.
pub fn deposit_adapter_params(
    chain: &Chain,
    vault: &ethereum_types::Address,
    dst_chain_id: oft_core::ChainId,
    adapter_gas: Option<u64>,
) -> Result<Vec<u8>> {
    if !chain.token().use_custom_adapter_params() {
        return Ok(Vec::new());
    }
    let gas = match adapter_gas {
        Some(gas) => gas,
        None => chain
            .token()
            .min_dst_gas(dst_chain_id, PT_SEND_AND_CALL)
            .checked_add(chain.vault(vault)?.dst_gas_for_call())
            .ok_or_else(|| anyhow!("Adapter gas overflows u64"))?,
    };
    Ok(AdapterParams::v1(gas).encode())
}

/// Approve and deposit one configured transfer, paying exactly the quoted fee.
pub fn execute_transfer<T: MessageTransport>(
    config: &Config,
    network: &mut Network<T>,
    transfer: &TransferConfig,
) -> Result<DeliveryReceipt> {
    let src_config = config
        .chain(transfer.src_chain_id)
        .ok_or_else(|| anyhow!("Unknown source chain {}", transfer.src_chain_id))?;
    let vault_config = src_config
        .vault
        .as_ref()
        .ok_or_else(|| anyhow!("Chain {} has no vault", transfer.src_chain_id))?;

    let vault = parse_field_address("vault.address", &vault_config.address)?;
    let depositor = parse_field_address("depositor", &transfer.depositor)?;
    let beneficiary = parse_field_address("beneficiary", &transfer.beneficiary)?;
    let amount = parse_amount(&transfer.amount)?;

    let chain = network.chain_mut(transfer.src_chain_id)?;
    let params = deposit_adapter_params(chain, &vault, transfer.dst_chain_id, transfer.adapter_gas)?;
    let fee = chain.quote_deposit(&vault, transfer.dst_chain_id, beneficiary, amount, &params)?;
    chain.approve(depositor, vault, amount)?;

    let receipt = network
        .deposit(
            transfer.src_chain_id,
            depositor,
            vault,
            transfer.dst_chain_id,
            beneficiary,
            amount,
            &params,
            fee.native_fee,
        )
        .with_context(|| {
            format!(
                "Deposit from chain {} to chain {} failed",
                transfer.src_chain_id, transfer.dst_chain_id
            )
        })?;

    info!(
        "Deposit dispatched: src_chain={}, dst_chain={}, nonce={}, fee={}",
        receipt.src_chain_id, receipt.dst_chain_id, receipt.nonce, receipt.native_fee
    );
    Ok(receipt)
}
