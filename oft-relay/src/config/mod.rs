//! Configuration Management Module
//!
//! This module handles loading and validating the relay's configuration: relay
//! timing, the chains of the network (token, vault, prices, gas minimums, genesis
//! balances) and the vault deposits the service performs at startup.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{anyhow, Context};
use ethereum_types::{Address, U256};
use oft_core::types::parse_address;
use oft_core::vault::DEFAULT_DST_GAS_FOR_CALL;
use oft_core::{ChainId, Custody, DstPrice};
use serde::{Deserialize, Serialize};

/// Environment variable holding the configuration file path.
pub const CONFIG_PATH_ENV: &str = "OFT_RELAY_CONFIG_PATH";

/// Configuration file used when the environment variable is not set.
pub const DEFAULT_CONFIG_PATH: &str = "config/oft-relay.toml";

// ============================================================================
// CONFIGURATION STRUCTURES
// ============================================================================

/// Main configuration structure containing all service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Relay worker settings
    #[serde(default)]
    pub relay: RelaySettings,
    /// Chains of the network; every pair of chains is connected
    pub chains: Vec<ChainConfig>,
    /// Vault deposits executed once the network is up
    #[serde(default)]
    pub transfers: Vec<TransferConfig>,
}

/// Relay worker timing and fan-out.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    /// Artificial delay before each delivery, in milliseconds
    #[serde(default)]
    pub delivery_delay_ms: u64,
    /// Buffer size of the delivery report broadcast channel
    #[serde(default = "default_report_capacity")]
    pub report_capacity: usize,
}

fn default_report_capacity() -> usize {
    256
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            delivery_delay_ms: 0,
            report_capacity: default_report_capacity(),
        }
    }
}

/// One chain: its token deployment and everything wired around it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Human-readable name for the chain
    pub name: String,
    /// Chain identifier, unique within this configuration
    pub chain_id: ChainId,
    /// Administrator of the token (hex address)
    pub owner: String,
    /// Address of the omnichain token (hex address)
    pub token_address: String,
    /// `proxy` (lock/unlock) or `native` (burn/mint)
    pub custody: Custody,
    pub local_decimals: u8,
    pub shared_decimals: u8,
    #[serde(default)]
    pub use_custom_adapter_params: bool,
    /// Staking vault deployed next to the token (optional)
    #[serde(default)]
    pub vault: Option<VaultConfig>,
    /// Prices for sending to other chains
    #[serde(default)]
    pub gas_prices: Vec<GasPriceConfig>,
    /// Minimum destination gas per (chain, packet type)
    #[serde(default)]
    pub min_dst_gas: Vec<MinGasConfig>,
    /// Balances minted by the owner at startup
    #[serde(default)]
    pub genesis: Vec<GenesisBalance>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    pub address: String,
    pub owner: String,
    /// Gas forwarded to the remote vault's hook
    #[serde(default = "default_dst_gas_for_call")]
    pub dst_gas_for_call: u64,
}

fn default_dst_gas_for_call() -> u64 {
    DEFAULT_DST_GAS_FOR_CALL
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasPriceConfig {
    pub dst_chain_id: ChainId,
    /// Destination gas price in destination native units
    pub gas_price: u64,
    /// Destination native priced in source native, scaled by 1e10
    pub price_ratio: u64,
    pub base_gas: u64,
    pub gas_per_byte: u64,
    #[serde(default)]
    pub airdrop_cap: u64,
}

impl GasPriceConfig {
    pub fn to_dst_price(&self) -> DstPrice {
        DstPrice {
            gas_price: U256::from(self.gas_price),
            price_ratio: U256::from(self.price_ratio),
            base_gas: self.base_gas,
            gas_per_byte: self.gas_per_byte,
            airdrop_cap: U256::from(self.airdrop_cap),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinGasConfig {
    pub dst_chain_id: ChainId,
    pub packet_type: u8,
    pub min_gas: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub account: String,
    /// Decimal amount in local decimals (a string, since it exceeds TOML integers)
    pub amount: String,
}

/// A vault deposit from `depositor` on `src_chain_id` to `beneficiary` on `dst_chain_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub depositor: String,
    pub beneficiary: String,
    /// Decimal amount in the source chain's local decimals
    pub amount: String,
    /// Gas to put in the adapter params (custom adapter params only)
    #[serde(default)]
    pub adapter_gas: Option<u64>,
}

/// Parse a decimal token amount.
pub fn parse_amount(value: &str) -> anyhow::Result<U256> {
    U256::from_dec_str(value.trim()).map_err(|e| anyhow!("Invalid amount '{}': {:?}", value, e))
}

/// Parse a hex address, naming the field in the error.
pub fn parse_field_address(field: &str, value: &str) -> anyhow::Result<Address> {
    parse_address(value).with_context(|| format!("Invalid address for {}", field))
}

// ============================================================================
// CONFIGURATION LOADING AND MANAGEMENT
// ============================================================================

impl Config {
    pub fn chain(&self, chain_id: ChainId) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    /// Validates the configuration.
    ///
    /// This function ensures that:
    /// - Chain IDs are unique and at least one chain is configured
    /// - Every chain uses the same shared decimals, none above its local decimals
    /// - At most one chain holds the token in `proxy` custody
    /// - Every address and amount parses
    /// - Prices, gas minimums and transfers only reference other configured chains
    /// - Transfers start from a chain with a vault and land on a chain with a vault
    ///
    /// # Returns
    ///
    /// - `Ok(())` - Configuration is valid
    /// - `Err(anyhow::Error)` - The first problem found
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chains.is_empty() {
            return Err(anyhow!("Configuration error: no chains configured"));
        }

        let mut seen = HashSet::new();
        for chain in &self.chains {
            if !seen.insert(chain.chain_id) {
                return Err(anyhow!(
                    "Configuration error: chain ID {} is used by more than one chain. Each chain must have a unique chain ID.",
                    chain.chain_id
                ));
            }
        }

        let shared = self.chains[0].shared_decimals;
        if let Some(chain) = self.chains.iter().find(|c| c.shared_decimals != shared) {
            return Err(anyhow!(
                "Configuration error: chain {} uses shared decimals {} but chain {} uses {}. All paired chains must share the same shared decimals.",
                chain.chain_id,
                chain.shared_decimals,
                self.chains[0].chain_id,
                shared
            ));
        }

        let proxies: Vec<ChainId> = self
            .chains
            .iter()
            .filter(|c| c.custody == Custody::Proxy)
            .map(|c| c.chain_id)
            .collect();
        if proxies.len() > 1 {
            return Err(anyhow!(
                "Configuration error: chains {:?} all use proxy custody. Only one chain may wrap the existing token; the others must be native.",
                proxies
            ));
        }

        for chain in &self.chains {
            self.validate_chain(chain)
                .with_context(|| format!("Chain '{}' ({})", chain.name, chain.chain_id))?;
        }

        for (index, transfer) in self.transfers.iter().enumerate() {
            self.validate_transfer(transfer)
                .with_context(|| format!("Transfer #{}", index + 1))?;
        }

        Ok(())
    }

    fn validate_chain(&self, chain: &ChainConfig) -> anyhow::Result<()> {
        if chain.shared_decimals > chain.local_decimals {
            return Err(anyhow!(
                "Configuration error: shared decimals {} exceed local decimals {}",
                chain.shared_decimals,
                chain.local_decimals
            ));
        }

        parse_field_address("owner", &chain.owner)?;
        let token = parse_field_address("token_address", &chain.token_address)?;
        if let Some(vault) = &chain.vault {
            let vault_address = parse_field_address("vault.address", &vault.address)?;
            parse_field_address("vault.owner", &vault.owner)?;
            if vault_address == token {
                return Err(anyhow!(
                    "Configuration error: vault and token share address {}",
                    vault.address
                ));
            }
        }

        for price in &chain.gas_prices {
            self.ensure_remote(chain.chain_id, price.dst_chain_id, "gas price")?;
        }
        for min_gas in &chain.min_dst_gas {
            self.ensure_remote(chain.chain_id, min_gas.dst_chain_id, "min gas")?;
        }
        for balance in &chain.genesis {
            parse_field_address("genesis.account", &balance.account)?;
            parse_amount(&balance.amount)?;
        }
        Ok(())
    }

    fn validate_transfer(&self, transfer: &TransferConfig) -> anyhow::Result<()> {
        self.ensure_remote(transfer.src_chain_id, transfer.dst_chain_id, "transfer")?;
        for chain_id in [transfer.src_chain_id, transfer.dst_chain_id] {
            let chain = self
                .chain(chain_id)
                .ok_or_else(|| anyhow!("Configuration error: unknown chain {}", chain_id))?;
            if chain.vault.is_none() {
                return Err(anyhow!(
                    "Configuration error: chain {} has no vault for deposits",
                    chain_id
                ));
            }
        }
        parse_field_address("depositor", &transfer.depositor)?;
        parse_field_address("beneficiary", &transfer.beneficiary)?;
        if parse_amount(&transfer.amount)?.is_zero() {
            return Err(anyhow!("Configuration error: transfer amount must be positive"));
        }
        Ok(())
    }

    fn ensure_remote(&self, local: ChainId, remote: ChainId, what: &str) -> anyhow::Result<()> {
        if local == remote {
            return Err(anyhow!(
                "Configuration error: {} on chain {} points at itself",
                what,
                local
            ));
        }
        if self.chain(remote).is_none() {
            return Err(anyhow!(
                "Configuration error: {} on chain {} references unknown chain {}",
                what,
                local,
                remote
            ));
        }
        Ok(())
    }

    /// Loads configuration from the TOML file named by `OFT_RELAY_CONFIG_PATH`
    /// (default `config/oft-relay.toml`).
    ///
    /// # Returns
    ///
    /// - `Ok(Config)` - Successfully loaded and validated configuration
    /// - `Err(anyhow::Error)` - File missing, unparsable or invalid
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Loads and validates the configuration at `path`.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "Configuration file '{}' not found. Please copy the template:\n\
                cp config/oft-relay.template.toml config/oft-relay.toml\n\
                Then edit config/oft-relay.toml with your actual values.",
                path.display()
            ));
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Creates a two-chain local configuration: a proxy token on chain 1 and a native
    /// token on chain 2, a vault on each, and one startup deposit.
    #[allow(clippy::should_implement_trait)]
    pub fn default() -> Self {
        let owner = "0x0000000000000000000000000000000000000001".to_string();
        let vault_owner = "0x0000000000000000000000000000000000000002".to_string();
        let alice = "0x000000000000000000000000000000000000000a".to_string();
        let bob = "0x000000000000000000000000000000000000000b".to_string();

        let chain = |chain_id: ChainId, remote: ChainId, custody: Custody, prefix: u8| {
            ChainConfig {
                name: format!("Chain {}", chain_id),
                chain_id,
                owner: owner.clone(),
                token_address: format!("0x00000000000000000000000000000000000000{:02x}", prefix),
                custody,
                local_decimals: 18,
                shared_decimals: 6,
                use_custom_adapter_params: true,
                vault: Some(VaultConfig {
                    address: format!("0x00000000000000000000000000000000000000{:02x}", prefix + 1),
                    owner: vault_owner.clone(),
                    dst_gas_for_call: DEFAULT_DST_GAS_FOR_CALL,
                }),
                gas_prices: vec![GasPriceConfig {
                    dst_chain_id: remote,
                    gas_price: 1_000_000_000,
                    price_ratio: 10_000_000_000,
                    base_gas: 100_000,
                    gas_per_byte: 16,
                    airdrop_cap: 1_000_000_000_000_000_000,
                }],
                min_dst_gas: vec![
                    MinGasConfig {
                        dst_chain_id: remote,
                        packet_type: oft_core::PT_SEND,
                        min_gas: 225_000,
                    },
                    MinGasConfig {
                        dst_chain_id: remote,
                        packet_type: oft_core::PT_SEND_AND_CALL,
                        min_gas: 225_000,
                    },
                ],
                genesis: Vec::new(),
            }
        };

        let mut source = chain(1, 2, Custody::Proxy, 0x10);
        source.genesis.push(GenesisBalance {
            account: alice.clone(),
            amount: "100000000000000000000".to_string(),
        });
        let destination = chain(2, 1, Custody::Native, 0x20);

        Self {
            relay: RelaySettings::default(),
            chains: vec![source, destination],
            transfers: vec![TransferConfig {
                src_chain_id: 1,
                dst_chain_id: 2,
                depositor: alice,
                beneficiary: bob,
                amount: "100000000000000000000".to_string(),
                adapter_gas: None,
            }],
        }
    }
}
