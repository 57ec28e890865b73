//! Shared test helpers for integration tests
//!
//! The module is organized into several categories:
//! - **Constants**: Dummy chain ids, addresses and amounts
//! - **Builders**: Functions that assemble a wired two-chain network
//! - **Retry Arguments**: Reconstruction of hook arguments for retries

#![allow(dead_code)]

use ethereum_types::{Address, H160, U256};
use oft_core::{
    AdapterParams, Chain, Custody, DeliveryArgs, DstPrice, MessageTransport, Network, TokenConfig,
    VaultCall, PT_SEND, PT_SEND_AND_CALL,
};

// ============================================================================
// CONSTANTS
// ============================================================================

// --------------------------------- CHAINS ---------------------------------

/// Source chain (proxy custody over an existing token)
pub const SRC_CHAIN_ID: u32 = 1;

/// Destination chain (native custody, burn/mint)
pub const DST_CHAIN_ID: u32 = 2;

/// Extra native chain for multi-path scenarios
pub const THIRD_CHAIN_ID: u32 = 3;

// -------------------------------- USERS ---------------------------------

const fn dummy_address(last: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[19] = last;
    H160(bytes)
}

/// Token owner on both chains
pub const DUMMY_OWNER: Address = dummy_address(0x01);

/// Vault owner on both chains
pub const DUMMY_VAULT_OWNER: Address = dummy_address(0x02);

pub const DUMMY_ALICE: Address = dummy_address(0x0a);
pub const DUMMY_BOB: Address = dummy_address(0x0b);
pub const DUMMY_CAROL: Address = dummy_address(0x0c);

/// Account without any capability
pub const DUMMY_MALLORY: Address = dummy_address(0x0e);

// ------------------------------- CONTRACTS ------------------------------

pub const DUMMY_SRC_TOKEN: Address = dummy_address(0x10);
pub const DUMMY_SRC_VAULT: Address = dummy_address(0x11);
pub const DUMMY_DST_TOKEN: Address = dummy_address(0x20);
pub const DUMMY_DST_VAULT: Address = dummy_address(0x21);
pub const DUMMY_THIRD_TOKEN: Address = dummy_address(0x30);

// ------------------------------- AMOUNTS --------------------------------

pub const LOCAL_DECIMALS: u8 = 18;
pub const SHARED_DECIMALS: u8 = 6;

/// Minimum destination gas configured for both packet types
pub const MIN_DST_GAS: u64 = 225_000;

/// Gas in the adapter params the callers pass (min gas + vault's gas for call)
pub const ADAPTER_GAS: u64 = 525_000;

/// Native value supplied with every send; far above any quoted fee
pub fn fee_value() -> U256 {
    U256::exp10(18)
}

/// `n` whole tokens in local decimals.
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::exp10(LOCAL_DECIMALS as usize)
}

// ============================================================================
// BUILDERS
// ============================================================================

/// Destination price used by both chains: 1 wei gas, 1:1 native ratio.
pub fn dummy_price() -> DstPrice {
    DstPrice {
        gas_price: U256::one(),
        price_ratio: U256::from(10_000_000_000u64),
        base_gas: 100_000,
        gas_per_byte: 16,
        airdrop_cap: U256::exp10(18),
    }
}

pub fn token_config(address: Address, custody: Custody) -> TokenConfig {
    TokenConfig {
        address,
        owner: DUMMY_OWNER,
        custody,
        local_decimals: LOCAL_DECIMALS,
        shared_decimals: SHARED_DECIMALS,
    }
}

/// Two chains with paired tokens and vaults, custom adapter params enabled.
pub fn build_network<T: MessageTransport>(transport: T) -> Network<T> {
    let mut network = build_unconfigured_network(transport);

    for chain_id in [SRC_CHAIN_ID, DST_CHAIN_ID] {
        let chain = network.chain_mut(chain_id).unwrap();
        chain.set_use_custom_adapter_params(&DUMMY_OWNER, true).unwrap();
    }
    network
}

/// Two chains with paired tokens and vaults, default adapter params.
pub fn build_unconfigured_network<T: MessageTransport>(transport: T) -> Network<T> {
    let mut network = Network::new(transport);

    let mut src = Chain::new(SRC_CHAIN_ID, token_config(DUMMY_SRC_TOKEN, Custody::Proxy)).unwrap();
    src.deploy_vault(DUMMY_SRC_VAULT, DUMMY_VAULT_OWNER).unwrap();
    src.set_dst_price(&DUMMY_OWNER, DST_CHAIN_ID, dummy_price()).unwrap();

    let mut dst = Chain::new(DST_CHAIN_ID, token_config(DUMMY_DST_TOKEN, Custody::Native)).unwrap();
    dst.deploy_vault(DUMMY_DST_VAULT, DUMMY_VAULT_OWNER).unwrap();
    dst.set_dst_price(&DUMMY_OWNER, SRC_CHAIN_ID, dummy_price()).unwrap();

    for (chain, remote) in [(&mut src, DST_CHAIN_ID), (&mut dst, SRC_CHAIN_ID)] {
        chain.set_min_dst_gas(&DUMMY_OWNER, remote, PT_SEND, MIN_DST_GAS).unwrap();
        chain
            .set_min_dst_gas(&DUMMY_OWNER, remote, PT_SEND_AND_CALL, MIN_DST_GAS)
            .unwrap();
    }

    network.add_chain(src).unwrap();
    network.add_chain(dst).unwrap();
    network.pair_tokens(SRC_CHAIN_ID, DST_CHAIN_ID).unwrap();
    network
        .pair_vaults(SRC_CHAIN_ID, DUMMY_SRC_VAULT, DST_CHAIN_ID, DUMMY_DST_VAULT)
        .unwrap();
    network
}

/// Give `account` `amount` on the source chain and approve the source vault for it.
pub fn fund_for_deposit<T: MessageTransport>(network: &mut Network<T>, account: Address, amount: U256) {
    let src = network.chain_mut(SRC_CHAIN_ID).unwrap();
    src.mint(&DUMMY_OWNER, account, amount).unwrap();
    src.approve(account, DUMMY_SRC_VAULT, amount).unwrap();
}

/// Version 1 adapter params carrying `ADAPTER_GAS`.
pub fn adapter_params() -> Vec<u8> {
    AdapterParams::v1(ADAPTER_GAS).encode()
}

/// Deposit from `depositor` on the source chain to `beneficiary` on the destination.
pub fn deposit<T: MessageTransport>(
    network: &mut Network<T>,
    depositor: Address,
    beneficiary: Address,
    amount: U256,
) -> oft_core::Result<oft_core::DeliveryReceipt> {
    network.deposit(
        SRC_CHAIN_ID,
        depositor,
        DUMMY_SRC_VAULT,
        DST_CHAIN_ID,
        beneficiary,
        amount,
        &adapter_params(),
        fee_value(),
    )
}

// ============================================================================
// RETRY ARGUMENTS
// ============================================================================

/// Source path of the token pair as seen on the destination.
pub fn token_path() -> Vec<u8> {
    let mut path = DUMMY_SRC_TOKEN.as_bytes().to_vec();
    path.extend_from_slice(DUMMY_DST_TOKEN.as_bytes());
    path
}

/// Hook arguments of the `nonce`-th vault deposit of `amount` for `beneficiary`.
pub fn deposit_args(nonce: u64, amount: U256, beneficiary: Address) -> DeliveryArgs {
    DeliveryArgs {
        src_chain_id: SRC_CHAIN_ID,
        src_path: token_path(),
        nonce,
        from: DUMMY_SRC_VAULT,
        to: DUMMY_DST_VAULT,
        amount,
        payload: VaultCall::Deposit { beneficiary }.encode(),
    }
}
