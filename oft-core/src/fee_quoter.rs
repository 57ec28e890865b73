//! Native fee quoting for cross-chain sends.
//!
//! The quoter is a pure computation over the payload size, the gas requested by the
//! adapter params, and per-destination prices supplied by a [`GasOracle`]:
//!
//! ```text
//! gas        = base_gas + adapter.gas + payload_len * gas_per_byte
//! dst_cost   = gas * gas_price + airdrop
//! native_fee = dst_cost * price_ratio / PRICE_RATIO_DENOMINATOR
//! ```

use std::collections::BTreeMap;

use ethereum_types::U256;
use serde::{Deserialize, Serialize};

use crate::adapter_params::AdapterParams;
use crate::error::{OmniError, Result};
use crate::message::MessagingFee;
use crate::types::ChainId;

/// Scale of `price_ratio` (destination native priced in source native).
pub const PRICE_RATIO_DENOMINATOR: u64 = 10_000_000_000;

/// Prices for executing on one destination chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DstPrice {
    /// Destination gas price in destination native units.
    pub gas_price: U256,
    /// Destination native value in source native units, scaled by 1e10.
    pub price_ratio: U256,
    /// Fixed verification and delivery overhead in gas.
    pub base_gas: u64,
    /// Gas charged per payload byte.
    pub gas_per_byte: u64,
    /// Largest native airdrop accepted for this destination.
    pub airdrop_cap: U256,
}

/// Read-only source of destination prices.
pub trait GasOracle {
    fn dst_price(&self, dst_chain_id: ChainId) -> Option<DstPrice>;
}

/// Administrator-maintained price table; the default oracle of a chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceTable {
    prices: BTreeMap<ChainId, DstPrice>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_price(&mut self, dst_chain_id: ChainId, price: DstPrice) {
        self.prices.insert(dst_chain_id, price);
    }
}

impl GasOracle for PriceTable {
    fn dst_price(&self, dst_chain_id: ChainId) -> Option<DstPrice> {
        self.prices.get(&dst_chain_id).cloned()
    }
}

/// Computes `(native_fee, zro_fee)` without mutating anything.
pub struct FeeQuoter;

impl FeeQuoter {
    pub fn quote(
        oracle: &impl GasOracle,
        dst_chain_id: ChainId,
        payload: &[u8],
        adapter_params: &AdapterParams,
    ) -> Result<MessagingFee> {
        let price = oracle
            .dst_price(dst_chain_id)
            .ok_or(OmniError::UnconfiguredDestination(dst_chain_id))?;

        let airdrop = adapter_params.airdrop();
        if airdrop > price.airdrop_cap {
            return Err(OmniError::AirdropExceedsCap {
                requested: airdrop,
                cap: price.airdrop_cap,
            });
        }

        let payload_gas = U256::from(payload.len() as u64)
            .checked_mul(U256::from(price.gas_per_byte))
            .ok_or(OmniError::ArithmeticOverflow)?;
        let gas = U256::from(price.base_gas)
            .checked_add(adapter_params.gas())
            .and_then(|g| g.checked_add(payload_gas))
            .ok_or(OmniError::ArithmeticOverflow)?;
        let dst_cost = gas
            .checked_mul(price.gas_price)
            .and_then(|c| c.checked_add(airdrop))
            .ok_or(OmniError::ArithmeticOverflow)?;
        let native_fee = dst_cost
            .checked_mul(price.price_ratio)
            .ok_or(OmniError::ArithmeticOverflow)?
            / U256::from(PRICE_RATIO_DENOMINATOR);

        Ok(MessagingFee {
            native_fee,
            zro_fee: U256::zero(),
        })
    }
}
