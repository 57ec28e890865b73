//! Per-chain messaging endpoint.
//!
//! Tracks outbound nonces per (dst chain, src address, dst address) path, admits
//! inbound messages strictly in nonce order per (src chain, src path), and prices
//! sends through the chain's [`PriceTable`].
//!
//! ## Inbound ordering
//!
//! - `nonce == last + 1`: applied, then any held successors are released in order.
//! - `nonce > last + 1`: held until the gap closes.
//! - `nonce <= last` or already held: rejected as stale, so a message is applied at
//!   most once.

use std::collections::BTreeMap;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::adapter_params::AdapterParams;
use crate::error::{OmniError, Result};
use crate::fee_quoter::{DstPrice, FeeQuoter, PriceTable};
use crate::message::{Message, MessagingFee};
use crate::types::ChainId;

type OutboundPath = (ChainId, Address, Address);
type InboundPath = (ChainId, Vec<u8>);

/// Result of presenting an inbound message to the endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Messages to apply now, in nonce order (the presented one first).
    Ready(Vec<Message>),
    /// Stored until the predecessor `expected` arrives.
    Held { expected: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Endpoint {
    chain_id: ChainId,
    prices: PriceTable,
    outbound: BTreeMap<OutboundPath, u64>,
    inbound: BTreeMap<InboundPath, u64>,
    held: BTreeMap<InboundPath, BTreeMap<u64, Message>>,
}

impl Endpoint {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            prices: PriceTable::new(),
            outbound: BTreeMap::new(),
            inbound: BTreeMap::new(),
            held: BTreeMap::new(),
        }
    }

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn set_dst_price(&mut self, dst_chain_id: ChainId, price: DstPrice) {
        self.prices.set_price(dst_chain_id, price);
    }

    pub fn quote(
        &self,
        dst_chain_id: ChainId,
        payload: &[u8],
        adapter_params: &AdapterParams,
    ) -> Result<MessagingFee> {
        FeeQuoter::quote(&self.prices, dst_chain_id, payload, adapter_params)
    }

    /// Last nonce assigned on an outbound path (0 if none).
    pub fn outbound_nonce(&self, dst_chain_id: ChainId, src: Address, dst: Address) -> u64 {
        self.outbound
            .get(&(dst_chain_id, src, dst))
            .copied()
            .unwrap_or(0)
    }

    /// Last nonce applied on an inbound path (0 if none).
    pub fn inbound_nonce(&self, src_chain_id: ChainId, src_path: &[u8]) -> u64 {
        self.inbound
            .get(&(src_chain_id, src_path.to_vec()))
            .copied()
            .unwrap_or(0)
    }

    /// Number of messages waiting for a predecessor on an inbound path.
    pub fn held_count(&self, src_chain_id: ChainId, src_path: &[u8]) -> usize {
        self.held
            .get(&(src_chain_id, src_path.to_vec()))
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Assign the next nonce on an outbound path and build the message.
    pub fn stamp(
        &mut self,
        src: Address,
        dst_chain_id: ChainId,
        dst: Address,
        payload: Vec<u8>,
    ) -> Message {
        let nonce = self.outbound.entry((dst_chain_id, src, dst)).or_insert(0);
        *nonce += 1;
        Message {
            src_chain_id: self.chain_id,
            src_address: src,
            dst_chain_id,
            dst_address: dst,
            nonce: *nonce,
            payload,
        }
    }

    /// Admit an inbound message according to its path's nonce order.
    pub fn admit(&mut self, message: Message) -> Result<Admission> {
        let path = (message.src_chain_id, message.src_path());
        let last = self.inbound.get(&path).copied().unwrap_or(0);
        let expected = last + 1;

        if message.nonce < expected {
            return Err(OmniError::StaleNonce {
                expected,
                got: message.nonce,
            });
        }

        if message.nonce > expected {
            let held = self.held.entry(path).or_default();
            if held.contains_key(&message.nonce) {
                return Err(OmniError::StaleNonce {
                    expected,
                    got: message.nonce,
                });
            }
            debug!(
                "Holding nonce {} from chain {} until {} arrives",
                message.nonce, message.src_chain_id, expected
            );
            held.insert(message.nonce, message);
            return Ok(Admission::Held { expected });
        }

        let mut ready = vec![message];
        let mut next = expected;
        let mut drained = false;
        if let Some(held) = self.held.get_mut(&path) {
            while let Some(successor) = held.remove(&(next + 1)) {
                ready.push(successor);
                next += 1;
            }
            drained = held.is_empty();
        }
        if drained {
            self.held.remove(&path);
        }
        self.inbound.insert(path, next);
        Ok(Admission::Ready(ready))
    }
}
