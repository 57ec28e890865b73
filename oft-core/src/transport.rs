//! Message transport seam.
//!
//! A transport accepts committed sends from a source chain and hands them to the
//! destination. Two in-process implementations live here:
//!
//! - [`InProcessTransport`]: immediate delivery. Every accepted message is returned by
//!   the next [`MessageTransport::take_ready`], so the network delivers it within the
//!   same call that dispatched it.
//! - [`DeferredTransport`]: keeps messages in flight until the caller releases them,
//!   in any order, to model an asynchronous relay deterministically.
//!
//! Both accept a given message at most once.

use std::collections::{HashSet, VecDeque};

use ethereum_types::H256;
use tracing::debug;

use crate::error::{OmniError, Result};
use crate::message::{DeliveryReceipt, Message, Outbound};
use crate::types::ChainId;

pub trait MessageTransport {
    /// Accept a committed send for delivery.
    fn dispatch(&mut self, outbound: &Outbound) -> Result<DeliveryReceipt>;

    /// Messages the transport wants delivered now, in delivery order.
    fn take_ready(&mut self) -> Vec<Message>;
}

/// Remembers accepted message ids to refuse a second dispatch of the same message.
#[derive(Debug, Default)]
struct Dispatched {
    guids: HashSet<H256>,
}

impl Dispatched {
    fn accept(&mut self, outbound: &Outbound) -> Result<DeliveryReceipt> {
        let receipt = DeliveryReceipt::new(outbound);
        if !self.guids.insert(receipt.guid) {
            return Err(OmniError::TransportClosed(format!(
                "message nonce {} from chain {} was already dispatched",
                receipt.nonce, receipt.src_chain_id
            )));
        }
        debug!(
            "Dispatched nonce {} from chain {} to chain {}",
            receipt.nonce, receipt.src_chain_id, receipt.dst_chain_id
        );
        Ok(receipt)
    }
}

#[derive(Debug, Default)]
pub struct InProcessTransport {
    dispatched: Dispatched,
    queue: VecDeque<Message>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MessageTransport for InProcessTransport {
    fn dispatch(&mut self, outbound: &Outbound) -> Result<DeliveryReceipt> {
        let receipt = self.dispatched.accept(outbound)?;
        self.queue.push_back(outbound.message.clone());
        Ok(receipt)
    }

    fn take_ready(&mut self) -> Vec<Message> {
        self.queue.drain(..).collect()
    }
}

#[derive(Debug, Default)]
pub struct DeferredTransport {
    dispatched: Dispatched,
    in_flight: Vec<Message>,
}

impl DeferredTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> &[Message] {
        &self.in_flight
    }

    /// Remove and return every in-flight message, in dispatch order.
    pub fn release_all(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.in_flight)
    }

    /// Remove and return the in-flight message with `nonce` on the path
    /// (`src_chain_id`, `src_path`).
    pub fn release(&mut self, src_chain_id: ChainId, src_path: &[u8], nonce: u64) -> Option<Message> {
        let index = self.in_flight.iter().position(|m| {
            m.src_chain_id == src_chain_id && m.nonce == nonce && m.src_path() == src_path
        })?;
        Some(self.in_flight.remove(index))
    }
}

impl MessageTransport for DeferredTransport {
    fn dispatch(&mut self, outbound: &Outbound) -> Result<DeliveryReceipt> {
        let receipt = self.dispatched.accept(outbound)?;
        self.in_flight.push(outbound.message.clone());
        Ok(receipt)
    }

    fn take_ready(&mut self) -> Vec<Message> {
        Vec::new()
    }
}
