//! Cross-chain message envelope and the records produced around it.

use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::types::ChainId;

/// A message travelling from a source (chain, address) to a destination (chain, address).
///
/// `nonce` increases by one per (src chain, src address, dst chain, dst address) path,
/// starting at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub src_chain_id: ChainId,
    pub src_address: Address,
    pub dst_chain_id: ChainId,
    pub dst_address: Address,
    pub nonce: u64,
    pub payload: Vec<u8>,
}

impl Message {
    /// Path bytes as seen by the receiver: `src_address || dst_address`.
    pub fn src_path(&self) -> Vec<u8> {
        let mut path = Vec::with_capacity(40);
        path.extend_from_slice(self.src_address.as_bytes());
        path.extend_from_slice(self.dst_address.as_bytes());
        path
    }

    /// Globally unique id of this message, derived from its path and nonce.
    pub fn guid(&self) -> H256 {
        let mut hasher = Keccak256::new();
        hasher.update(self.src_chain_id.to_be_bytes());
        hasher.update(self.src_address.as_bytes());
        hasher.update(self.dst_chain_id.to_be_bytes());
        hasher.update(self.dst_address.as_bytes());
        hasher.update(self.nonce.to_be_bytes());
        H256::from_slice(&hasher.finalize())
    }
}

/// Fee quoted for a send. `zro_fee` is always zero: paying in the protocol token
/// is not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessagingFee {
    pub native_fee: U256,
    pub zro_fee: U256,
}

/// A committed source-side send, ready to be handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outbound {
    pub message: Message,
    pub fee: MessagingFee,
    /// Native value supplied above the fee, returned to the caller.
    pub refund: U256,
}

/// Returned by a transport once it has accepted a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub guid: H256,
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub nonce: u64,
    pub native_fee: U256,
    pub refund: U256,
}

impl DeliveryReceipt {
    pub fn new(outbound: &Outbound) -> Self {
        Self {
            guid: outbound.message.guid(),
            src_chain_id: outbound.message.src_chain_id,
            dst_chain_id: outbound.message.dst_chain_id,
            nonce: outbound.message.nonce,
            native_fee: outbound.fee.native_fee,
            refund: outbound.refund,
        }
    }
}

/// What happened to one message on the destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Value credited, no hook requested (or the target has no hook).
    Credited,
    /// Value credited and the receiver hook applied.
    HookApplied,
    /// Value credited, hook failed or target paused; a pending delivery was recorded.
    HookDeferred { key: H256, reason: String },
    /// Admitted but the credit could not be applied; the message is stored for retry.
    Stored { key: H256, reason: String },
    /// Arrived ahead of its predecessor on the path; held until the gap closes.
    Held,
    /// Dropped without effect on balances.
    Rejected { reason: String },
}

/// Reconciliation record for a single delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub guid: H256,
    pub src_chain_id: ChainId,
    pub dst_chain_id: ChainId,
    pub nonce: u64,
    pub status: DeliveryStatus,
}

impl DeliveryReport {
    pub fn new(message: &Message, status: DeliveryStatus) -> Self {
        Self {
            guid: message.guid(),
            src_chain_id: message.src_chain_id,
            dst_chain_id: message.dst_chain_id,
            nonce: message.nonce,
            status,
        }
    }
}
