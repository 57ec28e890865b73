//! Durable record of admitted deliveries that did not take full effect.
//!
//! - A pending delivery: value credited, hook not applied. Keyed by `keccak256` over
//!   the exact hook arguments, so a retry must present the original arguments.
//! - A stored message: the credit itself could not be applied (undecodable packet,
//!   nothing left to unlock). Keyed by the message guid; a retry must present the
//!   identical message and re-runs the whole receive.
//!
//! Records are removed only by a successful retry; nothing else drops them.

use std::collections::BTreeMap;

use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::message::Message;
use crate::types::ChainId;

/// Arguments the destination hook is invoked with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryArgs {
    pub src_chain_id: ChainId,
    /// `src_address || dst_address` of the carrying message.
    pub src_path: Vec<u8>,
    pub nonce: u64,
    /// Application-level sender on the source chain.
    pub from: Address,
    /// Receiver contract on this chain.
    pub to: Address,
    /// Amount in local decimals.
    pub amount: U256,
    /// Application payload handed to the hook.
    pub payload: Vec<u8>,
}

impl DeliveryArgs {
    /// Retry key: hash(src chain, src path, nonce, from, to, amount, payload).
    pub fn key(&self) -> H256 {
        let mut amount = [0u8; 32];
        self.amount.to_big_endian(&mut amount);

        let mut hasher = Keccak256::new();
        hasher.update(self.src_chain_id.to_be_bytes());
        hasher.update((self.src_path.len() as u32).to_be_bytes());
        hasher.update(&self.src_path);
        hasher.update(self.nonce.to_be_bytes());
        hasher.update(self.from.as_bytes());
        hasher.update(self.to.as_bytes());
        hasher.update(amount);
        hasher.update((self.payload.len() as u32).to_be_bytes());
        hasher.update(&self.payload);
        H256::from_slice(&hasher.finalize())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingDelivery {
    pub args: DeliveryArgs,
    /// Why the hook was not applied (last failure).
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub message: Message,
    /// Why the credit was not applied (last failure).
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetryLedger {
    pending: BTreeMap<H256, PendingDelivery>,
    stored: BTreeMap<H256, StoredMessage>,
}

impl RetryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a pending delivery and return its key.
    pub fn record(&mut self, args: DeliveryArgs, reason: String) -> H256 {
        let key = args.key();
        self.pending.insert(key, PendingDelivery { args, reason });
        key
    }

    pub fn get(&self, key: &H256) -> Option<&PendingDelivery> {
        self.pending.get(key)
    }

    pub fn contains(&self, key: &H256) -> bool {
        self.pending.contains_key(key)
    }

    pub fn resolve(&mut self, key: &H256) -> Option<PendingDelivery> {
        self.pending.remove(key)
    }

    pub fn pending(&self) -> impl Iterator<Item = (&H256, &PendingDelivery)> {
        self.pending.iter()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    // ------------------------------------------------------------ stored messages

    /// Store an admitted message whose credit failed and return its key.
    pub fn store(&mut self, message: Message, reason: String) -> H256 {
        let key = message.guid();
        self.stored.insert(key, StoredMessage { message, reason });
        key
    }

    /// Key of `message` if exactly this message is stored.
    pub fn stored_key(&self, message: &Message) -> Option<H256> {
        let key = message.guid();
        match self.stored.get(&key) {
            Some(stored) if stored.message == *message => Some(key),
            _ => None,
        }
    }

    pub fn take_stored(&mut self, key: &H256) -> Option<StoredMessage> {
        self.stored.remove(key)
    }

    pub fn stored(&self) -> impl Iterator<Item = (&H256, &StoredMessage)> {
        self.stored.iter()
    }
}
