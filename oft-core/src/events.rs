//! Protocol events.
//!
//! Every event is appended to the chain's [`EventLog`] and mirrored to `tracing`, so
//! off-chain tooling can reconcile deliveries either from the log or from the logs.

use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::ChainId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // token
    SendToChain {
        dst_chain_id: ChainId,
        from: Address,
        to: Address,
        amount: U256,
        nonce: u64,
    },
    ReceiveFromChain {
        src_chain_id: ChainId,
        to: Address,
        amount: U256,
        nonce: u64,
    },
    CallReceivedSuccess {
        src_chain_id: ChainId,
        nonce: u64,
        to: Address,
    },
    MessageFailed {
        src_chain_id: ChainId,
        nonce: u64,
        key: H256,
        reason: String,
    },
    RetrySuccess {
        key: H256,
    },
    PayloadStored {
        src_chain_id: ChainId,
        nonce: u64,
        key: H256,
        reason: String,
    },
    NonContractAddress {
        to: Address,
    },

    // endpoint
    UntrustedPathRejected {
        src_chain_id: ChainId,
        src_path: Vec<u8>,
        nonce: u64,
    },
    DeliveryRejected {
        src_chain_id: ChainId,
        nonce: u64,
        reason: String,
    },
    MessageHeld {
        src_chain_id: ChainId,
        nonce: u64,
        expected: u64,
    },

    // administration
    SetTrustedRemote {
        remote_chain_id: ChainId,
        path: Vec<u8>,
    },
    SetMinDstGas {
        dst_chain_id: ChainId,
        packet_type: u8,
        min_gas: u64,
    },
    SetUseCustomAdapterParams {
        enabled: bool,
    },
    SetDstPrice {
        dst_chain_id: ChainId,
    },
    OwnershipTransferred {
        contract: Address,
        new_owner: Address,
    },

    // vault
    VaultDeposit {
        dst_chain_id: ChainId,
        depositor: Address,
        beneficiary: Address,
        amount: U256,
    },
    VaultCredited {
        src_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
    },
    VaultWithdraw {
        account: Address,
        amount: U256,
    },
    VaultPausedSet {
        paused: bool,
    },
    RemoteStakingContractSet {
        chain_id: ChainId,
        remote: Address,
    },
}

/// Append-only event record of one chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLog {
    chain_id: ChainId,
    events: Vec<Event>,
}

impl EventLog {
    pub fn new(chain_id: ChainId) -> Self {
        Self {
            chain_id,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, event: Event) {
        debug!("chain {} event: {:?}", self.chain_id, event);
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }
}
