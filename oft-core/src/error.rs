//! Error definitions for the omnichain token state machine.

use ethereum_types::{Address, U256};
use thiserror::Error;

use crate::types::ChainId;

/// Failure classes used to decide how a caller reacts to an error.
///
/// - `Configuration`: rejected immediately, never retried, needs an administrator.
/// - `Validation`: rejected at the source before any state mutation.
/// - `Access`: caller lacks the capability for a privileged entry point.
/// - `TransientDelivery`: value already committed; captured as a pending delivery.
/// - `Retry`: stale or already-resolved retry parameters.
/// - `Transport`: the message transport could not accept or route a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Access,
    TransientDelivery,
    Retry,
    Transport,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OmniError {
    // ------------------------------------------------------------ configuration
    #[error("Untrusted path: chain {chain_id} has no trusted remote matching the sender")]
    UntrustedPath { chain_id: ChainId },

    #[error("Unconfigured destination: no gas price configured for chain {0}")]
    UnconfiguredDestination(ChainId),

    #[error("Unknown chain: {0}")]
    UnknownChain(ChainId),

    #[error("Chain {0} is already part of the network")]
    DuplicateChain(ChainId),

    #[error("Destination chain {0} has no trusted remote")]
    NoTrustedRemote(ChainId),

    #[error("Min gas not set for chain {chain_id}, packet type {packet_type}")]
    MinGasNotSet { chain_id: ChainId, packet_type: u8 },

    #[error("No remote staking contract registered for chain {0}")]
    NoRemoteStakingContract(ChainId),

    #[error("Unknown receiver contract {0:?}")]
    UnknownReceiver(Address),

    #[error("Address {0:?} is already deployed on this chain")]
    AddressInUse(Address),

    #[error("Invalid decimals: local {local} must be >= shared {shared}")]
    InvalidDecimals { local: u8, shared: u8 },

    #[error("Shared decimals differ: chain {a} uses {a_shared}, chain {b} uses {b_shared}")]
    SharedDecimalsMismatch {
        a: ChainId,
        a_shared: u8,
        b: ChainId,
        b_shared: u8,
    },

    // ------------------------------------------------------------ validation
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Insufficient balance: required {required}, available {available}")]
    InsufficientBalance { required: U256, available: U256 },

    #[error("Insufficient allowance: required {required}, available {available}")]
    InsufficientAllowance { required: U256, available: U256 },

    #[error("Insufficient gas params: required {required}, provided {provided}")]
    InsufficientGasParams { required: U256, provided: U256 },

    #[error("Insufficient fee: required {required}, supplied {supplied}")]
    InsufficientFee { required: U256, supplied: U256 },

    #[error("Adapter params must be empty unless custom adapter params are enabled")]
    AdapterParamsNotAllowed,

    #[error("Invalid adapter params: {0}")]
    InvalidAdapterParams(String),

    #[error("Airdrop of {requested} exceeds destination cap {cap}")]
    AirdropExceedsCap { requested: U256, cap: U256 },

    #[error("Amount {0} does not fit into shared decimals")]
    AmountTooLarge(U256),

    #[error("Arithmetic overflow")]
    ArithmeticOverflow,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    // ------------------------------------------------------------ access
    #[error("Unauthorized: caller {caller:?} is not the owner")]
    Unauthorized { caller: Address },

    #[error("Caller {0:?} is not the vault's token")]
    NotToken(Address),

    #[error("Caller {0:?} is a contract on this chain and cannot originate a transaction")]
    ContractCaller(Address),

    // ------------------------------------------------------------ delivery
    #[error("Vault is paused")]
    VaultPaused,

    #[error("Sender {from:?} is not the remote staking contract for chain {chain_id}")]
    UntrustedStakingSender { chain_id: ChainId, from: Address },

    #[error("Hook ran out of gas: needs {required}, given {provided}")]
    HookOutOfGas { required: u64, provided: u64 },

    #[error("Unsupported call type {0}")]
    UnsupportedCallType(u8),

    #[error("Insufficient vault balance: required {required}, available {available}")]
    InsufficientVaultBalance { required: U256, available: U256 },

    #[error("Stale nonce on path: expected at least {expected}, got {got}")]
    StaleNonce { expected: u64, got: u64 },

    // ------------------------------------------------------------ retry
    #[error("No pending delivery matches the supplied arguments")]
    NoPendingDelivery,

    #[error("No stored message matches the supplied message")]
    NoStoredMessage,

    // ------------------------------------------------------------ transport
    #[error("Transport closed: {0}")]
    TransportClosed(String),
}

impl OmniError {
    /// Classify this error for the caller.
    pub fn kind(&self) -> ErrorKind {
        use OmniError::*;
        match self {
            UntrustedPath { .. }
            | UnconfiguredDestination(_)
            | UnknownChain(_)
            | DuplicateChain(_)
            | NoTrustedRemote(_)
            | MinGasNotSet { .. }
            | NoRemoteStakingContract(_)
            | UnknownReceiver(_)
            | AddressInUse(_)
            | InvalidDecimals { .. }
            | SharedDecimalsMismatch { .. } => ErrorKind::Configuration,

            ZeroAmount
            | InsufficientBalance { .. }
            | InsufficientAllowance { .. }
            | InsufficientGasParams { .. }
            | InsufficientFee { .. }
            | AdapterParamsNotAllowed
            | InvalidAdapterParams(_)
            | AirdropExceedsCap { .. }
            | AmountTooLarge(_)
            | ArithmeticOverflow
            | InvalidPayload(_)
            | InsufficientVaultBalance { .. } => ErrorKind::Validation,

            Unauthorized { .. } | NotToken(_) | ContractCaller(_) => ErrorKind::Access,

            VaultPaused
            | UntrustedStakingSender { .. }
            | HookOutOfGas { .. }
            | UnsupportedCallType(_) => ErrorKind::TransientDelivery,

            NoPendingDelivery | NoStoredMessage | StaleNonce { .. } => ErrorKind::Retry,

            TransportClosed(_) => ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, OmniError>;
