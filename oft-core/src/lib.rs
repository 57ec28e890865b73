//! Omnichain Token Core Library
//!
//! Deterministic per-chain state machine for an omnichain fungible token: value is
//! locked or burned on the source chain, carried by a message transport, and
//! credited on the destination, where an optional receiver hook (the staking vault)
//! runs. Hook failures never roll back the credit; they are recorded as pending
//! deliveries that an authorized caller can retry.

pub mod adapter_params;
pub mod chain;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod fee_quoter;
pub mod ledger;
pub mod message;
pub mod network;
pub mod ownership;
pub mod packet;
pub mod path_registry;
pub mod receiver;
pub mod retry_ledger;
pub mod token;
pub mod transport;
pub mod types;
pub mod vault;

// Re-export commonly used types
pub use adapter_params::AdapterParams;
pub use chain::Chain;
pub use endpoint::{Admission, Endpoint};
pub use error::{ErrorKind, OmniError, Result};
pub use events::{Event, EventLog};
pub use fee_quoter::{DstPrice, FeeQuoter, GasOracle, PriceTable};
pub use message::{DeliveryReceipt, DeliveryReport, DeliveryStatus, Message, MessagingFee, Outbound};
pub use network::Network;
pub use packet::TokenPacket;
pub use path_registry::PathRegistry;
pub use receiver::{Receiver, Receivers};
pub use retry_ledger::{DeliveryArgs, PendingDelivery, RetryLedger, StoredMessage};
pub use token::{Custody, OmnichainToken, TokenConfig};
pub use transport::{DeferredTransport, InProcessTransport, MessageTransport};
pub use types::{ChainId, PT_SEND, PT_SEND_AND_CALL};
pub use vault::{StakingVault, VaultCall};
