//! Omnichain Token Relay
//!
//! Service wiring around `oft-core`: loads a network description from TOML,
//! deploys tokens and vaults onto each chain, and relays committed messages
//! between chains on a background task.

pub mod config;
pub mod deployment;
pub mod relay;

pub use config::Config;
pub use deployment::{build_network, execute_transfer};
pub use relay::{Envelope, Relay, RelayTransport, SharedNetwork};
