//! Trusted remote registry.
//!
//! For each remote chain the registry stores the path bytes
//! `remote_address || local_address`. An inbound message is accepted only when its
//! own path (`src_address || dst_address`) matches the stored bytes exactly.
//!
//! Administrator checks are done by the owning contract before calling the setters.

use std::collections::BTreeMap;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};
use crate::types::ChainId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathRegistry {
    local_address: Address,
    trusted: BTreeMap<ChainId, Vec<u8>>,
}

impl PathRegistry {
    pub fn new(local_address: Address) -> Self {
        Self {
            local_address,
            trusted: BTreeMap::new(),
        }
    }

    /// Overwrite the trusted path for `chain_id`. Messages from a previous path stop
    /// being acceptable immediately.
    pub fn set_trusted_remote(&mut self, chain_id: ChainId, path: Vec<u8>) {
        self.trusted.insert(chain_id, path);
    }

    /// Trust `remote` on `chain_id`, pairing it with this contract's address.
    pub fn set_trusted_remote_address(&mut self, chain_id: ChainId, remote: Address) {
        let mut path = Vec::with_capacity(40);
        path.extend_from_slice(remote.as_bytes());
        path.extend_from_slice(self.local_address.as_bytes());
        self.set_trusted_remote(chain_id, path);
    }

    pub fn trusted_remote(&self, chain_id: ChainId) -> Option<&[u8]> {
        self.trusted.get(&chain_id).map(Vec::as_slice)
    }

    /// The remote contract address for `chain_id` (first 20 bytes of the path).
    pub fn trusted_remote_address(&self, chain_id: ChainId) -> Result<Address> {
        match self.trusted.get(&chain_id) {
            Some(path) if path.len() >= 20 => Ok(Address::from_slice(&path[..20])),
            _ => Err(OmniError::NoTrustedRemote(chain_id)),
        }
    }

    pub fn is_trusted_path(&self, chain_id: ChainId, sender_path: &[u8]) -> bool {
        match self.trusted.get(&chain_id) {
            Some(path) => !path.is_empty() && path.as_slice() == sender_path,
            None => false,
        }
    }
}
