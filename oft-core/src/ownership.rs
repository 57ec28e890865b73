//! Single-administrator capability checked at every privileged entry point.

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownership {
    owner: Address,
}

impl Ownership {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_owner(&self, caller: &Address) -> bool {
        self.owner == *caller
    }

    /// Fails with `Unauthorized` unless `caller` holds the capability.
    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(OmniError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    /// Hand the capability to `new_owner`. Only the current owner may do this.
    pub fn transfer(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.ensure_owner(caller)?;
        self.owner = new_owner;
        Ok(())
    }
}
