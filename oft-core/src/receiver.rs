//! Receiver hook registry.
//!
//! Destination addresses that implement the token's receiver capability are
//! registered here; the token looks the target up after crediting value and
//! dispatches on the variant.

use std::collections::BTreeMap;

use ethereum_types::Address;
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};
use crate::events::EventLog;
use crate::retry_ledger::DeliveryArgs;
use crate::vault::StakingVault;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Receiver {
    StakingVault(StakingVault),
}

impl Receiver {
    pub fn address(&self) -> Address {
        match self {
            Receiver::StakingVault(vault) => vault.address(),
        }
    }

    pub fn owner(&self) -> Address {
        match self {
            Receiver::StakingVault(vault) => vault.owner(),
        }
    }

    pub fn is_paused(&self) -> bool {
        match self {
            Receiver::StakingVault(vault) => vault.is_paused(),
        }
    }

    pub fn on_receive(
        &mut self,
        caller: Address,
        args: &DeliveryArgs,
        gas: Option<u64>,
        events: &mut EventLog,
    ) -> Result<()> {
        match self {
            Receiver::StakingVault(vault) => vault.on_receive(caller, args, gas, events),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Receivers {
    registered: BTreeMap<Address, Receiver>,
}

impl Receivers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, receiver: Receiver) -> Result<()> {
        let address = receiver.address();
        if self.registered.contains_key(&address) {
            return Err(OmniError::AddressInUse(address));
        }
        self.registered.insert(address, receiver);
        Ok(())
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.registered.contains_key(address)
    }

    pub fn get(&self, address: &Address) -> Option<&Receiver> {
        self.registered.get(address)
    }

    pub fn get_mut(&mut self, address: &Address) -> Option<&mut Receiver> {
        self.registered.get_mut(address)
    }

    pub fn vault(&self, address: &Address) -> Result<&StakingVault> {
        match self.registered.get(address) {
            Some(Receiver::StakingVault(vault)) => Ok(vault),
            None => Err(OmniError::UnknownReceiver(*address)),
        }
    }

    pub fn vault_mut(&mut self, address: &Address) -> Result<&mut StakingVault> {
        match self.registered.get_mut(address) {
            Some(Receiver::StakingVault(vault)) => Ok(vault),
            None => Err(OmniError::UnknownReceiver(*address)),
        }
    }
}
