//! Cross-chain staking vault.
//!
//! The source vault pulls a deposit from the caller and forwards it through the
//! omnichain token as a send-and-call addressed to the paired vault on the
//! destination. The destination vault's hook credits the beneficiary, who can later
//! withdraw the underlying token.
//!
//! ## Application payload
//!
//! ```text
//! u8 call type (1 = deposit) | 20-byte beneficiary
//! ```

use std::collections::BTreeMap;

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::endpoint::Endpoint;
use crate::error::{OmniError, Result};
use crate::events::{Event, EventLog};
use crate::message::{MessagingFee, Outbound};
use crate::ownership::Ownership;
use crate::retry_ledger::DeliveryArgs;
use crate::token::OmnichainToken;
use crate::types::{hex_address, ChainId};

pub const DEPOSIT_CALL: u8 = 1;

/// Gas the deposit hook consumes on the destination.
pub const ON_RECEIVE_GAS: u64 = 50_000;

/// Gas the source vault allots to the destination hook.
pub const DEFAULT_DST_GAS_FOR_CALL: u64 = 300_000;

const DEPOSIT_CALL_LEN: usize = 1 + 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultCall {
    Deposit { beneficiary: Address },
}

impl VaultCall {
    pub fn encode(&self) -> Vec<u8> {
        match self {
            VaultCall::Deposit { beneficiary } => {
                let mut out = Vec::with_capacity(DEPOSIT_CALL_LEN);
                out.push(DEPOSIT_CALL);
                out.extend_from_slice(beneficiary.as_bytes());
                out
            }
        }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let call_type = *bytes
            .first()
            .ok_or_else(|| OmniError::InvalidPayload("empty vault call".to_string()))?;
        if call_type != DEPOSIT_CALL {
            return Err(OmniError::UnsupportedCallType(call_type));
        }
        if bytes.len() != DEPOSIT_CALL_LEN {
            return Err(OmniError::InvalidPayload(format!(
                "deposit call must be {} bytes, got {}",
                DEPOSIT_CALL_LEN,
                bytes.len()
            )));
        }
        Ok(VaultCall::Deposit {
            beneficiary: Address::from_slice(&bytes[1..]),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StakingVault {
    address: Address,
    token: Address,
    ownership: Ownership,
    paused: bool,
    dst_gas_for_call: u64,
    remote_staking: BTreeMap<ChainId, Address>,
    balances: BTreeMap<Address, U256>,
    total_credited: U256,
    total_withdrawn: U256,
}

impl StakingVault {
    pub fn new(address: Address, token: Address, owner: Address) -> Self {
        Self {
            address,
            token,
            ownership: Ownership::new(owner),
            paused: false,
            dst_gas_for_call: DEFAULT_DST_GAS_FOR_CALL,
            remote_staking: BTreeMap::new(),
            balances: BTreeMap::new(),
            total_credited: U256::zero(),
            total_withdrawn: U256::zero(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn token(&self) -> Address {
        self.token
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn dst_gas_for_call(&self) -> u64 {
        self.dst_gas_for_call
    }

    pub fn balance_of(&self, beneficiary: &Address) -> U256 {
        self.balances.get(beneficiary).copied().unwrap_or_default()
    }

    /// Sum of all credits ever applied by the hook.
    pub fn total_credited(&self) -> U256 {
        self.total_credited
    }

    pub fn total_withdrawn(&self) -> U256 {
        self.total_withdrawn
    }

    pub fn remote_staking_contract(&self, chain_id: ChainId) -> Result<Address> {
        self.remote_staking
            .get(&chain_id)
            .copied()
            .ok_or(OmniError::NoRemoteStakingContract(chain_id))
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    /// Only affects future hook invocations; pending deliveries are left untouched.
    pub fn set_paused(&mut self, caller: &Address, paused: bool, events: &mut EventLog) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.paused = paused;
        info!("Vault {} paused={}", hex_address(&self.address), paused);
        events.emit(Event::VaultPausedSet { paused });
        Ok(())
    }

    pub fn set_remote_staking_contract(
        &mut self,
        caller: &Address,
        chain_id: ChainId,
        remote: Address,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.remote_staking.insert(chain_id, remote);
        events.emit(Event::RemoteStakingContractSet { chain_id, remote });
        Ok(())
    }

    pub fn set_dst_gas_for_call(&mut self, caller: &Address, gas: u64) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.dst_gas_for_call = gas;
        Ok(())
    }

    pub fn transfer_ownership(
        &mut self,
        caller: &Address,
        new_owner: Address,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.transfer(caller, new_owner)?;
        events.emit(Event::OwnershipTransferred {
            contract: self.address,
            new_owner,
        });
        Ok(())
    }

    // ========================================================================
    // SOURCE SIDE
    // ========================================================================

    pub fn quote_for_deposit(
        &self,
        dst_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
        adapter_params: &[u8],
        token: &OmnichainToken,
        endpoint: &Endpoint,
    ) -> Result<MessagingFee> {
        let remote = self.remote_staking_contract(dst_chain_id)?;
        token.estimate_send_and_call_fee(
            dst_chain_id,
            remote,
            amount,
            self.address,
            &VaultCall::Deposit { beneficiary }.encode(),
            self.dst_gas_for_call,
            adapter_params,
            endpoint,
        )
    }

    /// Pull `amount` from `caller` (allowance required) and forward it to the paired
    /// vault on `dst_chain_id` for `beneficiary`.
    #[allow(clippy::too_many_arguments)]
    pub fn deposit_to_dst_chain(
        &mut self,
        caller: Address,
        dst_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
        token: &mut OmnichainToken,
        endpoint: &mut Endpoint,
        events: &mut EventLog,
    ) -> Result<Outbound> {
        let remote = self.remote_staking_contract(dst_chain_id)?;
        let amount = token.remove_dust(amount);
        if amount.is_zero() {
            return Err(OmniError::ZeroAmount);
        }

        token.transfer_from(self.address, caller, self.address, amount)?;
        let outbound = token.send_and_call(
            self.address,
            dst_chain_id,
            remote,
            amount,
            VaultCall::Deposit { beneficiary }.encode(),
            self.dst_gas_for_call,
            adapter_params,
            value,
            endpoint,
            events,
        )?;

        info!(
            "Vault deposit: dst_chain={}, depositor={}, beneficiary={}, amount={}",
            dst_chain_id,
            hex_address(&caller),
            hex_address(&beneficiary),
            amount
        );
        events.emit(Event::VaultDeposit {
            dst_chain_id,
            depositor: caller,
            beneficiary,
            amount,
        });
        Ok(outbound)
    }

    // ========================================================================
    // DESTINATION SIDE
    // ========================================================================

    /// Receiver hook. `gas` is `None` for retries, which run without a gas limit.
    pub fn on_receive(
        &mut self,
        caller: Address,
        args: &DeliveryArgs,
        gas: Option<u64>,
        events: &mut EventLog,
    ) -> Result<()> {
        if caller != self.token {
            return Err(OmniError::NotToken(caller));
        }
        if self.paused {
            return Err(OmniError::VaultPaused);
        }
        if let Some(provided) = gas {
            if provided < ON_RECEIVE_GAS {
                return Err(OmniError::HookOutOfGas {
                    required: ON_RECEIVE_GAS,
                    provided,
                });
            }
        }
        let expected = self.remote_staking_contract(args.src_chain_id)?;
        if args.from != expected {
            return Err(OmniError::UntrustedStakingSender {
                chain_id: args.src_chain_id,
                from: args.from,
            });
        }

        let VaultCall::Deposit { beneficiary } = VaultCall::decode(&args.payload)?;
        let balance = self.balance_of(&beneficiary);
        let credited = balance
            .checked_add(args.amount)
            .ok_or(OmniError::ArithmeticOverflow)?;
        self.total_credited = self
            .total_credited
            .checked_add(args.amount)
            .ok_or(OmniError::ArithmeticOverflow)?;
        self.balances.insert(beneficiary, credited);

        info!(
            "Vault credited: src_chain={}, beneficiary={}, amount={}",
            args.src_chain_id,
            hex_address(&beneficiary),
            args.amount
        );
        events.emit(Event::VaultCredited {
            src_chain_id: args.src_chain_id,
            beneficiary,
            amount: args.amount,
        });
        Ok(())
    }

    /// Debit `caller`'s credited balance and release the token to them.
    pub fn withdraw(
        &mut self,
        caller: Address,
        amount: U256,
        token: &mut OmnichainToken,
        events: &mut EventLog,
    ) -> Result<()> {
        let available = self.balance_of(&caller);
        if available < amount {
            return Err(OmniError::InsufficientVaultBalance {
                required: amount,
                available,
            });
        }
        token.transfer(self.address, caller, amount)?;
        self.balances.insert(caller, available - amount);
        self.total_withdrawn += amount;

        info!(
            "Vault withdraw: account={}, amount={}",
            hex_address(&caller),
            amount
        );
        events.emit(Event::VaultWithdraw {
            account: caller,
            amount,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_call_rejects_unknown_type() {
        let mut bytes = VaultCall::Deposit {
            beneficiary: Address::from_low_u64_be(9),
        }
        .encode();
        bytes[0] = 7;

        assert_eq!(
            VaultCall::decode(&bytes),
            Err(OmniError::UnsupportedCallType(7))
        );
    }

    #[test]
    fn test_deposit_call_layout() {
        let beneficiary = Address::from_low_u64_be(0xbeef);
        let bytes = VaultCall::Deposit { beneficiary }.encode();

        assert_eq!(bytes.len(), 21);
        assert_eq!(bytes[0], DEPOSIT_CALL);
        assert_eq!(&bytes[1..], beneficiary.as_bytes());
    }
}
