//! Minimal fungible balance book backing the token on one chain.

use std::collections::BTreeMap;

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::{OmniError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: BTreeMap<Address, U256>,
    allowances: BTreeMap<(Address, Address), U256>,
    total_supply: U256,
}

impl TokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.balances.get(owner).copied().unwrap_or_default()
    }

    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> U256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn approve(&mut self, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((owner, spender), amount);
    }

    pub fn mint(&mut self, to: Address, amount: U256) -> Result<()> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(OmniError::ArithmeticOverflow)?;
        let balance = self.balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(OmniError::ArithmeticOverflow)?;
        Ok(())
    }

    pub fn burn(&mut self, from: Address, amount: U256) -> Result<()> {
        self.debit(from, amount)?;
        self.total_supply -= amount;
        Ok(())
    }

    pub fn transfer(&mut self, from: Address, to: Address, amount: U256) -> Result<()> {
        self.debit(from, amount)?;
        let balance = self.balances.entry(to).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(OmniError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Move `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        if spender != from {
            let allowed = self.allowance(&from, &spender);
            if allowed < amount {
                return Err(OmniError::InsufficientAllowance {
                    required: amount,
                    available: allowed,
                });
            }
            self.transfer(from, to, amount)?;
            self.allowances.insert((from, spender), allowed - amount);
            return Ok(());
        }
        self.transfer(from, to, amount)
    }

    fn debit(&mut self, from: Address, amount: U256) -> Result<()> {
        let available = self.balance_of(&from);
        if available < amount {
            return Err(OmniError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        self.balances.insert(from, available - amount);
        Ok(())
    }
}
