//! One chain's execution environment: endpoint, omnichain token, receiver
//! contracts and event log.
//!
//! Every transaction entry point is atomic. It runs against the live state and, if
//! it fails, the chain is restored to the state it had before the call, so a failed
//! transaction leaves no partial effects and emits no events.
//!
//! Transactions originate from externally owned accounts: a `caller` that is the
//! token or a registered receiver contract is refused with `ContractCaller`.

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::endpoint::{Admission, Endpoint};
use crate::error::{OmniError, Result};
use crate::events::{Event, EventLog};
use crate::fee_quoter::DstPrice;
use crate::message::{DeliveryReport, DeliveryStatus, Message, MessagingFee, Outbound};
use crate::receiver::{Receiver, Receivers};
use crate::retry_ledger::{DeliveryArgs, PendingDelivery, StoredMessage};
use crate::token::{OmnichainToken, TokenConfig};
use crate::types::{hex_address, ChainId};
use crate::vault::StakingVault;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chain {
    chain_id: ChainId,
    endpoint: Endpoint,
    token: OmnichainToken,
    receivers: Receivers,
    events: EventLog,
}

impl Chain {
    pub fn new(chain_id: ChainId, token: TokenConfig) -> Result<Self> {
        Ok(Self {
            chain_id,
            endpoint: Endpoint::new(chain_id),
            token: OmnichainToken::new(token)?,
            receivers: Receivers::new(),
            events: EventLog::new(chain_id),
        })
    }

    /// Run `f` as one transaction: on error the chain is restored.
    pub fn atomically<R>(&mut self, f: impl FnOnce(&mut Chain) -> Result<R>) -> Result<R> {
        let snapshot = self.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                *self = snapshot;
                Err(e)
            }
        }
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn chain_id(&self) -> ChainId {
        self.chain_id
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn token(&self) -> &OmnichainToken {
        &self.token
    }

    pub fn receivers(&self) -> &Receivers {
        &self.receivers
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    pub fn vault(&self, address: &Address) -> Result<&StakingVault> {
        self.receivers.vault(address)
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.token.balance_of(owner)
    }

    pub fn pending_deliveries(&self) -> impl Iterator<Item = &PendingDelivery> {
        self.token.retries().pending().map(|(_, pending)| pending)
    }

    pub fn stored_messages(&self) -> impl Iterator<Item = &StoredMessage> {
        self.token.retries().stored().map(|(_, stored)| stored)
    }

    /// Refuse transactions that claim to come from a contract on this chain.
    fn ensure_external(&self, caller: &Address) -> Result<()> {
        if *caller == self.token.address() || self.receivers.contains(caller) {
            return Err(OmniError::ContractCaller(*caller));
        }
        Ok(())
    }

    // ========================================================================
    // DEPLOYMENT & ADMINISTRATION
    // ========================================================================

    /// Deploy a staking vault bound to this chain's token.
    pub fn deploy_vault(&mut self, address: Address, owner: Address) -> Result<()> {
        if address == self.token.address() {
            return Err(OmniError::AddressInUse(address));
        }
        let vault = StakingVault::new(address, self.token.address(), owner);
        self.receivers.register(Receiver::StakingVault(vault))
    }

    pub fn set_dst_price(
        &mut self,
        caller: &Address,
        dst_chain_id: ChainId,
        price: DstPrice,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain.token.ensure_owner(caller)?;
            chain.endpoint.set_dst_price(dst_chain_id, price);
            chain.events.emit(Event::SetDstPrice { dst_chain_id });
            Ok(())
        })
    }

    pub fn set_trusted_remote(
        &mut self,
        caller: &Address,
        remote_chain_id: ChainId,
        path: Vec<u8>,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain
                .token
                .set_trusted_remote(caller, remote_chain_id, path, &mut chain.events)
        })
    }

    pub fn set_trusted_remote_address(
        &mut self,
        caller: &Address,
        remote_chain_id: ChainId,
        remote: Address,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain
                .token
                .set_trusted_remote_address(caller, remote_chain_id, remote, &mut chain.events)
        })
    }

    pub fn set_min_dst_gas(
        &mut self,
        caller: &Address,
        dst_chain_id: ChainId,
        packet_type: u8,
        min_gas: u64,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain
                .token
                .set_min_dst_gas(caller, dst_chain_id, packet_type, min_gas, &mut chain.events)
        })
    }

    pub fn set_use_custom_adapter_params(&mut self, caller: &Address, enabled: bool) -> Result<()> {
        self.atomically(|chain| {
            chain
                .token
                .set_use_custom_adapter_params(caller, enabled, &mut chain.events)
        })
    }

    pub fn transfer_token_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<()> {
        self.atomically(|chain| {
            chain
                .token
                .transfer_ownership(caller, new_owner, &mut chain.events)
        })
    }

    pub fn set_paused(&mut self, caller: &Address, vault: &Address, paused: bool) -> Result<()> {
        self.atomically(|chain| {
            chain
                .receivers
                .vault_mut(vault)?
                .set_paused(caller, paused, &mut chain.events)
        })
    }

    pub fn set_remote_staking_contract(
        &mut self,
        caller: &Address,
        vault: &Address,
        remote_chain_id: ChainId,
        remote: Address,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain.receivers.vault_mut(vault)?.set_remote_staking_contract(
                caller,
                remote_chain_id,
                remote,
                &mut chain.events,
            )
        })
    }

    pub fn set_dst_gas_for_call(&mut self, caller: &Address, vault: &Address, gas: u64) -> Result<()> {
        self.atomically(|chain| chain.receivers.vault_mut(vault)?.set_dst_gas_for_call(caller, gas))
    }

    pub fn transfer_vault_ownership(
        &mut self,
        caller: &Address,
        vault: &Address,
        new_owner: Address,
    ) -> Result<()> {
        self.atomically(|chain| {
            chain
                .receivers
                .vault_mut(vault)?
                .transfer_ownership(caller, new_owner, &mut chain.events)
        })
    }

    // ========================================================================
    // TOKEN
    // ========================================================================

    pub fn mint(&mut self, caller: &Address, to: Address, amount: U256) -> Result<()> {
        self.ensure_external(caller)?;
        self.atomically(|chain| chain.token.mint(caller, to, amount))
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) -> Result<()> {
        self.ensure_external(&caller)?;
        self.token.approve(caller, spender, amount);
        Ok(())
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        self.ensure_external(&caller)?;
        self.atomically(|chain| chain.token.transfer(caller, to, amount))
    }

    pub fn quote_send(
        &self,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        adapter_params: &[u8],
    ) -> Result<MessagingFee> {
        self.token
            .estimate_send_fee(dst_chain_id, to, amount, adapter_params, &self.endpoint)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn send_from(
        &mut self,
        from: Address,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
    ) -> Result<Outbound> {
        self.ensure_external(&from)?;
        self.atomically(|chain| {
            chain.token.send_from(
                from,
                dst_chain_id,
                to,
                amount,
                adapter_params,
                value,
                &mut chain.endpoint,
                &mut chain.events,
            )
        })
    }

    // ========================================================================
    // VAULT
    // ========================================================================

    pub fn quote_deposit(
        &self,
        vault: &Address,
        dst_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
        adapter_params: &[u8],
    ) -> Result<MessagingFee> {
        self.receivers.vault(vault)?.quote_for_deposit(
            dst_chain_id,
            beneficiary,
            amount,
            adapter_params,
            &self.token,
            &self.endpoint,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn deposit_to_dst_chain(
        &mut self,
        caller: Address,
        vault: &Address,
        dst_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
    ) -> Result<Outbound> {
        self.ensure_external(&caller)?;
        self.atomically(|chain| {
            chain.receivers.vault_mut(vault)?.deposit_to_dst_chain(
                caller,
                dst_chain_id,
                beneficiary,
                amount,
                adapter_params,
                value,
                &mut chain.token,
                &mut chain.endpoint,
                &mut chain.events,
            )
        })
    }

    pub fn withdraw(&mut self, caller: Address, vault: &Address, amount: U256) -> Result<()> {
        self.ensure_external(&caller)?;
        self.atomically(|chain| {
            chain
                .receivers
                .vault_mut(vault)?
                .withdraw(caller, amount, &mut chain.token, &mut chain.events)
        })
    }

    /// Invoke a vault's hook directly as an account, bypassing the token. Fails with
    /// `ContractCaller` when `caller` impersonates the token, and with `NotToken` for
    /// every other account.
    pub fn call_on_receive(
        &mut self,
        caller: Address,
        vault: &Address,
        args: &DeliveryArgs,
    ) -> Result<()> {
        self.ensure_external(&caller)?;
        self.atomically(|chain| {
            chain
                .receivers
                .vault_mut(vault)?
                .on_receive(caller, args, None, &mut chain.events)
        })
    }

    // ========================================================================
    // DELIVERY
    // ========================================================================

    /// Deliver an inbound message and report what happened to it and to any held
    /// successors it released.
    pub fn receive(&mut self, message: Message) -> Vec<DeliveryReport> {
        if message.dst_chain_id != self.chain_id {
            let reason = format!(
                "message for chain {} delivered to chain {}",
                message.dst_chain_id, self.chain_id
            );
            return vec![self.rejected(&message, reason)];
        }

        if !self.token.is_trusted(&message) {
            warn!(
                "Untrusted path: src_chain={}, src_address={}, nonce={}",
                message.src_chain_id,
                hex_address(&message.src_address),
                message.nonce
            );
            self.events.emit(Event::UntrustedPathRejected {
                src_chain_id: message.src_chain_id,
                src_path: message.src_path(),
                nonce: message.nonce,
            });
            let reason = OmniError::UntrustedPath {
                chain_id: message.src_chain_id,
            }
            .to_string();
            return vec![DeliveryReport::new(
                &message,
                DeliveryStatus::Rejected { reason },
            )];
        }

        match self.endpoint.admit(message.clone()) {
            Err(e) => vec![self.rejected(&message, e.to_string())],
            Ok(Admission::Held { expected }) => {
                self.events.emit(Event::MessageHeld {
                    src_chain_id: message.src_chain_id,
                    nonce: message.nonce,
                    expected,
                });
                vec![DeliveryReport::new(&message, DeliveryStatus::Held)]
            }
            Ok(Admission::Ready(ready)) => ready
                .into_iter()
                .map(|message| {
                    let status = self
                        .token
                        .apply(&message, &mut self.receivers, &mut self.events);
                    DeliveryReport::new(&message, status)
                })
                .collect(),
        }
    }

    /// Re-run the hook of a pending delivery with its original arguments.
    pub fn retry_delivery(&mut self, caller: &Address, args: &DeliveryArgs) -> Result<()> {
        self.ensure_external(caller)?;
        self.atomically(|chain| {
            chain
                .token
                .retry_delivery(caller, args, &mut chain.receivers, &mut chain.events)
        })
    }

    /// Re-run the receive of a stored message whose credit previously failed.
    pub fn retry_message(&mut self, message: &Message) -> Result<DeliveryReport> {
        self.atomically(|chain| {
            let status =
                chain
                    .token
                    .retry_message(message, &mut chain.receivers, &mut chain.events)?;
            Ok(DeliveryReport::new(message, status))
        })
    }

    fn rejected(&mut self, message: &Message, reason: String) -> DeliveryReport {
        warn!(
            "DeliveryRejected: src_chain={}, nonce={}, reason={}",
            message.src_chain_id, message.nonce, reason
        );
        self.events.emit(Event::DeliveryRejected {
            src_chain_id: message.src_chain_id,
            nonce: message.nonce,
            reason: reason.clone(),
        });
        DeliveryReport::new(message, DeliveryStatus::Rejected { reason })
    }
}
