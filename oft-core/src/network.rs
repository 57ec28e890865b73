//! A set of chains joined by one message transport.
//!
//! Sends are committed on the source chain and handed to the transport in the same
//! step: if the transport refuses the message, the source chain is restored. Whatever
//! the transport reports as ready is delivered immediately, and every delivery
//! outcome is appended to the network's delivery log.

use std::collections::BTreeMap;

use ethereum_types::{Address, U256};
use tracing::{info, warn};

use crate::chain::Chain;
use crate::error::{OmniError, Result};
use crate::message::{DeliveryReceipt, DeliveryReport, DeliveryStatus, Message, Outbound};
use crate::retry_ledger::DeliveryArgs;
use crate::transport::MessageTransport;
use crate::types::ChainId;

pub struct Network<T: MessageTransport> {
    chains: BTreeMap<ChainId, Chain>,
    transport: T,
    delivery_log: Vec<DeliveryReport>,
}

impl<T: MessageTransport> Network<T> {
    pub fn new(transport: T) -> Self {
        Self {
            chains: BTreeMap::new(),
            transport,
            delivery_log: Vec::new(),
        }
    }

    pub fn add_chain(&mut self, chain: Chain) -> Result<()> {
        let chain_id = chain.chain_id();
        if self.chains.contains_key(&chain_id) {
            return Err(OmniError::DuplicateChain(chain_id));
        }
        self.chains.insert(chain_id, chain);
        Ok(())
    }

    pub fn chain(&self, chain_id: ChainId) -> Result<&Chain> {
        self.chains
            .get(&chain_id)
            .ok_or(OmniError::UnknownChain(chain_id))
    }

    pub fn chain_mut(&mut self, chain_id: ChainId) -> Result<&mut Chain> {
        self.chains
            .get_mut(&chain_id)
            .ok_or(OmniError::UnknownChain(chain_id))
    }

    pub fn chain_ids(&self) -> impl Iterator<Item = ChainId> + '_ {
        self.chains.keys().copied()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn delivery_log(&self) -> &[DeliveryReport] {
        &self.delivery_log
    }

    // ========================================================================
    // WIRING
    // ========================================================================

    /// Trust each chain's token on the other, using each token owner's capability.
    ///
    /// Both tokens must use the same shared decimals, since amounts travel in them.
    pub fn pair_tokens(&mut self, a: ChainId, b: ChainId) -> Result<()> {
        let (token_a, a_shared) = {
            let token = self.chain(a)?.token();
            (token.address(), token.shared_decimals())
        };
        let (token_b, b_shared) = {
            let token = self.chain(b)?.token();
            (token.address(), token.shared_decimals())
        };
        if a_shared != b_shared {
            return Err(OmniError::SharedDecimalsMismatch {
                a,
                a_shared,
                b,
                b_shared,
            });
        }

        let chain_a = self.chain_mut(a)?;
        let owner_a = chain_a.token().owner();
        chain_a.set_trusted_remote_address(&owner_a, b, token_b)?;

        let chain_b = self.chain_mut(b)?;
        let owner_b = chain_b.token().owner();
        chain_b.set_trusted_remote_address(&owner_b, a, token_a)
    }

    /// Register two vaults as each other's remote staking contract.
    pub fn pair_vaults(
        &mut self,
        a: ChainId,
        vault_a: Address,
        b: ChainId,
        vault_b: Address,
    ) -> Result<()> {
        let chain_a = self.chain_mut(a)?;
        let owner_a = chain_a.vault(&vault_a)?.owner();
        chain_a.set_remote_staking_contract(&owner_a, &vault_a, b, vault_b)?;

        let chain_b = self.chain_mut(b)?;
        let owner_b = chain_b.vault(&vault_b)?.owner();
        chain_b.set_remote_staking_contract(&owner_b, &vault_b, a, vault_a)
    }

    // ========================================================================
    // SEND & DELIVER
    // ========================================================================

    /// Commit a send on `src_chain_id` and hand it to the transport.
    pub fn submit(
        &mut self,
        src_chain_id: ChainId,
        send: impl FnOnce(&mut Chain) -> Result<Outbound>,
    ) -> Result<DeliveryReceipt> {
        let chain = self
            .chains
            .get_mut(&src_chain_id)
            .ok_or(OmniError::UnknownChain(src_chain_id))?;
        let snapshot = chain.clone();
        let outbound = send(chain)?;

        let receipt = match self.transport.dispatch(&outbound) {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(
                    "Transport refused nonce {} from chain {}: {}",
                    outbound.message.nonce, src_chain_id, e
                );
                *chain = snapshot;
                return Err(e);
            }
        };

        self.flush();
        Ok(receipt)
    }

    /// Deliver everything the transport reports as ready.
    pub fn flush(&mut self) -> Vec<DeliveryReport> {
        let mut reports = Vec::new();
        loop {
            let ready = self.transport.take_ready();
            if ready.is_empty() {
                return reports;
            }
            for message in ready {
                reports.extend(self.deliver(message));
            }
        }
    }

    /// Deliver one message to its destination chain.
    pub fn deliver(&mut self, message: Message) -> Vec<DeliveryReport> {
        let reports = match self.chains.get_mut(&message.dst_chain_id) {
            Some(chain) => chain.receive(message),
            None => {
                let reason = OmniError::UnknownChain(message.dst_chain_id).to_string();
                vec![DeliveryReport::new(
                    &message,
                    DeliveryStatus::Rejected { reason },
                )]
            }
        };

        for report in &reports {
            info!(
                "Delivery: src_chain={}, dst_chain={}, nonce={}, status={:?}",
                report.src_chain_id, report.dst_chain_id, report.nonce, report.status
            );
        }
        self.delivery_log.extend(reports.iter().cloned());
        reports
    }

    // ========================================================================
    // CONVENIENCE
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    pub fn send_from(
        &mut self,
        src_chain_id: ChainId,
        from: Address,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
    ) -> Result<DeliveryReceipt> {
        self.submit(src_chain_id, |chain| {
            chain.send_from(from, dst_chain_id, to, amount, adapter_params, value)
        })
    }

    #[allow(clippy::too_many_arguments)]
    pub fn deposit(
        &mut self,
        src_chain_id: ChainId,
        caller: Address,
        vault: Address,
        dst_chain_id: ChainId,
        beneficiary: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
    ) -> Result<DeliveryReceipt> {
        self.submit(src_chain_id, |chain| {
            chain.deposit_to_dst_chain(
                caller,
                &vault,
                dst_chain_id,
                beneficiary,
                amount,
                adapter_params,
                value,
            )
        })
    }

    pub fn retry_delivery(
        &mut self,
        chain_id: ChainId,
        caller: &Address,
        args: &DeliveryArgs,
    ) -> Result<()> {
        self.chain_mut(chain_id)?.retry_delivery(caller, args)
    }

    pub fn retry_message(&mut self, chain_id: ChainId, message: &Message) -> Result<DeliveryReport> {
        let report = self.chain_mut(chain_id)?.retry_message(message)?;
        self.delivery_log.push(report.clone());
        Ok(report)
    }
}
