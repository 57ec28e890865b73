//! Omnichain token: lock/burn on send, unlock/mint on receive, hook dispatch with
//! retry capture.
//!
//! ## Send
//!
//! All validation runs before the economic commitment point (the debit):
//! 1. non-zero amount and sufficient balance (dust is never debited)
//! 2. adapter params cover the destination's minimum gas for the packet type
//! 3. a trusted remote exists for the destination
//! 4. the supplied value covers the quoted native fee
//!
//! Then the amount is locked (`Proxy`) or burned (`Native`) and the endpoint stamps
//! the next nonce for the path.
//!
//! ## Receive
//!
//! The value credit is applied unconditionally. A requested hook then runs against the
//! registered receiver; if the receiver is paused or the hook fails, the credit stays
//! and a pending delivery is recorded for retry. If the credit itself cannot be
//! applied, the whole message is stored for retry instead.

use std::collections::BTreeMap;

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::adapter_params::AdapterParams;
use crate::endpoint::Endpoint;
use crate::error::{OmniError, Result};
use crate::events::{Event, EventLog};
use crate::ledger::TokenLedger;
use crate::message::{DeliveryStatus, Message, MessagingFee, Outbound};
use crate::ownership::Ownership;
use crate::packet::TokenPacket;
use crate::path_registry::PathRegistry;
use crate::receiver::Receivers;
use crate::retry_ledger::{DeliveryArgs, RetryLedger};
use crate::types::{hex_address, hex_hash, ChainId, PT_SEND, PT_SEND_AND_CALL};

/// Destination gas used when custom adapter params are off and no minimum is set.
pub const DEFAULT_DST_GAS: u64 = 200_000;

/// Largest supported local decimals; keeps every shared-to-local conversion in range.
pub const MAX_LOCAL_DECIMALS: u8 = 36;

/// How the token represents value on this chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Custody {
    /// Wraps an existing token: sends lock it at the token's address, receives unlock.
    Proxy,
    /// The token itself: sends burn, receives mint.
    Native,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenConfig {
    pub address: Address,
    pub owner: Address,
    pub custody: Custody,
    pub local_decimals: u8,
    pub shared_decimals: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OmnichainToken {
    address: Address,
    ownership: Ownership,
    custody: Custody,
    local_decimals: u8,
    shared_decimals: u8,
    ld2sd_rate: U256,
    ledger: TokenLedger,
    paths: PathRegistry,
    min_dst_gas: BTreeMap<(ChainId, u8), u64>,
    use_custom_adapter_params: bool,
    retries: RetryLedger,
}

impl OmnichainToken {
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.local_decimals < config.shared_decimals
            || config.local_decimals > MAX_LOCAL_DECIMALS
        {
            return Err(OmniError::InvalidDecimals {
                local: config.local_decimals,
                shared: config.shared_decimals,
            });
        }
        let ld2sd_rate =
            U256::exp10((config.local_decimals - config.shared_decimals) as usize);

        Ok(Self {
            address: config.address,
            ownership: Ownership::new(config.owner),
            custody: config.custody,
            local_decimals: config.local_decimals,
            shared_decimals: config.shared_decimals,
            ld2sd_rate,
            ledger: TokenLedger::new(),
            paths: PathRegistry::new(config.address),
            min_dst_gas: BTreeMap::new(),
            use_custom_adapter_params: false,
            retries: RetryLedger::new(),
        })
    }

    // ========================================================================
    // VIEWS
    // ========================================================================

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn owner(&self) -> Address {
        self.ownership.owner()
    }

    pub fn custody(&self) -> Custody {
        self.custody
    }

    pub fn local_decimals(&self) -> u8 {
        self.local_decimals
    }

    pub fn shared_decimals(&self) -> u8 {
        self.shared_decimals
    }

    pub fn ledger(&self) -> &TokenLedger {
        &self.ledger
    }

    pub fn balance_of(&self, owner: &Address) -> U256 {
        self.ledger.balance_of(owner)
    }

    /// Amount held at the token's own address (locked value in `Proxy` custody).
    pub fn locked(&self) -> U256 {
        self.ledger.balance_of(&self.address)
    }

    pub fn paths(&self) -> &PathRegistry {
        &self.paths
    }

    pub fn retries(&self) -> &RetryLedger {
        &self.retries
    }

    pub fn min_dst_gas(&self, dst_chain_id: ChainId, packet_type: u8) -> u64 {
        self.min_dst_gas
            .get(&(dst_chain_id, packet_type))
            .copied()
            .unwrap_or(0)
    }

    pub fn use_custom_adapter_params(&self) -> bool {
        self.use_custom_adapter_params
    }

    pub fn is_trusted(&self, message: &Message) -> bool {
        self.paths
            .is_trusted_path(message.src_chain_id, &message.src_path())
    }

    // ========================================================================
    // BALANCES
    // ========================================================================

    /// Owner-only issuance, used for genesis balances and faucets.
    pub fn mint(&mut self, caller: &Address, to: Address, amount: U256) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.ledger.mint(to, amount)
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: U256) {
        self.ledger.approve(caller, spender, amount);
    }

    pub fn transfer(&mut self, caller: Address, to: Address, amount: U256) -> Result<()> {
        self.ledger.transfer(caller, to, amount)
    }

    pub fn transfer_from(
        &mut self,
        spender: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<()> {
        self.ledger.transfer_from(spender, from, to, amount)
    }

    // ========================================================================
    // ADMINISTRATION
    // ========================================================================

    pub fn set_trusted_remote(
        &mut self,
        caller: &Address,
        remote_chain_id: ChainId,
        path: Vec<u8>,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.paths.set_trusted_remote(remote_chain_id, path.clone());
        events.emit(Event::SetTrustedRemote {
            remote_chain_id,
            path,
        });
        Ok(())
    }

    pub fn set_trusted_remote_address(
        &mut self,
        caller: &Address,
        remote_chain_id: ChainId,
        remote: Address,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.paths.set_trusted_remote_address(remote_chain_id, remote);
        let path = self
            .paths
            .trusted_remote(remote_chain_id)
            .map(<[u8]>::to_vec)
            .unwrap_or_default();
        events.emit(Event::SetTrustedRemote {
            remote_chain_id,
            path,
        });
        Ok(())
    }

    pub fn set_min_dst_gas(
        &mut self,
        caller: &Address,
        dst_chain_id: ChainId,
        packet_type: u8,
        min_gas: u64,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.min_dst_gas.insert((dst_chain_id, packet_type), min_gas);
        events.emit(Event::SetMinDstGas {
            dst_chain_id,
            packet_type,
            min_gas,
        });
        Ok(())
    }

    pub fn set_use_custom_adapter_params(
        &mut self,
        caller: &Address,
        enabled: bool,
        events: &mut EventLog,
    ) -> Result<()> {
        self.ownership.ensure_owner(caller)?;
        self.use_custom_adapter_params = enabled;
        events.emit(Event::SetUseCustomAdapterParams { enabled });
        Ok(())
    }

    pub fn ensure_owner(&self, caller: &Address) -> Result<()> {
        self.ownership.ensure_owner(caller)
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
    // DECIMALS
    // ========================================================================

    /// Drop the part of `amount` that cannot be represented in shared decimals.
    pub fn remove_dust(&self, amount: U256) -> U256 {
        amount - amount % self.ld2sd_rate
    }

    pub fn ld2sd(&self, amount: U256) -> Result<u64> {
        let amount_sd = amount / self.ld2sd_rate;
        if amount_sd > U256::from(u64::MAX) {
            return Err(OmniError::AmountTooLarge(amount));
        }
        Ok(amount_sd.low_u64())
    }

    pub fn sd2ld(&self, amount_sd: u64) -> U256 {
        // At most 10^MAX_LOCAL_DECIMALS * u64::MAX, well inside U256.
        U256::from(amount_sd) * self.ld2sd_rate
    }

    // ========================================================================
    // SEND
    // ========================================================================

    pub fn estimate_send_fee(
        &self,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        adapter_params: &[u8],
        endpoint: &Endpoint,
    ) -> Result<MessagingFee> {
        let packet = TokenPacket::Send {
            to,
            amount_sd: self.ld2sd(amount)?,
        };
        let params = self.resolve_adapter_params(dst_chain_id, PT_SEND, adapter_params, 0)?;
        endpoint.quote(dst_chain_id, &packet.encode(), &params)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn estimate_send_and_call_fee(
        &self,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        from: Address,
        payload: &[u8],
        gas_for_call: u64,
        adapter_params: &[u8],
        endpoint: &Endpoint,
    ) -> Result<MessagingFee> {
        let packet = TokenPacket::SendAndCall {
            to,
            amount_sd: self.ld2sd(amount)?,
            from,
            gas_for_call,
            payload: payload.to_vec(),
        };
        let params = self.resolve_adapter_params(
            dst_chain_id,
            PT_SEND_AND_CALL,
            adapter_params,
            gas_for_call,
        )?;
        endpoint.quote(dst_chain_id, &packet.encode(), &params)
    }

    /// Plain value transfer of `amount` from `from` to `to` on `dst_chain_id`.
    #[allow(clippy::too_many_arguments)]
    pub fn send_from(
        &mut self,
        from: Address,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
        endpoint: &mut Endpoint,
        events: &mut EventLog,
    ) -> Result<Outbound> {
        self.send(
            from,
            dst_chain_id,
            amount,
            adapter_params,
            value,
            endpoint,
            events,
            |amount_sd| TokenPacket::Send { to, amount_sd },
            0,
        )
    }

    /// Value transfer that asks the destination to invoke `to`'s receiver hook with
    /// `payload`, allotting `gas_for_call` gas on first delivery.
    #[allow(clippy::too_many_arguments)]
    pub fn send_and_call(
        &mut self,
        from: Address,
        dst_chain_id: ChainId,
        to: Address,
        amount: U256,
        payload: Vec<u8>,
        gas_for_call: u64,
        adapter_params: &[u8],
        value: U256,
        endpoint: &mut Endpoint,
        events: &mut EventLog,
    ) -> Result<Outbound> {
        self.send(
            from,
            dst_chain_id,
            amount,
            adapter_params,
            value,
            endpoint,
            events,
            move |amount_sd| TokenPacket::SendAndCall {
                to,
                amount_sd,
                from,
                gas_for_call,
                payload,
            },
            gas_for_call,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn send(
        &mut self,
        from: Address,
        dst_chain_id: ChainId,
        amount: U256,
        adapter_params: &[u8],
        value: U256,
        endpoint: &mut Endpoint,
        events: &mut EventLog,
        build: impl FnOnce(u64) -> TokenPacket,
        extra_gas: u64,
    ) -> Result<Outbound> {
        let amount = self.remove_dust(amount);
        if amount.is_zero() {
            return Err(OmniError::ZeroAmount);
        }
        let available = self.ledger.balance_of(&from);
        if available < amount {
            return Err(OmniError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        let packet = build(self.ld2sd(amount)?);
        let to = packet.to();
        let params = self.resolve_adapter_params(
            dst_chain_id,
            packet.packet_type(),
            adapter_params,
            extra_gas,
        )?;
        let remote = self.paths.trusted_remote_address(dst_chain_id)?;

        let payload = packet.encode();
        let fee = endpoint.quote(dst_chain_id, &payload, &params)?;
        if value < fee.native_fee {
            return Err(OmniError::InsufficientFee {
                required: fee.native_fee,
                supplied: value,
            });
        }

        // Commitment point: from here on the value has left `from`.
        self.debit(from, amount)?;
        let message = endpoint.stamp(self.address, dst_chain_id, remote, payload);

        info!(
            "SendToChain: dst_chain={}, from={}, to={}, amount={}, nonce={}",
            dst_chain_id,
            hex_address(&from),
            hex_address(&to),
            amount,
            message.nonce
        );
        events.emit(Event::SendToChain {
            dst_chain_id,
            from,
            to,
            amount,
            nonce: message.nonce,
        });

        Ok(Outbound {
            message,
            fee,
            refund: value - fee.native_fee,
        })
    }

    /// Adapter params the send will be priced and executed with.
    ///
    /// With custom params enabled the caller's params must reach
    /// `min_dst_gas + extra_gas`; otherwise the caller must pass none and that sum
    /// (or [`DEFAULT_DST_GAS`] when it is zero) is used.
    fn resolve_adapter_params(
        &self,
        dst_chain_id: ChainId,
        packet_type: u8,
        raw: &[u8],
        extra_gas: u64,
    ) -> Result<AdapterParams> {
        let required = U256::from(self.min_dst_gas(dst_chain_id, packet_type))
            + U256::from(extra_gas);

        if self.use_custom_adapter_params {
            if required.is_zero() {
                return Err(OmniError::MinGasNotSet {
                    chain_id: dst_chain_id,
                    packet_type,
                });
            }
            let params = AdapterParams::decode(raw)?;
            if params.gas() < required {
                return Err(OmniError::InsufficientGasParams {
                    required,
                    provided: params.gas(),
                });
            }
            return Ok(params);
        }

        if !raw.is_empty() {
            return Err(OmniError::AdapterParamsNotAllowed);
        }
        let gas = if required.is_zero() {
            U256::from(DEFAULT_DST_GAS)
        } else {
            required
        };
        Ok(AdapterParams::V1 { gas })
    }

    fn debit(&mut self, from: Address, amount: U256) -> Result<()> {
        match self.custody {
            Custody::Proxy => self.ledger.transfer(from, self.address, amount),
            Custody::Native => self.ledger.burn(from, amount),
        }
    }

    fn credit(&mut self, to: Address, amount: U256) -> Result<()> {
        match self.custody {
            Custody::Proxy => self.ledger.transfer(self.address, to, amount),
            Custody::Native => self.ledger.mint(to, amount),
        }
    }

    // ========================================================================
    // RECEIVE
    // ========================================================================

    /// Apply an admitted, trusted message: credit first, then the hook.
    ///
    /// A message whose credit cannot be applied is stored whole for
    /// [`OmnichainToken::retry_message`], so its value is never dropped.
    pub fn apply(
        &mut self,
        message: &Message,
        receivers: &mut Receivers,
        events: &mut EventLog,
    ) -> DeliveryStatus {
        match self.try_apply(message, receivers, events) {
            Ok(status) => status,
            Err(e) => self.store(message, e.to_string(), events),
        }
    }

    /// Credit and run the hook. Fails without side effects when the credit cannot
    /// be applied; hook failures are deferred into the retry ledger.
    fn try_apply(
        &mut self,
        message: &Message,
        receivers: &mut Receivers,
        events: &mut EventLog,
    ) -> Result<DeliveryStatus> {
        let packet = TokenPacket::decode(&message.payload)?;
        let to = packet.to();
        let amount = self.sd2ld(packet.amount_sd());
        self.credit(to, amount)?;
        events.emit(Event::ReceiveFromChain {
            src_chain_id: message.src_chain_id,
            to,
            amount,
            nonce: message.nonce,
        });

        let (from, gas_for_call, payload) = match packet {
            TokenPacket::Send { .. } => return Ok(DeliveryStatus::Credited),
            TokenPacket::SendAndCall {
                from,
                gas_for_call,
                payload,
                ..
            } => (from, gas_for_call, payload),
        };

        let Some(receiver) = receivers.get_mut(&to) else {
            events.emit(Event::NonContractAddress { to });
            return Ok(DeliveryStatus::Credited);
        };

        let args = DeliveryArgs {
            src_chain_id: message.src_chain_id,
            src_path: message.src_path(),
            nonce: message.nonce,
            from,
            to,
            amount,
            payload,
        };

        if receiver.is_paused() {
            return Ok(self.defer(args, "receiver paused".to_string(), events));
        }

        match receiver.on_receive(self.address, &args, Some(gas_for_call), events) {
            Ok(()) => {
                events.emit(Event::CallReceivedSuccess {
                    src_chain_id: args.src_chain_id,
                    nonce: args.nonce,
                    to,
                });
                Ok(DeliveryStatus::HookApplied)
            }
            Err(e) => Ok(self.defer(args, e.to_string(), events)),
        }
    }

    /// Re-run the receive of a stored message. Open to any caller: the record only
    /// matches the identical message. On success the record is removed and the
    /// delivery's new status returned; on failure it stays.
    pub fn retry_message(
        &mut self,
        message: &Message,
        receivers: &mut Receivers,
        events: &mut EventLog,
    ) -> Result<DeliveryStatus> {
        let key = self
            .retries
            .stored_key(message)
            .ok_or(OmniError::NoStoredMessage)?;

        let status = self.try_apply(message, receivers, events)?;
        self.retries.take_stored(&key);

        info!(
            "RetryMessageSuccess: key={}, src_chain={}, nonce={}",
            hex_hash(&key),
            message.src_chain_id,
            message.nonce
        );
        events.emit(Event::RetrySuccess { key });
        Ok(status)
    }

    /// Re-invoke the hook of a pending delivery with its original arguments.
    ///
    /// Allowed for the token owner and the receiver's owner.
    /// On success the record is removed; on failure it stays and the hook's error
    /// is returned.
    pub fn retry_delivery(
        &mut self,
        caller: &Address,
        args: &DeliveryArgs,
        receivers: &mut Receivers,
        events: &mut EventLog,
    ) -> Result<()> {
        let key = args.key();
        if !self.retries.contains(&key) {
            return Err(OmniError::NoPendingDelivery);
        }

        let receiver = receivers
            .get_mut(&args.to)
            .ok_or(OmniError::UnknownReceiver(args.to))?;
        let authorized = self.ownership.is_owner(caller) || receiver.owner() == *caller;
        if !authorized {
            return Err(OmniError::Unauthorized { caller: *caller });
        }

        receiver.on_receive(self.address, args, None, events)?;
        self.retries.resolve(&key);

        info!(
            "RetrySuccess: key={}, src_chain={}, nonce={}",
            hex_hash(&key),
            args.src_chain_id,
            args.nonce
        );
        events.emit(Event::RetrySuccess { key });
        Ok(())
    }

    fn defer(&mut self, args: DeliveryArgs, reason: String, events: &mut EventLog) -> DeliveryStatus {
        let src_chain_id = args.src_chain_id;
        let nonce = args.nonce;
        let key = self.retries.record(args, reason.clone());

        warn!(
            "MessageFailed: src_chain={}, nonce={}, key={}, reason={}",
            src_chain_id,
            nonce,
            hex_hash(&key),
            reason
        );
        events.emit(Event::MessageFailed {
            src_chain_id,
            nonce,
            key,
            reason: reason.clone(),
        });
        DeliveryStatus::HookDeferred { key, reason }
    }

    fn store(&mut self, message: &Message, reason: String, events: &mut EventLog) -> DeliveryStatus {
        let key = self.retries.store(message.clone(), reason.clone());

        warn!(
            "PayloadStored: src_chain={}, nonce={}, key={}, reason={}",
            message.src_chain_id,
            message.nonce,
            hex_hash(&key),
            reason
        );
        events.emit(Event::PayloadStored {
            src_chain_id: message.src_chain_id,
            nonce: message.nonce,
            key,
            reason: reason.clone(),
        });
        DeliveryStatus::Stored { key, reason }
    }
}
