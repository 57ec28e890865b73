//! Asynchronous Relay Module
//!
//! Production counterpart of the in-process transport. Sends are committed on the
//! source chain and queued on an unbounded channel; a worker task drains the queue
//! in dispatch order and delivers each message to its destination chain.
//!
//! ## Architecture
//!
//! The relay:
//! 1. Receives envelopes from [`RelayTransport::dispatch`]
//! 2. Skips any nonce at or below the highest one already relayed on its path
//! 3. Waits the configured delivery delay, then delivers under the network write lock
//! 4. Publishes every [`DeliveryReport`] on a broadcast channel

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use oft_core::{
    ChainId, DeliveryReceipt, DeliveryReport, Message, MessageTransport, Network, OmniError,
    Outbound,
};
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::RelaySettings;

/// Network shared between the service (sends, admin calls) and the relay worker.
pub type SharedNetwork = Arc<RwLock<Network<RelayTransport>>>;

// ============================================================================
// TRANSPORT
// ============================================================================

/// A committed message travelling to the relay worker.
#[derive(Debug, Clone)]
pub struct Envelope {
    pub message: Message,
    pub receipt: DeliveryReceipt,
}

/// Transport half that queues dispatched messages for the relay worker.
#[derive(Debug, Clone)]
pub struct RelayTransport {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl RelayTransport {
    /// Create the transport and the inbox the relay worker drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Envelope>) {
        let (sender, inbox) = mpsc::unbounded_channel();
        (Self { sender }, inbox)
    }
}

impl MessageTransport for RelayTransport {
    fn dispatch(&mut self, outbound: &Outbound) -> oft_core::Result<DeliveryReceipt> {
        let receipt = DeliveryReceipt::new(outbound);
        self.sender
            .send(Envelope {
                message: outbound.message.clone(),
                receipt: receipt.clone(),
            })
            .map_err(|_| OmniError::TransportClosed("relay worker has stopped".to_string()))?;
        Ok(receipt)
    }

    fn take_ready(&mut self) -> Vec<Message> {
        // Delivery happens on the worker task.
        Vec::new()
    }
}

// ============================================================================
// RELAY STATE
// ============================================================================

/// Internal state for tracking relayed messages.
#[derive(Debug, Default)]
struct RelayState {
    /// Highest relayed nonce per inbound path ((src chain, src path) -> nonce).
    /// The inbox is in dispatch order, so nonces on a path only increase.
    processed_nonces: HashMap<(ChainId, Vec<u8>), u64>,
    relayed: u64,
    skipped: u64,
}

// ============================================================================
// RELAY WORKER
// ============================================================================

pub struct Relay {
    network: SharedNetwork,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    delivery_delay: Duration,
    reports: broadcast::Sender<DeliveryReport>,
    state: RelayState,
}

impl Relay {
    pub fn new(
        network: SharedNetwork,
        inbox: mpsc::UnboundedReceiver<Envelope>,
        settings: &RelaySettings,
    ) -> Self {
        let (reports, _) = broadcast::channel(settings.report_capacity.max(1));
        Self {
            network,
            inbox,
            delivery_delay: Duration::from_millis(settings.delivery_delay_ms),
            reports,
            state: RelayState::default(),
        }
    }

    /// Receive delivery reports published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<DeliveryReport> {
        self.reports.subscribe()
    }

    /// Run the worker until every transport handle is dropped.
    pub async fn run(mut self) -> Result<()> {
        info!(
            "Starting relay worker: delivery_delay={}ms",
            self.delivery_delay.as_millis()
        );

        while let Some(envelope) = self.inbox.recv().await {
            self.relay(envelope).await;
        }

        info!(
            "Relay inbox closed: relayed={}, skipped={}",
            self.state.relayed, self.state.skipped
        );
        Ok(())
    }

    /// Spawn [`Relay::run`] on the current runtime.
    pub fn spawn(self) -> JoinHandle<Result<()>> {
        tokio::spawn(self.run())
    }

    async fn relay(&mut self, envelope: Envelope) {
        let message = envelope.message;
        let path = (message.src_chain_id, message.src_path());

        if self
            .state
            .processed_nonces
            .get(&path)
            .is_some_and(|highest| message.nonce <= *highest)
        {
            debug!(
                "Skipping already relayed nonce {} from chain {}",
                message.nonce, message.src_chain_id
            );
            self.state.skipped += 1;
            return;
        }

        if !self.delivery_delay.is_zero() {
            tokio::time::sleep(self.delivery_delay).await;
        }

        let nonce = message.nonce;
        let reports = {
            let mut network = self.network.write().await;
            network.deliver(message)
        };

        self.state.processed_nonces.insert(path, nonce);
        self.state.relayed += 1;

        for report in reports {
            if self.reports.send(report).is_err() {
                debug!("No subscribers for delivery report");
            }
        }
    }
}
