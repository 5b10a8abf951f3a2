//! Inbound side of the grid.
//!
//! # States
//!
//! The handler has two implicit states, read from the local node's health:
//!
//! ```text
//!             inform_node_is_healthy(local, true)  -> disburse buffer
//!  Buffering ------------------------------------------------> Dispatching
//!            <------------------------------------------------
//!             inform_node_is_healthy(local, false)
//! ```
//!
//! - **Dispatching**: each decoded message is dispatched on its own task as
//!   soon as it arrives
//! - **Buffering**: decoded messages wait in a [`WeakQueue`], kept alive by
//!   the [`ExpiringHardRefHolder`] for a bounded time
//!
//! # Routing
//!
//! Addressed messages are resolved on the ring. The owner handles them
//! through [`Inbound`]; any other node wraps them in a [`Forward`] and hands
//! them to [`Outbound`]. Answers are never routed.

use crate::codec::MessageCodec;
use crate::control::{Inbound, Outbound};
use crate::error::Result;
use crate::health::NodeHealth;
use crate::protocol::{Forward, GridMessage};
use buffering::{ExpiringHardRefHolder, WeakQueue};
use corelib::{NodeId, SharedRing};
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, trace, warn};

/// A decoded message waiting for the local node to become healthy.
#[derive(Debug, Clone)]
struct Pending {
    sender: NodeId,
    message: GridMessage,
}

pub struct GridApplicationMessageHandler {
    local: NodeId,
    ring: Arc<SharedRing<NodeId>>,
    codec: Arc<dyn MessageCodec>,
    inbound: Arc<dyn Inbound>,
    outbound: Arc<dyn Outbound>,
    health: Arc<NodeHealth>,
    buffer: WeakQueue<Pending>,
    holder: Arc<ExpiringHardRefHolder>,
    runtime: Handle,
}

impl GridApplicationMessageHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local: NodeId,
        ring: Arc<SharedRing<NodeId>>,
        codec: Arc<dyn MessageCodec>,
        inbound: Arc<dyn Inbound>,
        outbound: Arc<dyn Outbound>,
        health: Arc<NodeHealth>,
        holder: Arc<ExpiringHardRefHolder>,
        runtime: Handle,
    ) -> Self {
        Self {
            local,
            ring,
            codec,
            inbound,
            outbound,
            health,
            buffer: WeakQueue::new(),
            holder,
            runtime,
        }
    }

    pub fn local(&self) -> &NodeId {
        &self.local
    }

    /// Accept one payload from the wire.
    ///
    /// Undecodable payloads are logged and dropped. Everything else is either
    /// dispatched on a new task or buffered until the local node is healthy.
    pub fn handle(self: &Arc<Self>, from: &NodeId, payload: &[u8]) {
        let message = match self.codec.decode(payload) {
            Ok(message) => message,
            Err(error) => {
                metrics::counter!("grid.inbound.decode_failures").increment(1);
                warn!(from = %from, %error, "dropping undecodable message");
                return;
            }
        };
        trace!(from = %from, message = %message, "received");

        let pending = Arc::new(Pending {
            sender: from.clone(),
            message,
        });

        if self.health.is_healthy(&self.local) {
            self.spawn_dispatch(pending);
            return;
        }

        self.buffer.push(&pending);
        self.holder.hold_on_to(pending);
        metrics::counter!("grid.inbound.buffered").increment(1);
        debug!(from = %from, buffered = self.buffer.len(), "local node unhealthy, buffering");

        // The node may have turned healthy while this message was buffered
        if self.health.is_healthy(&self.local) {
            self.disburse();
        }
    }

    /// Record `node`'s health. When the local node is healthy, everything
    /// buffered so far is dispatched in arrival order.
    pub fn inform_node_is_healthy(self: &Arc<Self>, node: &NodeId, healthy: bool) {
        self.health.set(node, healthy);
        if healthy && node == &self.local {
            self.disburse();
        }
    }

    /// Start one dispatch task per buffered message, oldest first.
    ///
    /// Returns the number of tasks started.
    pub fn disburse(self: &Arc<Self>) -> usize {
        let mut started = 0;
        while let Some(pending) = self.buffer.poll() {
            self.spawn_dispatch(pending);
            started += 1;
        }
        if started > 0 {
            debug!(node = %self.local, started, "disbursed buffered messages");
        }
        started
    }

    /// Live messages currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn spawn_dispatch(self: &Arc<Self>, pending: Arc<Pending>) {
        let handler = Arc::clone(self);
        let Pending { sender, message } =
            Arc::try_unwrap(pending).unwrap_or_else(|shared| (*shared).clone());
        self.runtime.spawn(async move {
            let kind = message.kind();
            if let Err(error) = handler.dispatch(sender, message).await {
                error!(node = %handler.local, kind, %error, "dispatch failed");
            }
        });
    }

    /// Route one message: unwrap forwards, then deliver locally or forward to
    /// the owner.
    pub async fn dispatch(&self, sender: NodeId, message: GridMessage) -> Result<()> {
        let mut sender = sender;
        let mut message = message;
        loop {
            message = match message {
                GridMessage::Forward(Forward {
                    original_sender,
                    inner,
                }) => {
                    sender = original_sender;
                    *inner
                }
                GridMessage::Answer(answer) => {
                    return self.inbound.answer(&sender, answer).await;
                }
                GridMessage::GridDeliver(delivery) => {
                    if let Some(owner) = self.remote_owner(&delivery.address) {
                        return self
                            .forward(owner, sender, GridMessage::GridDeliver(delivery))
                            .await;
                    }
                    self.delivered("GridDeliver");
                    return self.inbound.grid_deliver(&sender, delivery).await;
                }
                GridMessage::ActorDeliver(delivery) => {
                    if let Some(owner) = self.remote_owner(&delivery.address) {
                        return self
                            .forward(owner, sender, GridMessage::ActorDeliver(delivery))
                            .await;
                    }
                    self.delivered("ActorDeliver");
                    return self.inbound.actor_deliver(&sender, delivery).await;
                }
                GridMessage::Start(delivery) => {
                    if let Some(owner) = self.remote_owner(&delivery.address) {
                        return self.forward(owner, sender, GridMessage::Start(delivery)).await;
                    }
                    self.delivered("Start");
                    return self.inbound.start(&sender, delivery).await;
                }
                GridMessage::Relocate(relocation) => {
                    if let Some(owner) = self.remote_owner(&relocation.delivery.address) {
                        return self
                            .forward(owner, sender, GridMessage::Relocate(relocation))
                            .await;
                    }
                    let pending = relocation
                        .pending
                        .iter()
                        .map(|payload| self.codec.decode(payload))
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                    self.delivered("Relocate");
                    return self
                        .inbound
                        .relocate(&sender, relocation.delivery, pending)
                        .await;
                }
            };
        }
    }

    /// The owner of `address` if it is another node. An empty ring owns
    /// nothing, so everything is local.
    fn remote_owner(&self, address: &str) -> Option<NodeId> {
        self.ring
            .node_of(address.as_bytes())
            .filter(|owner| owner != &self.local)
    }

    async fn forward(&self, owner: NodeId, sender: NodeId, message: GridMessage) -> Result<()> {
        metrics::counter!("grid.inbound.forwarded").increment(1);
        debug!(to = %owner, message = %message, "forwarding to owner");
        self.outbound
            .forward(&owner, Forward::new(sender, message))
            .await
    }

    fn delivered(&self, kind: &'static str) {
        metrics::counter!("grid.inbound.delivered").increment(1);
        trace!(node = %self.local, kind, "delivering locally");
    }
}

impl fmt::Debug for GridApplicationMessageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridApplicationMessageHandler")
            .field("local", &self.local)
            .field("codec", &self.codec.name())
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
