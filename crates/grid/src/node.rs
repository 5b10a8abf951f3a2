//! One node of the grid.
//!
//! [`Grid`] owns the state a node's inbound and outbound halves share: the
//! ring, the health map and the expiring holder. The membership feed drives
//! it through [`include_node`](Grid::include_node),
//! [`exclude_node`](Grid::exclude_node) and
//! [`inform_node_is_healthy`](Grid::inform_node_is_healthy); the transport
//! drives it through [`receive`](Grid::receive).

use crate::config::GridConfig;
use crate::control::{Inbound, Transport};
use crate::error::{GridError, Result};
use crate::health::NodeHealth;
use crate::protocol::{Answer, Delivery, GridMessage};
use crate::receiver::GridApplicationMessageHandler;
use crate::sender::OutboundGridActorControl;
use async_trait::async_trait;
use buffering::ExpiringHardRefHolder;
use corelib::{NodeId, RingBuilder, SharedRing};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::info;

pub struct Grid {
    local: NodeId,
    config: GridConfig,
    ring: Arc<SharedRing<NodeId>>,
    health: Arc<NodeHealth>,
    holder: Arc<ExpiringHardRefHolder>,
    control: Arc<OutboundGridActorControl>,
    handler: Arc<GridApplicationMessageHandler>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl Grid {
    /// Assemble a node. Must be called from within a tokio runtime, which
    /// then runs every dispatch and the holder's sweeper.
    ///
    /// The ring starts empty and every node, the local one included, starts
    /// unhealthy until the membership feed says otherwise.
    pub fn new(
        local: NodeId,
        config: GridConfig,
        transport: Arc<dyn Transport>,
        inbound: Arc<dyn Inbound>,
    ) -> Result<Self> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|e| GridError::Runtime(e.to_string()))?;

        let ring = Arc::new(SharedRing::new(
            RingBuilder::new()
                .with_points_per_node(config.points_per_node)
                .with_hasher(config.hasher())
                .build(config.ring),
        ));
        let health = Arc::new(NodeHealth::new());
        let codec = config.codec.build();
        let holder = Arc::new(ExpiringHardRefHolder::new(config.hold_timeout()));
        let sweeper = holder.spawn_sweeper(config.sweep_interval());

        let control = Arc::new(OutboundGridActorControl::new(
            local.clone(),
            Arc::clone(&ring),
            Arc::clone(&codec),
            transport,
            Arc::clone(&health),
            Arc::clone(&holder),
            config.answer_timeout(),
            runtime.clone(),
        ));
        let inbound = Arc::new(AnswerRouting {
            control: Arc::clone(&control),
            local: inbound,
        });
        let handler = Arc::new(GridApplicationMessageHandler::new(
            local.clone(),
            Arc::clone(&ring),
            codec,
            inbound,
            control.clone(),
            Arc::clone(&health),
            Arc::clone(&holder),
            runtime,
        ));

        info!(node = %local, ring = %config.ring, hash = %config.hash, "grid node ready");
        Ok(Self {
            local,
            config,
            ring,
            health,
            holder,
            control,
            handler,
            sweeper: Mutex::new(Some(sweeper)),
        })
    }

    pub fn local(&self) -> &NodeId {
        &self.local
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn ring(&self) -> &Arc<SharedRing<NodeId>> {
        &self.ring
    }

    pub fn health(&self) -> &Arc<NodeHealth> {
        &self.health
    }

    pub fn holder(&self) -> &Arc<ExpiringHardRefHolder> {
        &self.holder
    }

    pub fn control(&self) -> &Arc<OutboundGridActorControl> {
        &self.control
    }

    pub fn handler(&self) -> &Arc<GridApplicationMessageHandler> {
        &self.handler
    }

    /// A node joined the cluster.
    pub fn include_node(&self, node: NodeId) {
        self.ring.include_node(node);
    }

    /// A node left the cluster.
    pub fn exclude_node(&self, node: &NodeId) {
        self.ring.exclude_node(node);
        self.health.forget(node);
    }

    pub fn inform_node_is_healthy(&self, node: &NodeId, healthy: bool) {
        self.handler.inform_node_is_healthy(node, healthy);
        self.control.inform_node_is_healthy(node, healthy);
    }

    /// Hand a payload received from `from` to the inbound handler.
    pub fn receive(&self, from: &NodeId, payload: &[u8]) {
        self.handler.handle(from, payload);
    }

    /// Node owning `address`, if any node is on the ring.
    pub fn owner_of(&self, address: &str) -> Option<NodeId> {
        self.ring.node_of(address.as_bytes())
    }

    pub async fn grid_deliver(&self, delivery: Delivery) -> Result<()> {
        self.control.grid_deliver(delivery).await
    }

    /// Stop the holder's background sweeper.
    pub fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.abort();
            info!(node = %self.local, "grid node stopped");
        }
    }
}

impl Drop for Grid {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.abort();
        }
    }
}

impl fmt::Debug for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grid")
            .field("local", &self.local)
            .field("ring", &self.ring)
            .field("healthy", &self.health.healthy_nodes())
            .finish()
    }
}

/// Completes this node's own requests before answers reach the local
/// framework.
struct AnswerRouting {
    control: Arc<OutboundGridActorControl>,
    local: Arc<dyn Inbound>,
}

#[async_trait]
impl Inbound for AnswerRouting {
    async fn grid_deliver(&self, sender: &NodeId, delivery: Delivery) -> Result<()> {
        self.local.grid_deliver(sender, delivery).await
    }

    async fn actor_deliver(&self, sender: &NodeId, delivery: Delivery) -> Result<()> {
        self.local.actor_deliver(sender, delivery).await
    }

    async fn start(&self, sender: &NodeId, delivery: Delivery) -> Result<()> {
        self.local.start(sender, delivery).await
    }

    async fn relocate(
        &self,
        sender: &NodeId,
        delivery: Delivery,
        pending: Vec<GridMessage>,
    ) -> Result<()> {
        self.local.relocate(sender, delivery, pending).await
    }

    async fn answer(&self, sender: &NodeId, answer: Answer) -> Result<()> {
        if answer.correlation.is_grid_minted() && self.control.is_awaiting(answer.correlation) {
            self.control.complete_answer(answer);
            return Ok(());
        }
        self.local.answer(sender, answer).await
    }
}
