//! In-process transport connecting several [`Grid`] nodes.
//!
//! Used by the CLI simulation and the integration tests. Every transmission
//! is recorded as a [`Hop`] so callers can inspect the route a message took.

use crate::control::Transport;
use crate::error::{GridError, Result};
use crate::node::Grid;
use async_trait::async_trait;
use bytes::Bytes;
use corelib::NodeId;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::trace;

/// One transmission between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hop {
    pub from: NodeId,
    pub to: NodeId,
    pub payload: Bytes,
}

#[derive(Debug, Default)]
pub struct LoopbackNetwork {
    nodes: DashMap<NodeId, Weak<Grid>>,
    hops: Mutex<Vec<Hop>>,
}

impl LoopbackNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport for the node `local`.
    pub fn transport(self: &Arc<Self>, local: NodeId) -> Arc<LoopbackTransport> {
        Arc::new(LoopbackTransport {
            local,
            network: Arc::clone(self),
        })
    }

    /// Make `grid` reachable under its local id.
    pub fn attach(&self, grid: &Arc<Grid>) {
        self.nodes.insert(grid.local().clone(), Arc::downgrade(grid));
    }

    pub fn detach(&self, node: &NodeId) {
        self.nodes.remove(node);
    }

    /// Every transmission so far, in order.
    pub fn hops(&self) -> Vec<Hop> {
        self.hops.lock().clone()
    }

    fn deliver(&self, from: &NodeId, to: &NodeId, payload: Bytes) -> Result<()> {
        let grid = self
            .nodes
            .get(to)
            .and_then(|node| node.upgrade())
            .ok_or_else(|| GridError::Transport {
                node: to.clone(),
                reason: "node is not attached".to_string(),
            })?;
        trace!(from = %from, to = %to, bytes = payload.len(), "loopback transmit");
        self.hops.lock().push(Hop {
            from: from.clone(),
            to: to.clone(),
            payload: payload.clone(),
        });
        grid.receive(from, &payload);
        Ok(())
    }
}

#[derive(Debug)]
pub struct LoopbackTransport {
    local: NodeId,
    network: Arc<LoopbackNetwork>,
}

#[async_trait]
impl Transport for LoopbackTransport {
    async fn transmit(&self, to: &NodeId, payload: Bytes) -> Result<()> {
        self.network.deliver(&self.local, to, payload)
    }
}
