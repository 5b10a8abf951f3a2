//! Last known health of every node.
//!
//! Fed by the membership feed through `inform_node_is_healthy`. Reads may
//! briefly lag writes; callers that buffer work re-check after buffering so a
//! flip that raced them is not missed.

use corelib::NodeId;
use dashmap::DashMap;
use tracing::info;

#[derive(Debug, Default)]
pub struct NodeHealth {
    nodes: DashMap<NodeId, bool>,
}

impl NodeHealth {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nodes never reported on are unhealthy.
    pub fn is_healthy(&self, node: &NodeId) -> bool {
        self.nodes.get(node).map_or(false, |healthy| *healthy)
    }

    /// Record `node`'s health. Returns `true` if this call flipped it to healthy.
    pub fn set(&self, node: &NodeId, healthy: bool) -> bool {
        let previous = self.nodes.insert(node.clone(), healthy);
        if previous != Some(healthy) {
            info!(node = %node, healthy, "node health changed");
        }
        healthy && previous != Some(true)
    }

    pub fn forget(&self, node: &NodeId) {
        self.nodes.remove(node);
    }

    /// Healthy nodes, ascending.
    pub fn healthy_nodes(&self) -> Vec<NodeId> {
        let mut healthy: Vec<NodeId> = self
            .nodes
            .iter()
            .filter(|entry| *entry.value())
            .map(|entry| entry.key().clone())
            .collect();
        healthy.sort();
        healthy
    }
}
