//! Collaborators the routing core consumes.
//!
//! The grid decides *where* a message goes; these traits are what it hands
//! messages to once it knows.
//!
//! - [`Inbound`]: the local actor framework, for messages this node owns
//! - [`Outbound`]: the send path to other nodes
//! - [`Transport`]: the wire, moving encoded payloads between nodes
//!
//! # Thread Safety
//!
//! Implementations are shared across tasks and must be `Send + Sync`.

use crate::error::Result;
use crate::protocol::{Answer, Delivery, Forward, GridMessage};
use async_trait::async_trait;
use bytes::Bytes;
use corelib::NodeId;

/// Local delivery, invoked only on the node owning the address.
///
/// `sender` is the node that originally sent the message, even when it
/// arrived through one or more forwards.
#[async_trait]
pub trait Inbound: Send + Sync + 'static {
    async fn grid_deliver(&self, sender: &NodeId, delivery: Delivery) -> Result<()>;

    async fn actor_deliver(&self, sender: &NodeId, delivery: Delivery) -> Result<()>;

    async fn start(&self, sender: &NodeId, delivery: Delivery) -> Result<()>;

    /// `pending` holds the messages the actor had not processed on its
    /// previous node, already decoded, in their original order.
    async fn relocate(
        &self,
        sender: &NodeId,
        delivery: Delivery,
        pending: Vec<GridMessage>,
    ) -> Result<()>;

    async fn answer(&self, sender: &NodeId, answer: Answer) -> Result<()>;
}

#[async_trait]
pub trait Outbound: Send + Sync + 'static {
    /// Hand `forward` to the node `to`, which owns the wrapped message.
    async fn forward(&self, to: &NodeId, forward: Forward) -> Result<()>;
}

#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Deliver an encoded message to `to`. The receiving node hands it to its
    /// [`GridApplicationMessageHandler`](crate::GridApplicationMessageHandler).
    async fn transmit(&self, to: &NodeId, payload: Bytes) -> Result<()>;
}
