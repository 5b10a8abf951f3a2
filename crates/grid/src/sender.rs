//! Outbound side of the grid.
//!
//! Every send funnels through [`OutboundGridActorControl::send`]: the message
//! is encoded on the caller's thread, then transmitted right away if the
//! recipient is healthy, or parked in that recipient's out-buffer until the
//! membership feed reports it healthy again.
//!
//! Requests that expect an answer mint a [`CorrelationId`], register a
//! waiter, and race the answer against the configured timeout.

use crate::codec::MessageCodec;
use crate::control::{Outbound, Transport};
use crate::correlation::PendingAnswers;
use crate::error::{GridError, Result};
use crate::health::NodeHealth;
use crate::protocol::{Answer, AnswerOutcome, CorrelationId, Delivery, Forward, GridMessage, Relocation};
use async_trait::async_trait;
use buffering::{ExpiringHardRefHolder, OutBuffers};
use bytes::Bytes;
use corelib::{NodeId, SharedRing};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, error, trace};

/// An encoded message waiting for its recipient to become healthy.
#[derive(Debug)]
pub struct PendingSend {
    pub to: NodeId,
    pub kind: &'static str,
    pub payload: Bytes,
}

pub struct OutboundGridActorControl {
    local: NodeId,
    ring: Arc<SharedRing<NodeId>>,
    codec: Arc<dyn MessageCodec>,
    transport: Arc<dyn Transport>,
    health: Arc<NodeHealth>,
    buffers: OutBuffers<NodeId, PendingSend>,
    answers: PendingAnswers,
    answer_timeout: Duration,
    runtime: Handle,
}

impl OutboundGridActorControl {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        local: NodeId,
        ring: Arc<SharedRing<NodeId>>,
        codec: Arc<dyn MessageCodec>,
        transport: Arc<dyn Transport>,
        health: Arc<NodeHealth>,
        holder: Arc<ExpiringHardRefHolder>,
        answer_timeout: Duration,
        runtime: Handle,
    ) -> Self {
        Self {
            local,
            ring,
            codec,
            transport,
            health,
            buffers: OutBuffers::new(holder),
            answers: PendingAnswers::new(),
            answer_timeout,
            runtime,
        }
    }

    pub fn local(&self) -> &NodeId {
        &self.local
    }

    pub fn answer_timeout(&self) -> Duration {
        self.answer_timeout
    }

    /// Encode `message` and transmit it to `recipient`, or buffer it while
    /// `recipient` is unhealthy.
    ///
    /// # Errors
    ///
    /// Encoding errors, and transport errors for an immediate transmission.
    /// Buffered sends report transport errors in the log only.
    pub async fn send(&self, recipient: NodeId, message: &GridMessage) -> Result<()> {
        let payload = self.codec.encode(message)?;

        if self.health.is_healthy(&recipient) {
            metrics::counter!("grid.outbound.sent").increment(1);
            trace!(to = %recipient, message = %message, "transmitting");
            return self.transport.transmit(&recipient, payload).await;
        }

        self.buffers.enqueue(
            recipient.clone(),
            Arc::new(PendingSend {
                to: recipient.clone(),
                kind: message.kind(),
                payload,
            }),
        );
        metrics::counter!("grid.outbound.buffered").increment(1);
        debug!(to = %recipient, message = %message, "recipient unhealthy, buffering");

        // The recipient may have turned healthy while this send was buffered
        if self.health.is_healthy(&recipient) {
            self.disburse(&recipient);
        }
        Ok(())
    }

    /// Owner of `address`, or this node on an empty ring.
    pub fn recipient_of(&self, address: &str) -> NodeId {
        self.ring
            .node_of(address.as_bytes())
            .unwrap_or_else(|| self.local.clone())
    }

    pub async fn grid_deliver(&self, delivery: Delivery) -> Result<()> {
        let recipient = self.recipient_of(&delivery.address);
        self.send(recipient, &GridMessage::GridDeliver(delivery)).await
    }

    pub async fn actor_deliver(&self, delivery: Delivery) -> Result<()> {
        let recipient = self.recipient_of(&delivery.address);
        self.send(recipient, &GridMessage::ActorDeliver(delivery)).await
    }

    pub async fn start(&self, delivery: Delivery) -> Result<()> {
        let recipient = self.recipient_of(&delivery.address);
        self.send(recipient, &GridMessage::Start(delivery)).await
    }

    /// Move the actor at `delivery.address` to its owner along with the
    /// messages it has not processed yet.
    pub async fn relocate(&self, delivery: Delivery, pending: &[GridMessage]) -> Result<()> {
        let pending = pending
            .iter()
            .map(|message| self.codec.encode(message).map(|bytes| bytes.to_vec()))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let recipient = self.recipient_of(&delivery.address);
        self.send(recipient, &GridMessage::Relocate(Relocation { delivery, pending }))
            .await
    }

    pub async fn answer(&self, to: NodeId, answer: Answer) -> Result<()> {
        self.send(to, &GridMessage::Answer(answer)).await
    }

    /// Send `message` and wait for its answer.
    ///
    /// A missing answer resolves to [`AnswerOutcome::Timeout`] after the
    /// configured answer timeout; it is an outcome, not an error.
    ///
    /// # Errors
    ///
    /// [`GridError::InvalidArgument`] for an `Answer` or a `Forward`, which
    /// cannot be requested; otherwise whatever [`send`](Self::send) fails with.
    pub async fn request(&self, mut message: GridMessage) -> Result<AnswerOutcome> {
        let recipient = match (&message, message.address()) {
            (GridMessage::Forward(_), _) | (_, None) => {
                return Err(GridError::InvalidArgument(format!(
                    "{} cannot expect an answer",
                    message.kind()
                )))
            }
            (_, Some(address)) => self.recipient_of(address),
        };

        let (correlation, rx) = self.answers.register();
        if let Some(delivery) = message.delivery_mut() {
            delivery.answer_to = Some(correlation);
        }

        if let Err(error) = self.send(recipient, &message).await {
            self.answers.cancel(correlation);
            return Err(error);
        }
        Ok(self
            .answers
            .await_answer(correlation, rx, self.answer_timeout)
            .await)
    }

    /// Complete the request an inbound answer belongs to.
    pub fn complete_answer(&self, answer: Answer) -> bool {
        self.answers.complete(answer)
    }

    pub fn is_awaiting(&self, correlation: CorrelationId) -> bool {
        self.answers.is_waiting(correlation)
    }

    /// Record `node`'s health. When it is healthy, everything buffered for it
    /// is transmitted in the order it was sent.
    pub fn inform_node_is_healthy(&self, node: &NodeId, healthy: bool) {
        self.health.set(node, healthy);
        if healthy {
            self.disburse(node);
        }
    }

    /// Start one transmit task per message buffered for `node`, oldest first.
    pub fn disburse(&self, node: &NodeId) -> usize {
        let pending = self.buffers.take_live(node);
        let started = pending.len();
        for item in pending {
            let transport = Arc::clone(&self.transport);
            self.runtime.spawn(async move {
                if let Err(error) = transport.transmit(&item.to, item.payload.clone()).await {
                    error!(to = %item.to, kind = item.kind, %error, "buffered transmit failed");
                }
            });
        }
        if started > 0 {
            debug!(to = %node, started, "disbursed buffered sends");
        }
        started
    }

    /// Live messages buffered for `node`.
    pub fn pending(&self, node: &NodeId) -> usize {
        self.buffers.pending(node)
    }
}

#[async_trait]
impl Outbound for OutboundGridActorControl {
    async fn forward(&self, to: &NodeId, forward: Forward) -> Result<()> {
        self.send(to.clone(), &GridMessage::Forward(forward)).await
    }
}

impl fmt::Debug for OutboundGridActorControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutboundGridActorControl")
            .field("local", &self.local)
            .field("codec", &self.codec.name())
            .field("awaiting", &self.answers.len())
            .field("answer_timeout", &self.answer_timeout)
            .finish()
    }
}
