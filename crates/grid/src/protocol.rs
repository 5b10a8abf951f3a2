//! Messages exchanged between grid nodes.
//!
//! # Message Kinds
//!
//! ```text
//! GridDeliver / ActorDeliver / Start   routed by address to the owning node
//! Relocate                             routed by address, carries pending messages
//! Forward                              one routing hop, wraps the original message
//! Answer                               reply to a correlated request, never routed
//! ```
//!
//! Every routed message carries a [`Delivery`]: the target address, an
//! optional correlation id (present when the caller awaits an answer), a
//! human-readable representation used in logs, and an opaque body.

use corelib::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Matches an [`Answer`] back to the request awaiting it.
///
/// Ids picked by the local framework live in the low 63 bits. The top bit
/// marks ids minted by the grid's own requests, so the two never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(u64);

const GRID_MINTED: u64 = 1 << 63;

impl CorrelationId {
    /// A framework-chosen id. The top bit of `value` is ignored.
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value & !GRID_MINTED)
    }

    #[inline]
    pub(crate) fn minted(sequence: u64) -> Self {
        Self(sequence | GRID_MINTED)
    }

    /// Whether this id belongs to a request issued by the grid itself.
    #[inline]
    pub fn is_grid_minted(self) -> bool {
        self.0 & GRID_MINTED != 0
    }

    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_grid_minted() {
            write!(f, "grid#{}", self.0 & !GRID_MINTED)
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Addressed payload shared by all routed message kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    /// Actor address; hashed to find the owning node.
    pub address: String,

    /// Set when the caller awaits an answer.
    pub answer_to: Option<CorrelationId>,

    /// Description for logs and diagnostics only.
    pub representation: String,

    /// Opaque invocation payload.
    pub body: Vec<u8>,
}

impl Delivery {
    pub fn new(
        address: impl Into<String>,
        representation: impl Into<String>,
        body: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            address: address.into(),
            answer_to: None,
            representation: representation.into(),
            body: body.into(),
        }
    }

    pub fn answering_to(mut self, correlation: CorrelationId) -> Self {
        self.answer_to = Some(correlation);
        self
    }

    pub fn expects_answer(&self) -> bool {
        self.answer_to.is_some()
    }
}

/// Moves an actor, together with the messages it had not yet processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relocation {
    pub delivery: Delivery,

    /// Pending messages, each encoded with the sending node's codec.
    pub pending: Vec<Vec<u8>>,
}

/// One routing hop.
///
/// `original_sender` is the node that first sent `inner`; receivers act on
/// its behalf rather than on behalf of the forwarding node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    pub original_sender: NodeId,
    pub inner: Box<GridMessage>,
}

impl Forward {
    pub fn new(original_sender: NodeId, inner: GridMessage) -> Self {
        Self {
            original_sender,
            inner: Box::new(inner),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnswerOutcome {
    Value(Vec<u8>),
    Failure(String),
    /// No answer arrived in time.
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub correlation: CorrelationId,
    pub outcome: AnswerOutcome,
}

impl Answer {
    pub fn new(correlation: CorrelationId, outcome: AnswerOutcome) -> Self {
        Self {
            correlation,
            outcome,
        }
    }
}

/// Closed set of messages the grid routes.
///
/// Serialized externally tagged: the variant name is the tag, so a decoder
/// reconstructs exactly the variant that was encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridMessage {
    Answer(Answer),
    GridDeliver(Delivery),
    ActorDeliver(Delivery),
    Start(Delivery),
    Relocate(Relocation),
    Forward(Forward),
}

impl GridMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            GridMessage::Answer(_) => "Answer",
            GridMessage::GridDeliver(_) => "GridDeliver",
            GridMessage::ActorDeliver(_) => "ActorDeliver",
            GridMessage::Start(_) => "Start",
            GridMessage::Relocate(_) => "Relocate",
            GridMessage::Forward(_) => "Forward",
        }
    }

    /// The routed payload, looking through any number of forwards.
    ///
    /// `None` for answers, which are never routed by address.
    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            GridMessage::Answer(_) => None,
            GridMessage::GridDeliver(delivery)
            | GridMessage::ActorDeliver(delivery)
            | GridMessage::Start(delivery) => Some(delivery),
            GridMessage::Relocate(relocation) => Some(&relocation.delivery),
            GridMessage::Forward(forward) => forward.inner.delivery(),
        }
    }

    pub fn delivery_mut(&mut self) -> Option<&mut Delivery> {
        match self {
            GridMessage::Answer(_) => None,
            GridMessage::GridDeliver(delivery)
            | GridMessage::ActorDeliver(delivery)
            | GridMessage::Start(delivery) => Some(delivery),
            GridMessage::Relocate(relocation) => Some(&mut relocation.delivery),
            GridMessage::Forward(forward) => forward.inner.delivery_mut(),
        }
    }

    pub fn address(&self) -> Option<&str> {
        self.delivery().map(|delivery| delivery.address.as_str())
    }

    pub fn representation(&self) -> &str {
        self.delivery()
            .map_or("answer", |delivery| delivery.representation.as_str())
    }

    /// Number of `Forward` wrappers around the innermost message.
    pub fn hops(&self) -> usize {
        let mut hops = 0;
        let mut current = self;
        while let GridMessage::Forward(forward) = current {
            hops += 1;
            current = &forward.inner;
        }
        hops
    }
}

impl fmt::Display for GridMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Some(address) => write!(f, "{}({} -> {})", self.kind(), self.representation(), address),
            None => write!(f, "{}", self.kind()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deliver(address: &str) -> GridMessage {
        GridMessage::GridDeliver(Delivery::new(address, "Order.place()", b"payload".to_vec()))
    }

    #[test]
    fn test_delivery_looks_through_forwards() {
        let wrapped = GridMessage::Forward(Forward::new(
            NodeId::from("a"),
            GridMessage::Forward(Forward::new(NodeId::from("b"), deliver("order-42"))),
        ));

        assert_eq!(wrapped.address(), Some("order-42"));
        assert_eq!(wrapped.representation(), "Order.place()");
        assert_eq!(wrapped.hops(), 2);
        assert_eq!(wrapped.kind(), "Forward");
    }

    #[test]
    fn test_answers_have_no_address() {
        let answer = GridMessage::Answer(Answer::new(CorrelationId::new(1), AnswerOutcome::Timeout));
        assert_eq!(answer.address(), None);
        assert_eq!(answer.hops(), 0);
        assert_eq!(answer.to_string(), "Answer");
    }

    #[test]
    fn test_answering_to_marks_request() {
        let delivery = Delivery::new("order-1", "Order.total()", Vec::new());
        assert!(!delivery.expects_answer());

        let delivery = delivery.answering_to(CorrelationId::new(9));
        assert!(delivery.expects_answer());
        assert_eq!(delivery.answer_to, Some(CorrelationId::new(9)));
    }

    #[test]
    fn test_delivery_mut_reaches_inner_message() {
        let mut message = GridMessage::Forward(Forward::new(NodeId::from("a"), deliver("x")));
        if let Some(delivery) = message.delivery_mut() {
            delivery.answer_to = Some(CorrelationId::new(3));
        }
        assert_eq!(
            message.delivery().and_then(|delivery| delivery.answer_to),
            Some(CorrelationId::new(3))
        );
    }

    #[test]
    fn test_framework_ids_never_look_grid_minted() {
        let chosen = CorrelationId::new(u64::MAX);
        assert!(!chosen.is_grid_minted());
        assert_eq!(chosen.value(), u64::MAX >> 1);

        let minted = CorrelationId::minted(1);
        assert!(minted.is_grid_minted());
        assert_ne!(minted, CorrelationId::new(1));
        assert_eq!(minted.to_string(), "grid#1");
        assert_eq!(CorrelationId::new(1).to_string(), "#1");
    }

    #[test]
    fn test_display() {
        assert_eq!(deliver("order-42").to_string(), "GridDeliver(Order.place() -> order-42)");
    }
}
