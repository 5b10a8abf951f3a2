//! Routing core of the actor grid.
//!
//! This crate turns the hash ring into message routing between nodes:
//! - Grid messages and their wire codecs
//! - Node health tracking and answer correlation
//! - The inbound message handler (decode, resolve owner, deliver or forward)
//! - The outbound actor control (encode, transmit or buffer per node)
//! - [`Grid`], which wires both halves to one ring and one health map

pub mod codec;
pub mod config;
pub mod control;
pub mod correlation;
pub mod error;
pub mod health;
pub mod loopback;
pub mod node;
pub mod protocol;
pub mod receiver;
pub mod sender;

pub use codec::{BincodeCodec, CodecKind, JsonCodec, MessageCodec};
pub use config::GridConfig;
pub use control::{Inbound, Outbound, Transport};
pub use correlation::PendingAnswers;
pub use error::{CodecError, GridError, Result};
pub use health::NodeHealth;
pub use loopback::{Hop, LoopbackNetwork, LoopbackTransport};
pub use node::Grid;
pub use protocol::{Answer, AnswerOutcome, CorrelationId, Delivery, Forward, GridMessage, Relocation};
pub use receiver::GridApplicationMessageHandler;
pub use sender::OutboundGridActorControl;
