//! Encode/decode boundary for grid messages.
//!
//! Both codecs are externally tagged through serde, so a payload always
//! decodes to the exact variant it was encoded from. Malformed or
//! unrecognized payloads fail with [`CodecError::Decode`].

use crate::error::{CodecError, GridError};
use crate::protocol::GridMessage;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

pub trait MessageCodec: Send + Sync + fmt::Debug + 'static {
    /// # Errors
    ///
    /// Returns `CodecError::Encode` if serialization fails.
    fn encode(&self, message: &GridMessage) -> Result<Bytes, CodecError>;

    /// # Errors
    ///
    /// Returns `CodecError::Decode` on malformed or unrecognized payloads.
    fn decode(&self, payload: &[u8]) -> Result<GridMessage, CodecError>;

    fn name(&self) -> &'static str;
}

/// Human-readable JSON, e.g. `{"GridDeliver":{"address":"order-42",...}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode(&self, message: &GridMessage) -> Result<Bytes, CodecError> {
        serde_json::to_vec(message)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode(Box::new(e)))
    }

    fn decode(&self, payload: &[u8]) -> Result<GridMessage, CodecError> {
        serde_json::from_slice(payload).map_err(|e| CodecError::Decode(Box::new(e)))
    }

    fn name(&self) -> &'static str {
        "json"
    }
}

/// Compact binary encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl MessageCodec for BincodeCodec {
    fn encode(&self, message: &GridMessage) -> Result<Bytes, CodecError> {
        bincode::serialize(message)
            .map(Bytes::from)
            .map_err(|e| CodecError::Encode(e))
    }

    fn decode(&self, payload: &[u8]) -> Result<GridMessage, CodecError> {
        bincode::deserialize(payload).map_err(|e| CodecError::Decode(e))
    }

    fn name(&self) -> &'static str {
        "bincode"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    #[default]
    Json,
    Bincode,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn MessageCodec> {
        match self {
            CodecKind::Json => Arc::new(JsonCodec),
            CodecKind::Bincode => Arc::new(BincodeCodec),
        }
    }
}

impl FromStr for CodecKind {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(CodecKind::Json),
            "bincode" => Ok(CodecKind::Bincode),
            other => Err(GridError::InvalidArgument(format!("unknown codec: {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Answer, AnswerOutcome, CorrelationId, Delivery, Forward, Relocation};
    use corelib::NodeId;

    fn sample() -> GridMessage {
        let pending = JsonCodec
            .encode(&GridMessage::ActorDeliver(Delivery::new("cart-7", "Cart.add()", vec![1])))
            .expect("encode should succeed");
        GridMessage::Forward(Forward::new(
            NodeId::from("node-a"),
            GridMessage::Relocate(Relocation {
                delivery: Delivery::new("cart-7", "Cart.relocate()", vec![0, 255])
                    .answering_to(CorrelationId::new(11)),
                pending: vec![pending.to_vec()],
            }),
        ))
    }

    #[test]
    fn test_codecs_preserve_variant() {
        for codec in [CodecKind::Json.build(), CodecKind::Bincode.build()] {
            let message = sample();
            let bytes = codec.encode(&message).expect("encode should succeed");
            let decoded = codec.decode(&bytes).expect("decode should succeed");
            assert_eq!(decoded, message, "{}", codec.name());
        }
    }

    #[test]
    fn test_json_is_tagged_by_variant_name() {
        let answer = GridMessage::Answer(Answer::new(
            CorrelationId::new(5),
            AnswerOutcome::Failure("boom".to_string()),
        ));
        let bytes = JsonCodec.encode(&answer).expect("encode should succeed");
        assert_eq!(
            &bytes[..],
            br#"{"Answer":{"correlation":5,"outcome":{"Failure":"boom"}}}"#
        );
    }

    #[test]
    fn test_malformed_payload_is_decode_error() {
        for codec in [CodecKind::Json.build(), CodecKind::Bincode.build()] {
            let result = codec.decode(b"\xff\x00 definitely not a message");
            assert!(matches!(result, Err(CodecError::Decode(_))), "{}", codec.name());
        }
        assert!(matches!(
            JsonCodec.decode(br#"{"Teleport":{}}"#),
            Err(CodecError::Decode(_))
        ));
    }

    #[test]
    fn test_codec_kind_parse() {
        assert_eq!("JSON".parse::<CodecKind>().unwrap(), CodecKind::Json);
        assert_eq!("bincode".parse::<CodecKind>().unwrap(), CodecKind::Bincode);
        assert!("protobuf".parse::<CodecKind>().is_err());
    }
}
