//! Codec trait and the JSON implementation.
//!
//! Rooms and connection handlers only need something that implements
//! [`Codec`]; the concrete format is swappable without touching either.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to bytes and decodes bytes back into values.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// connection task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be represented.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or do not
    /// match the expected shape.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ```rust
/// use fableroom_protocol::{ClientEvent, Codec, JsonCodec, OptionId};
///
/// let codec = JsonCodec;
/// let event: ClientEvent = codec.decode(br#"{"type":"VOTE","choice":"2"}"#).unwrap();
/// assert_eq!(event, ClientEvent::Vote { choice: OptionId::Two });
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::{ClientEvent, OptionId};

    #[test]
    fn test_decode_start_game() {
        let event: ClientEvent =
            JsonCodec.decode(br#"{"type":"START_GAME"}"#).unwrap();
        assert_eq!(event, ClientEvent::StartGame);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let result: Result<ClientEvent, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_unknown_type_is_decode_error() {
        let result: Result<ClientEvent, _> =
            JsonCodec.decode(br#"{"type":"CHEAT","choice":"1"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_encode_vote() {
        let bytes = JsonCodec
            .encode(&ClientEvent::Vote {
                choice: OptionId::Three,
            })
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["type"], "VOTE");
        assert_eq!(value["choice"], "3");
    }
}
