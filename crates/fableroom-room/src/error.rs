//! Error types for the room layer.

use fableroom_protocol::RoomCode;

/// Errors returned by [`RoomHandle`](crate::RoomHandle) and
/// [`RoomRegistry`](crate::RoomRegistry).
///
/// Game-level rejections (voting twice, starting a started game) are not
/// errors; rooms drop those silently.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The registry has no room with this code.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The room's actor has stopped or its command channel is closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}

/// Errors from a [`RoomStore`](crate::RoomStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("store io failed: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted room could not be (de)serialized.
    #[error("store serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
