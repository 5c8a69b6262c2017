//! Unified error type for the Fableroom server.

use fableroom_protocol::ProtocolError;
use fableroom_room::{RoomError, StoreError};
use fableroom_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates the `From` impls, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum FableroomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room actor is gone.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The room store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The environment holds an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
