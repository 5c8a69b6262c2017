//! Wire protocol for Fableroom.
//!
//! This crate defines what clients and rooms say to each other:
//!
//! - **Types** ([`ClientEvent`], [`ServerMessage`], [`RoomSnapshot`], ids,
//!   [`Phase`], [`Turn`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   turned into bytes and back.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while doing so.
//!
//! The protocol layer knows nothing about connections or rooms. A room
//! builds a [`RoomSnapshot`] after every mutation; clients are stateless and
//! re-render from each one.
//!
//! ```text
//! Transport (bytes) → Protocol (ClientEvent) → Room (state machine)
//! Room (RoomSnapshot) → Protocol (ServerMessage) → Transport (bytes)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ClientEvent, OptionId, ParticipantId, PartyStats, Phase, RoomCode,
    RoomSnapshot, ServerMessage, Speaker, Turn, VoteTally,
};
