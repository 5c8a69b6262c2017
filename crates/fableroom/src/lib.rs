//! # Fableroom
//!
//! Collaborative storytelling rooms. Everyone connected to a room votes on
//! one of three options after each story segment; the winning option is sent
//! to a language model, which narrates the next segment.
//!
//! The crate ties the layers together: transport → protocol → room.
//! Connections pick their room by URL path (`ws://host/rooms/<code>`).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fableroom::prelude::*;
//!
//! # async fn run() -> Result<(), FableroomError> {
//! let mut server = FableroomServer::builder()
//!     .bind("0.0.0.0:8080")
//!     .build(ScriptedNarrator::default(), MemoryStore::new())
//!     .await?;
//! server.run().await
//! # }
//! ```

mod backend;
mod config;
mod error;
mod handler;
mod server;

pub use backend::{AnyNarrator, AnyStore};
pub use config::{ConfigError, ServerConfig};
pub use error::FableroomError;
pub use server::{FableroomServer, ServerBuilder};

pub mod prelude {
    pub use crate::{
        AnyNarrator, AnyStore, ConfigError, FableroomError, FableroomServer, ServerBuilder,
        ServerConfig,
    };
    pub use fableroom_narrator::{NarrationError, Narrator, OpenAiNarrator, ScriptedNarrator};
    pub use fableroom_protocol::{
        ClientEvent, OptionId, ParticipantId, Phase, RoomCode, RoomSnapshot, ServerMessage,
    };
    pub use fableroom_room::{JsonFileStore, MemoryStore, RoomConfig, RoomStore};
}
