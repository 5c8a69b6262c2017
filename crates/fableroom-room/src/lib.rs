//! Rooms for Fableroom.
//!
//! A room is a single collaborative story. Participants start the game from
//! the lobby, then vote on one of three options after each narration; the
//! winning option is narrated next. Each room runs as an isolated Tokio task
//! (actor model) that owns its [`RoomState`] and is the only writer of it.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — spawns rooms on first access, loading persisted state
//! - [`RoomHandle`] — send commands to a running room actor
//! - [`RoomState`] — the per-room aggregate
//! - [`transition`] — the pure state machine the actor drives
//! - [`RoomStore`] — where rooms are saved after every change
//! - [`RoomConfig`] — voting window, narration timeout, prompts

#![allow(async_fn_in_trait)]

mod config;
mod directives;
mod error;
mod manager;
mod options;
mod prompt;
mod resolve;
mod room;
mod state;
mod store;
mod timer;
mod transition;

pub use config::{RoomConfig, DEFAULT_FALLBACK_NARRATION, DEFAULT_SYSTEM_PROMPT};
pub use directives::{Directive, Outcome};
pub use error::{RoomError, StoreError};
pub use manager::{load_room, RoomRegistry};
pub use options::extract_label;
pub use resolve::{pick_winner, Resolution};
pub use room::{ParticipantSender, RoomHandle};
pub use state::{Advance, RoomState};
pub use store::{JsonFileStore, MemoryStore, RoomStore};
pub use timer::DeadlineTimer;
pub use transition::{transition, Effect, RoomEvent, TransitionContext};
