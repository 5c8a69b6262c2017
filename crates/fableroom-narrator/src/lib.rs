//! Narration generator for Fableroom.
//!
//! A room hands the generator an ordered list of role-tagged turns (system
//! instructions, story so far, and one directive for the chosen action) and
//! gets back a narration that should end with three numbered options.
//!
//! # Key types
//!
//! - [`Narrator`] — the contract rooms are written against
//! - [`OpenAiNarrator`] — any OpenAI-compatible chat-completions endpoint
//! - [`ScriptedNarrator`] — canned narrations for offline play and tests
//! - [`PromptTurn`] / [`Role`] — the generator's input
//!
//! Failures are reported as [`NarrationError`]; rooms never surface them to
//! participants and fall back to scripted content instead.

mod error;
mod openai;
mod prompt;
mod scripted;

pub use error::NarrationError;
pub use openai::{OpenAiNarrator, DEFAULT_BASE_URL, DEFAULT_MODEL};
pub use prompt::{PromptTurn, Role};
pub use scripted::ScriptedNarrator;

use std::future::Future;

/// Produces the next story segment.
///
/// Rooms call this from a spawned task, so the returned future must be
/// `Send` and the narrator itself shared behind an `Arc`.
///
/// # Example
///
/// ```rust
/// use fableroom_narrator::{Narrator, NarrationError, PromptTurn};
///
/// struct Echo;
///
/// impl Narrator for Echo {
///     async fn narrate(&self, prompt: &[PromptTurn]) -> Result<String, NarrationError> {
///         let last = prompt.last().map(|t| t.content.clone()).unwrap_or_default();
///         Ok(format!("You said: {last}\n1. [Again]\n2. [Louder]\n3. [Stop]"))
///     }
/// }
/// ```
pub trait Narrator: Send + Sync + 'static {
    /// Generates narration for the given conversation.
    ///
    /// # Errors
    /// Any [`NarrationError`]; callers treat every variant the same way.
    fn narrate(
        &self,
        prompt: &[PromptTurn],
    ) -> impl Future<Output = Result<String, NarrationError>> + Send;
}
