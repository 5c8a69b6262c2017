//! A narrator that replays canned segments.
//!
//! Used when no language-model key is configured, and by tests that need a
//! predictable story.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{NarrationError, Narrator, PromptTurn};

const BUILTIN_SCRIPT: [&str; 3] = [
    "The tavern door creaks open onto a rain-soaked road. A hooded stranger \
     presses a tarnished map into your hands and vanishes into the crowd.\n\
     1. [Follow the stranger]\n\
     2. [Study the map by the fire]\n\
     3. [Ask the barkeep about the map]",
    "The path bends toward an old watchtower, its lantern still burning. \
     Something heavy shifts in the brush beside you. [HP:-5]\n\
     1. [Climb the watchtower]\n\
     2. [Draw steel and face the brush]\n\
     3. [Slip past quietly]",
    "Inside, a cracked chest holds a coil of rope and a note in a \
     familiar hand. [ITEM:+Rope]\n\
     1. [Read the note aloud]\n\
     2. [Pocket the note and move on]\n\
     3. [Search the tower for its author]",
];

/// Returns segments from a fixed script in order, wrapping around.
#[derive(Debug)]
pub struct ScriptedNarrator {
    segments: Vec<String>,
    next: AtomicUsize,
}

impl ScriptedNarrator {
    /// A narrator over the given segments.
    ///
    /// An empty script makes every call fail with
    /// [`NarrationError::EmptyResponse`].
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
            next: AtomicUsize::new(0),
        }
    }

    /// How many calls have been answered so far.
    pub fn calls(&self) -> usize {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for ScriptedNarrator {
    fn default() -> Self {
        Self::new(BUILTIN_SCRIPT)
    }
}

impl Narrator for ScriptedNarrator {
    async fn narrate(
        &self,
        _prompt: &[PromptTurn],
    ) -> Result<String, NarrationError> {
        if self.segments.is_empty() {
            return Err(NarrationError::EmptyResponse);
        }
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        Ok(self.segments[index % self.segments.len()].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_narrator_cycles() {
        let narrator = ScriptedNarrator::new(["a", "b"]);
        assert_eq!(narrator.narrate(&[]).await.unwrap(), "a");
        assert_eq!(narrator.narrate(&[]).await.unwrap(), "b");
        assert_eq!(narrator.narrate(&[]).await.unwrap(), "a");
        assert_eq!(narrator.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let narrator = ScriptedNarrator::new(Vec::<String>::new());
        assert!(narrator.narrate(&[]).await.is_err());
    }

    #[tokio::test]
    async fn test_builtin_script_offers_three_options() {
        let narrator = ScriptedNarrator::default();
        for _ in 0..BUILTIN_SCRIPT.len() {
            let text = narrator.narrate(&[]).await.unwrap();
            for n in 1..=3 {
                assert!(text.contains(&format!("\n{n}. [")), "missing option {n}");
            }
        }
    }
}
