//! Narrator and store choices made at startup.
//!
//! The server is generic over its narrator and store; the binary picks
//! them from the environment, so these enums forward to whichever was
//! configured.

use fableroom_narrator::{NarrationError, Narrator, OpenAiNarrator, PromptTurn, ScriptedNarrator};
use fableroom_protocol::RoomCode;
use fableroom_room::{JsonFileStore, MemoryStore, RoomState, RoomStore, StoreError};

/// Either a real model endpoint or the offline script.
pub enum AnyNarrator {
    OpenAi(OpenAiNarrator),
    Scripted(ScriptedNarrator),
}

impl AnyNarrator {
    pub fn describe(&self) -> String {
        match self {
            Self::OpenAi(n) => format!("openai ({} at {})", n.model(), n.base_url()),
            Self::Scripted(_) => "scripted".to_string(),
        }
    }
}

impl Narrator for AnyNarrator {
    async fn narrate(&self, prompt: &[PromptTurn]) -> Result<String, NarrationError> {
        match self {
            Self::OpenAi(n) => n.narrate(prompt).await,
            Self::Scripted(n) => n.narrate(prompt).await,
        }
    }
}

/// Either the process-local store or a directory of JSON files.
#[derive(Debug)]
pub enum AnyStore {
    Memory(MemoryStore),
    File(JsonFileStore),
}

impl AnyStore {
    pub fn describe(&self) -> String {
        match self {
            Self::Memory(_) => "memory".to_string(),
            Self::File(store) => format!("json files in {}", store.dir().display()),
        }
    }
}

impl RoomStore for AnyStore {
    async fn load(&self, code: &RoomCode) -> Result<Option<RoomState>, StoreError> {
        match self {
            Self::Memory(store) => store.load(code).await,
            Self::File(store) => store.load(code).await,
        }
    }

    async fn save(&self, code: &RoomCode, state: &RoomState) -> Result<(), StoreError> {
        match self {
            Self::Memory(store) => store.save(code, state).await,
            Self::File(store) => store.save(code, state).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_variant_forwards() {
        let narrator = AnyNarrator::Scripted(ScriptedNarrator::new(["Once.\n1. [A]\n2. [B]\n3. [C]"]));
        let text = narrator.narrate(&[PromptTurn::user("go")]).await.unwrap();
        assert!(text.starts_with("Once."));
        assert_eq!(narrator.describe(), "scripted");
    }

    #[tokio::test]
    async fn test_memory_variant_forwards() {
        let store = AnyStore::Memory(MemoryStore::new());
        let code = RoomCode::new("vault");
        assert!(store.load(&code).await.unwrap().is_none());
        store.save(&code, &RoomState::default()).await.unwrap();
        assert!(store.load(&code).await.unwrap().is_some());
    }
}
