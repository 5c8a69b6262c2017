//! Where room state lives between actor lifetimes.
//!
//! The room actor saves after every mutation and loads once when it is
//! spawned. Both stores keep the same JSON form of [`RoomState`], so the
//! advance lock never survives a reload.

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use fableroom_protocol::RoomCode;
use tokio::sync::Mutex;

use crate::{RoomState, StoreError};

/// Persistence for room state, keyed by room code.
pub trait RoomStore: Send + Sync + 'static {
    /// Returns the last saved state, or `None` for a room never saved.
    fn load(
        &self,
        code: &RoomCode,
    ) -> impl Future<Output = Result<Option<RoomState>, StoreError>> + Send;

    /// Replaces the saved state of `code`.
    fn save(
        &self,
        code: &RoomCode,
        state: &RoomState,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Keeps rooms in process memory. Rooms survive actor restarts but not the
/// process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rooms: Mutex<HashMap<RoomCode, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for MemoryStore {
    async fn load(&self, code: &RoomCode) -> Result<Option<RoomState>, StoreError> {
        let rooms = self.rooms.lock().await;
        match rooms.get(code) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, code: &RoomCode, state: &RoomState) -> Result<(), StoreError> {
        let json = serde_json::to_string(state)?;
        self.rooms.lock().await.insert(code.clone(), json);
        Ok(())
    }
}

/// One pretty-printed JSON file per room under a directory.
///
/// Writes go to a temporary file that is renamed over the old one, so a
/// crash mid-save leaves the previous state readable.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Uses `dir`, creating it if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, code: &RoomCode) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(code)))
    }
}

/// Room codes are client-chosen; anything outside `[a-z0-9_-]` is escaped
/// as `%XX` so a code can never leave the store directory.
fn file_stem(code: &RoomCode) -> String {
    let mut stem = String::with_capacity(code.as_str().len());
    for byte in code.as_str().bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' => stem.push(byte as char),
            other => stem.push_str(&format!("%{other:02X}")),
        }
    }
    stem
}

impl RoomStore for JsonFileStore {
    async fn load(&self, code: &RoomCode) -> Result<Option<RoomState>, StoreError> {
        match tokio::fs::read(self.path_for(code)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, code: &RoomCode, state: &RoomState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let path = self.path_for(code);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
