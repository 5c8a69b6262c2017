//! Room registry: maps room codes to running room actors.

use std::collections::HashMap;
use std::sync::Arc;

use fableroom_narrator::Narrator;
use fableroom_protocol::RoomCode;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle, RoomState, RoomStore};

/// Creates rooms on first access and hands out their handles.
///
/// Rooms share nothing but the narrator, the store and the config; the
/// registry itself never touches room state.
pub struct RoomRegistry<N: Narrator, S: RoomStore> {
    rooms: HashMap<RoomCode, RoomHandle>,
    narrator: Arc<N>,
    store: Arc<S>,
    config: Arc<RoomConfig>,
}

impl<N: Narrator, S: RoomStore> RoomRegistry<N, S> {
    pub fn new(narrator: Arc<N>, store: Arc<S>, config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            narrator,
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Returns the handle for `code`, spawning the room if it is not running.
    ///
    /// Holds `&mut self` across the store load; callers sharing the
    /// registry behind a lock should use [`get`](Self::get),
    /// [`load_room`] and [`spawn_loaded`](Self::spawn_loaded) instead.
    pub async fn get_or_spawn(&mut self, code: &RoomCode) -> RoomHandle {
        if let Some(handle) = self.get(code) {
            return handle;
        }
        let state = load_room(&*self.store, code, self.config.starting_health).await;
        self.spawn_loaded(code, state)
    }

    pub fn store(&self) -> Arc<S> {
        Arc::clone(&self.store)
    }

    /// Spawns `code` over an already loaded `state`.
    ///
    /// If the room was started in the meantime the running handle is
    /// returned and `state` is discarded.
    pub fn spawn_loaded(&mut self, code: &RoomCode, state: RoomState) -> RoomHandle {
        if let Some(handle) = self.rooms.get(code) {
            if !handle.is_closed() {
                return handle.clone();
            }
            tracing::debug!(room = %code, "replacing stopped room");
        }

        let handle = spawn_room(
            code.clone(),
            state,
            Arc::clone(&self.config),
            Arc::clone(&self.narrator),
            Arc::clone(&self.store),
        );
        self.rooms.insert(code.clone(), handle.clone());
        tracing::info!(room = %code, rooms = self.rooms.len(), "room spawned");
        handle
    }

    /// The handle for a running room, if any.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms
            .get(code)
            .filter(|handle| !handle.is_closed())
            .cloned()
    }

    /// Stops a room and forgets it. Its persisted state is kept.
    pub async fn destroy(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        tracing::info!(room = %code, "room destroyed");
        Ok(())
    }

    /// Stops every room.
    pub async fn shutdown_all(&mut self) {
        for (_, handle) in self.rooms.drain() {
            let _ = handle.shutdown().await;
        }
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// The persisted state of `code`, or a fresh lobby when there is none.
///
/// A state that fails to load is logged and replaced by a fresh lobby.
pub async fn load_room<S: RoomStore>(store: &S, code: &RoomCode, starting_health: i32) -> RoomState {
    match store.load(code).await {
        Ok(Some(state)) => {
            tracing::info!(room = %code, round = state.round(), "room loaded from store");
            state
        }
        Ok(None) => RoomState::new(starting_health),
        Err(err) => {
            tracing::warn!(room = %code, error = %err, "failed to load room, starting fresh");
            RoomState::new(starting_health)
        }
    }
}
