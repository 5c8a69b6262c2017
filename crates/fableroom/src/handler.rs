//! Per-connection handler: room routing and message forwarding.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Pick the room from the request path and join it
//!   2. Forward the room's snapshots to the socket from a writer task
//!   3. Loop: receive frames → hand them to the room

use std::sync::Arc;

use fableroom_narrator::Narrator;
use fableroom_protocol::{Codec, ParticipantId, RoomCode};
use fableroom_room::{load_room, RoomHandle, RoomStore};
use fableroom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::server::ServerState;
use crate::FableroomError;

/// Drop guard that tells the room a participant left when the handler
/// exits, even if the handler panics. `Drop` is synchronous, so the leave
/// is sent from a fire-and-forget task.
struct ParticipantGuard {
    participant: ParticipantId,
    room: RoomHandle,
}

impl Drop for ParticipantGuard {
    fn drop(&mut self) {
        let participant = self.participant;
        let room = self.room.clone();
        tokio::spawn(async move {
            let _ = room.leave(participant).await;
        });
    }
}

/// The room a request path points at: its last non-empty segment.
///
/// `/rooms/dragon` and `/dragon/` both name `dragon`; `/` names the
/// default room.
pub(crate) fn room_code_for_path(path: &str) -> RoomCode {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    RoomCode::new(path.rsplit('/').find(|s| !s.is_empty()).unwrap_or_default())
}

/// The running room for `code`, spawning it if needed.
///
/// The registry lock is released while the store is read, so a slow load
/// only delays connections to the room being loaded.
async fn open_room<N, S>(state: &ServerState<N, S>, code: &RoomCode) -> RoomHandle
where
    N: Narrator,
    S: RoomStore,
{
    let (store, starting_health) = {
        let rooms = state.rooms.lock().await;
        if let Some(room) = rooms.get(code) {
            return room;
        }
        (rooms.store(), rooms.config().starting_health)
    };

    let saved = load_room(&*store, code, starting_health).await;
    state.rooms.lock().await.spawn_loaded(code, saved)
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<N, S>(
    conn: WebSocketConnection,
    state: Arc<ServerState<N, S>>,
) -> Result<(), FableroomError>
where
    N: Narrator,
    S: RoomStore,
{
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    let participant = ParticipantId(conn_id.into_inner());
    let code = room_code_for_path(conn.path());
    tracing::debug!(%conn_id, path = conn.path(), room = %code, "handling new connection");

    let room = open_room(&state, &code).await;

    let (tx, mut rx) = mpsc::unbounded_channel();
    room.join(participant, tx).await?;
    let _guard = ParticipantGuard {
        participant,
        room: room.clone(),
    };

    let writer = {
        let conn = Arc::clone(&conn);
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(message) = rx.recv().await {
                let bytes = match codec.encode(&message) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::warn!(%participant, error = %e, "failed to encode snapshot");
                        continue;
                    }
                };
                if let Err(e) = conn.send(&bytes).await {
                    tracing::debug!(%participant, error = %e, "send failed");
                    break;
                }
            }
        })
    };

    loop {
        match conn.recv().await {
            Ok(Some(data)) => room.client_payload(participant, &data).await?,
            Ok(None) => {
                tracing::info!(%participant, room = %code, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%participant, error = %e, "recv error");
                break;
            }
        }
    }

    writer.abort();
    // _guard drops here → the room counts one fewer participant.
    Ok(())
}
