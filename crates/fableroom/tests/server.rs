//! Integration tests for the Fableroom server over real WebSocket connections.

use std::sync::Arc;
use std::time::Duration;

use fableroom::prelude::*;
use fableroom_room::{RoomState, StoreError};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::Notify;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Holds loads of the `vault` room until the gate opens.
struct GatedStore {
    inner: MemoryStore,
    gate: Arc<Notify>,
}

impl RoomStore for GatedStore {
    async fn load(&self, code: &RoomCode) -> Result<Option<RoomState>, StoreError> {
        if code.as_str() == "vault" {
            self.gate.notified().await;
        }
        self.inner.load(code).await
    }

    async fn save(&self, code: &RoomCode, state: &RoomState) -> Result<(), StoreError> {
        self.inner.save(code, state).await
    }
}

/// Starts a server on a random port and returns the address.
async fn start_server(config: RoomConfig) -> String {
    start_server_with(config, MemoryStore::new()).await
}

async fn start_server_with<S: RoomStore>(config: RoomConfig, store: S) -> String {
    let mut server = FableroomServer::builder()
        .bind("127.0.0.1:0")
        .room_config(config)
        .build(ScriptedNarrator::default(), store)
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    addr
}

async fn connect(addr: &str, path: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("should connect");
    ws
}

async fn send(ws: &mut ClientWs, json: &'static str) {
    ws.send(Message::text(json)).await.expect("send");
}

async fn next_snapshot(ws: &mut ClientWs) -> RoomSnapshot {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a snapshot")
            .expect("stream ended")
            .expect("recv");
        if !(msg.is_text() || msg.is_binary()) {
            continue;
        }
        let message: ServerMessage =
            serde_json::from_slice(&msg.into_data()).expect("decode STATE");
        let ServerMessage::State { state } = message;
        return state;
    }
}

async fn wait_for(ws: &mut ClientWs, pred: impl Fn(&RoomSnapshot) -> bool) -> RoomSnapshot {
    loop {
        let snapshot = next_snapshot(ws).await;
        if pred(&snapshot) {
            return snapshot;
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_join_receives_lobby_state() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr, "/rooms/tavern").await;

    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.phase, Phase::Lobby);
    assert_eq!(snapshot.connected_participants, 1);
    assert_eq!(snapshot.round_number, 0);
    assert!(snapshot.narration_history.is_empty());
}

#[tokio::test]
async fn test_wire_format_is_camel_case_state() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr, "/rooms/wire").await;

    let msg = ws.next().await.unwrap().expect("recv");
    let value: serde_json::Value = serde_json::from_slice(&msg.into_data()).unwrap();
    assert_eq!(value["type"], "STATE");
    assert_eq!(value["state"]["phase"], "LOBBY");
    assert_eq!(value["state"]["connectedParticipants"], 1);
    assert_eq!(value["state"]["voteTally"]["1"], 0);
    assert!(value["state"]["votingDeadline"].is_null());
}

#[tokio::test]
async fn test_full_game_round_over_websocket() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr, "/rooms/tavern").await;
    next_snapshot(&mut ws).await;

    send(&mut ws, r#"{"type":"START_GAME"}"#).await;
    let voting = wait_for(&mut ws, |s| s.phase == Phase::Voting).await;
    assert_eq!(voting.round_number, 1);
    assert!(voting.voting_deadline.is_some());

    // A lone participant is full turnout.
    send(&mut ws, r#"{"type":"VOTE","choice":"1"}"#).await;
    let next = wait_for(&mut ws, |s| s.phase == Phase::Voting && s.round_number == 2).await;
    assert!(
        next.narration_history
            .iter()
            .any(|t| t.text == "The party chose: Follow the stranger")
    );
}

#[tokio::test]
async fn test_rooms_are_isolated_by_path() {
    let addr = start_server(RoomConfig::default()).await;
    let mut a = connect(&addr, "/rooms/north").await;
    next_snapshot(&mut a).await;
    let mut b = connect(&addr, "/rooms/North/").await;
    let mut c = connect(&addr, "/rooms/south").await;

    let seen_by_a = wait_for(&mut a, |s| s.connected_participants == 2).await;
    assert_eq!(seen_by_a.phase, Phase::Lobby);
    assert_eq!(next_snapshot(&mut b).await.connected_participants, 2);
    assert_eq!(next_snapshot(&mut c).await.connected_participants, 1);
}

#[tokio::test]
async fn test_disconnect_decrements_count() {
    let addr = start_server(RoomConfig::default()).await;
    let mut a = connect(&addr, "/rooms/hall").await;
    next_snapshot(&mut a).await;
    let mut b = connect(&addr, "/rooms/hall").await;
    wait_for(&mut a, |s| s.connected_participants == 2).await;

    b.close(None).await.expect("close");
    let snapshot = wait_for(&mut a, |s| s.connected_participants == 1).await;
    assert_eq!(snapshot.phase, Phase::Lobby);
}

#[tokio::test]
async fn test_garbage_frames_are_ignored() {
    let addr = start_server(RoomConfig::default()).await;
    let mut ws = connect(&addr, "/rooms/tavern").await;
    next_snapshot(&mut ws).await;

    send(&mut ws, "definitely not json").await;
    send(&mut ws, r#"{"type":"VOTE","choice":"4"}"#).await;
    send(&mut ws, r#"{"type":"START_GAME"}"#).await;

    let narrating = next_snapshot(&mut ws).await;
    assert_eq!(narrating.phase, Phase::Narrating);
}

#[tokio::test]
async fn test_deadline_closes_voting_with_partial_turnout() {
    let config = RoomConfig {
        voting_window: Duration::from_secs(1),
        ..RoomConfig::default()
    };
    let addr = start_server(config).await;
    let mut a = connect(&addr, "/rooms/clock").await;
    next_snapshot(&mut a).await;
    let _b = connect(&addr, "/rooms/clock").await;
    wait_for(&mut a, |s| s.connected_participants == 2).await;

    send(&mut a, r#"{"type":"START_GAME"}"#).await;
    wait_for(&mut a, |s| s.phase == Phase::Voting).await;
    send(&mut a, r#"{"type":"VOTE","choice":"3"}"#).await;

    let next = wait_for(&mut a, |s| s.phase == Phase::Voting && s.round_number == 2).await;
    assert!(
        next.narration_history
            .iter()
            .any(|t| t.text == "The party chose: Ask the barkeep about the map")
    );
}

#[tokio::test]
async fn test_slow_room_load_does_not_block_other_rooms() {
    let gate = Arc::new(Notify::new());
    let store = GatedStore {
        inner: MemoryStore::new(),
        gate: Arc::clone(&gate),
    };
    let addr = start_server_with(RoomConfig::default(), store).await;

    let mut vault = connect(&addr, "/rooms/vault").await;
    // Let the vault handler reach its load first.
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut open = connect(&addr, "/rooms/open").await;
    let snapshot = next_snapshot(&mut open).await;
    assert_eq!(snapshot.phase, Phase::Lobby);
    assert_eq!(snapshot.connected_participants, 1);

    gate.notify_one();
    let snapshot = next_snapshot(&mut vault).await;
    assert_eq!(snapshot.connected_participants, 1);
}
