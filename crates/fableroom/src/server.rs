//! `FableroomServer` builder and accept loop.
//!
//! This is the entry point for running a Fableroom server. It ties
//! together the layers: transport → protocol → room.

use std::sync::Arc;

use fableroom_narrator::Narrator;
use fableroom_protocol::JsonCodec;
use fableroom_room::{RoomConfig, RoomRegistry, RoomStore};
use fableroom_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{AnyNarrator, AnyStore, FableroomError, ServerConfig};

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<N: Narrator, S: RoomStore> {
    pub(crate) rooms: Mutex<RoomRegistry<N, S>>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Fableroom server.
///
/// # Example
///
/// ```rust,no_run
/// use fableroom::prelude::*;
///
/// # async fn run() -> Result<(), FableroomError> {
/// let server = FableroomServer::builder()
///     .bind("127.0.0.1:0")
///     .room_config(RoomConfig::default())
///     .build(ScriptedNarrator::default(), MemoryStore::new())
///     .await?;
/// println!(
///     "listening on {}",
///     server.local_addr().map_err(fableroom_transport::TransportError::AcceptFailed)?
/// );
/// # Ok(())
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the settings every room is spawned with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener and prepares the room registry.
    pub async fn build<N: Narrator, S: RoomStore>(
        self,
        narrator: N,
        store: S,
    ) -> Result<FableroomServer<N, S>, FableroomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomRegistry::new(
                Arc::new(narrator),
                Arc::new(store),
                self.room_config,
            )),
            codec: JsonCodec,
        });

        Ok(FableroomServer { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Fableroom server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct FableroomServer<N: Narrator, S: RoomStore> {
    transport: WebSocketTransport,
    state: Arc<ServerState<N, S>>,
}

impl FableroomServer<AnyNarrator, AnyStore> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Builds a server from environment-derived settings.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, FableroomError> {
        let narrator = config.narrator();
        let store = config.store().await?;
        tracing::info!(
            narrator = %narrator.describe(),
            store = %store.describe(),
            "backends selected"
        );
        ServerBuilder::new()
            .bind(&config.bind)
            .room_config(config.room_config())
            .build(narrator, store)
            .await
    }
}

impl<N: Narrator, S: RoomStore> FableroomServer<N, S> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop, spawning a handler task per connection.
    /// Runs until the process is terminated or the future is dropped.
    pub async fn run(&mut self) -> Result<(), FableroomError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "Fableroom server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Stops every running room. Their state is already saved.
    pub async fn shutdown(&self) {
        let mut rooms = self.state.rooms.lock().await;
        let count = rooms.room_count();
        rooms.shutdown_all().await;
        tracing::info!(rooms = count, "rooms stopped");
    }
}
