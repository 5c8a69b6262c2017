//! The `fableroom` server binary.
//!
//! Configuration comes from the environment (and `.env`); see
//! [`ServerConfig`].

use fableroom::{FableroomError, FableroomServer, ServerConfig};
use fableroom_transport::TransportError;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), FableroomError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env()?;
    let mut server = FableroomServer::from_config(&config).await?;
    tracing::info!(addr = %server.local_addr().map_err(TransportError::AcceptFailed)?, "listening");

    let result = tokio::select! {
        result = server.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            Ok(())
        }
    };
    server.shutdown().await;
    result
}
