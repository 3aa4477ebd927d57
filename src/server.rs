//! Listener
//!
//! Accepts connections and hands each one to its own session task.

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error};

/// Per-session settings applied to every accepted connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerConfig {
    /// Close a session after this long without incoming bytes. Off when `None`.
    pub idle_timeout: Option<Duration>,
}

/// Accepts connections until the future is dropped.
///
/// Accept errors are logged and the loop keeps going.
pub async fn serve(
    listener: TcpListener,
    handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    config: ServerConfig,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!(client = %addr, "Accepted connection");
                let handler = handler.clone();
                let stats = Arc::clone(&stats);

                tokio::spawn(async move {
                    handle_connection(stream, addr, handler, stats, config.idle_timeout).await;
                });
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}
