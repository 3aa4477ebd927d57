//! Connection Handler Module
//!
//! Manages individual client sessions. Each accepted connection runs in its
//! own async task; the Store work for each request runs on Tokio's blocking
//! pool so a slow database call never stalls other sessions.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     TCP Listener                            │
//! │                    (server.rs)                              │
//! └──────────────────────┬──────────────────────────────────────┘
//!                        │
//!                        │ accept()
//!                        ▼
//!           ┌────────────────────────┐
//!           │   For each client...   │
//!           └────────────┬───────────┘
//!                        │
//!                        │ spawn task
//!                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 ConnectionHandler                           │
//! │                                                             │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐      │
//! │  │ Read bytes  │───>│ Parse frame │───>│ Decode req  │      │
//! │  └─────────────┘    └─────────────┘    └──────┬──────┘      │
//! │                                               │ EXIT: close │
//! │                                               ▼             │
//! │  ┌─────────────┐                      ┌───────────────┐     │
//! │  │ Send reply  │<─────────────────────│ spawn_blocking│     │
//! │  └─────────────┘                      └───────────────┘     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use enrolld::commands::CommandHandler;
//! use enrolld::connection::{handle_connection, ConnectionStats};
//! use enrolld::storage::Database;
//! use std::sync::Arc;
//!
//! let handler = CommandHandler::new(Database::new("enrollment.db"));
//! let stats = Arc::new(ConnectionStats::new());
//!
//! // For each accepted connection...
//! let (stream, addr) = listener.accept().await?;
//! tokio::spawn(handle_connection(stream, addr, handler.clone(), stats, None));
//! ```

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
