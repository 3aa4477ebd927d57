//! # enrolld - A Student Enrollment Server
//!
//! enrolld keeps students, courses and the enrollments between them in a
//! SQLite database and serves them to remote clients over a persistent TCP
//! session. Every request gets exactly one reply, in order.
//!
//! ## Features
//!
//! - **Session protocol**: RESP-style tagged values, one reply per request
//! - **Persistent storage**: SQLite through `rusqlite`, one connection per operation
//! - **Cascading deletes**: removing a student or course removes its
//!   enrollments in the same transaction
//! - **Async I/O**: Tokio task per client, database work on the blocking pool
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              enrolld                                    │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ TCP Server  │───>│ Connection  │───>│  Command    │                  │
//! │  │ (Listener)  │    │  Handler    │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │ spawn_blocking          │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌──────────────────────────────┐ │
//! │                     │   RESP      │    │  StudentStore  CourseStore   │ │
//! │                     │   Parser    │    │        EnrollmentStore       │ │
//! │                     └─────────────┘    └──────────────┬───────────────┘ │
//! │                                                       │                 │
//! │                                                       ▼                 │
//! │                                            ┌─────────────────────┐      │
//! │                                            │  SQLite (Database)  │      │
//! │                                            └─────────────────────┘      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use enrolld::server::{serve, ServerConfig};
//! use enrolld::storage::{schema, Database};
//! use enrolld::{CommandHandler, ConnectionStats};
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let db = Database::new("enrollment.db");
//!     schema::bootstrap(&db, schema::DEFAULT_ADMIN_PASSWORD)?;
//!
//!     let listener = TcpListener::bind("127.0.0.1:12346").await?;
//!     let stats = Arc::new(ConnectionStats::new());
//!
//!     serve(listener, CommandHandler::new(db), stats, ServerConfig::default()).await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`protocol`]: Frame parser, value type and record encoding
//! - [`storage`]: Database gateway, schema bootstrap and the three Stores
//! - [`commands`]: Typed requests and their dispatch to the Stores
//! - [`connection`]: Per-client session handling
//! - [`server`]: The accept loop
//!
//! ## Design Highlights
//!
//! ### No Shared Connection
//!
//! Each Store operation opens its own SQLite connection and closes it when
//! done. Concurrent sessions share nothing but the database file; SQLite's
//! locking and a busy timeout serialize writers.
//!
//! ### Uniqueness in the Schema
//!
//! The `(student_number, course_code)` pair is a UNIQUE constraint, so two
//! sessions racing to enroll the same pair cannot both succeed.

pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::{CommandHandler, Request};
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{ParseError, RespParser, RespValue};
pub use server::{serve, ServerConfig};
pub use storage::{CourseStore, Database, EnrollmentStore, StoreError, StudentStore};

/// The default port enrolld listens on
pub const DEFAULT_PORT: u16 = 12346;

/// The default host enrolld binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// The default database file
pub const DEFAULT_DB_PATH: &str = "enrollment.db";

/// Version of enrolld
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
