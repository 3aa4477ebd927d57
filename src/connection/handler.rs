//! Session Handler
//!
//! One `ConnectionHandler` runs per connected client. It owns the socket,
//! the read buffer and the parser for that client; nothing in it is shared
//! with other sessions.
//!
//! ## Session Lifecycle
//!
//! ```text
//! 1. Client connects
//!        │
//!        ▼
//! 2. ┌──────────────────────────────┐
//!    │  AWAITING_REQUEST            │
//!    │   read bytes until one frame │
//!    │   decodes                    │
//!    └──────────────┬───────────────┘
//!                   ▼
//!    ┌──────────────────────────────┐
//!    │  PROCESSING                  │
//!    │   run on the blocking pool,  │
//!    │   write exactly one reply    │
//!    └──────────────┬───────────────┘
//!                   │
//!              [loop back]
//!        │
//!        ▼
//! 3. CLOSED: EXIT, end of stream, reset, bad frame or idle timeout
//! ```
//!
//! ## Buffer Management
//!
//! TCP is a stream protocol, so a read may deliver a partial frame or several
//! frames. Bytes accumulate in a `BytesMut` until a whole frame parses; frames
//! already buffered are processed one by one, in arrival order, before the
//! next read.

use crate::commands::{CommandHandler, Request};
use crate::protocol::parser::MAX_BULK_SIZE;
use crate::protocol::{ParseError, RespParser, RespValue};
use bytes::BytesMut;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, error, info, trace, warn};

/// Maximum size for the read buffer.
///
/// The largest request is a command name plus a three-field record, each
/// field up to `MAX_BULK_SIZE`, so four maximal fields and their framing fit.
const MAX_BUFFER_SIZE: usize = 4 * MAX_BULK_SIZE + 1024;

/// Initial buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Counters shared by all sessions.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Currently active connections
    pub active_connections: AtomicU64,
    /// Total requests answered
    pub requests_processed: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn request_processed(&self) {
        self.requests_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles a single client session.
pub struct ConnectionHandler {
    /// The TCP stream for this connection
    stream: BufWriter<TcpStream>,

    /// Client's address (for logging)
    addr: SocketAddr,

    /// Buffer for incoming data
    buffer: BytesMut,

    /// Request dispatcher
    command_handler: CommandHandler,

    /// Frame parser
    parser: RespParser,

    /// Connection statistics (shared)
    stats: Arc<ConnectionStats>,

    /// Close the session when no bytes arrive for this long
    idle_timeout: Option<Duration>,
}

impl ConnectionHandler {
    /// Creates a new session for an accepted connection.
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        command_handler: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.connection_opened();

        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_SIZE),
            command_handler,
            parser: RespParser::new(),
            stats,
            idle_timeout: None,
        }
    }

    /// Sets a read deadline; the session closes if it expires.
    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Runs the session until the client leaves or the transport fails.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        info!(client = %self.addr, "Client connected");

        let result = self.main_loop().await;

        match &result {
            Ok(()) => info!(client = %self.addr, "Client requested disconnect"),
            Err(e) => match e {
                ConnectionError::ClientDisconnected => {
                    info!(client = %self.addr, "Client disconnected")
                }
                ConnectionError::IoError(io_err)
                    if io_err.kind() == std::io::ErrorKind::ConnectionReset =>
                {
                    debug!(client = %self.addr, "Connection reset by client")
                }
                _ => warn!(client = %self.addr, error = %e, "Session ended with error"),
            },
        }

        self.stats.connection_closed();
        result
    }

    /// The read-dispatch-write loop. Returns `Ok` only on `EXIT`.
    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some(frame) = self.try_parse_frame()? {
                let request = match Request::parse(frame) {
                    Ok(Request::Exit) => return Ok(()),
                    Ok(request) => Some(request),
                    Err(e) => {
                        warn!(client = %self.addr, error = %e, "Malformed request");
                        None
                    }
                };

                let response = match request {
                    Some(request) => self.process(request).await,
                    None => RespValue::null(),
                };
                self.stats.request_processed();

                self.send_response(&response).await?;
            }

            self.read_more_data().await?;
        }
    }

    /// Runs one request on the blocking pool.
    ///
    /// A failed task yields the null reply and leaves the session open.
    async fn process(&self, request: Request) -> RespValue {
        let command = request.name().to_string();
        trace!(client = %self.addr, command = %command, "Processing request");

        let handler = self.command_handler.clone();
        match tokio::task::spawn_blocking(move || handler.dispatch(request)).await {
            Ok(response) => response,
            Err(e) => {
                error!(client = %self.addr, command = %command, error = %e, "Request task failed");
                RespValue::null()
            }
        }
    }

    /// Attempts to parse one frame from the buffer.
    fn try_parse_frame(&mut self) -> Result<Option<RespValue>, ConnectionError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }

        match self.parser.parse(&self.buffer) {
            Ok(Some((value, consumed))) => {
                let _ = self.buffer.split_to(consumed);
                trace!(
                    client = %self.addr,
                    consumed = consumed,
                    remaining = self.buffer.len(),
                    "Parsed frame"
                );
                Ok(Some(value))
            }
            Ok(None) => {
                trace!(
                    client = %self.addr,
                    buffered = self.buffer.len(),
                    "Incomplete frame, need more data"
                );
                Ok(None)
            }
            Err(e) => {
                warn!(client = %self.addr, error = %e, "Undecodable frame");
                Err(ConnectionError::ParseError(e))
            }
        }
    }

    /// Reads more data from the socket into the buffer.
    async fn read_more_data(&mut self) -> Result<(), ConnectionError> {
        if self.buffer.len() >= MAX_BUFFER_SIZE {
            error!(
                client = %self.addr,
                size = self.buffer.len(),
                "Buffer size limit exceeded"
            );
            return Err(ConnectionError::BufferFull);
        }

        if self.buffer.capacity() - self.buffer.len() < 1024 {
            self.buffer.reserve(4096);
        }

        let read = self.stream.get_mut().read_buf(&mut self.buffer);
        let n = match self.idle_timeout {
            Some(limit) => tokio::time::timeout(limit, read)
                .await
                .map_err(|_| ConnectionError::IdleTimeout(limit))??,
            None => read.await?,
        };

        if n == 0 {
            if self.buffer.is_empty() {
                return Err(ConnectionError::ClientDisconnected);
            } else {
                return Err(ConnectionError::UnexpectedEof);
            }
        }

        self.stats.bytes_read(n);
        trace!(client = %self.addr, bytes = n, "Read data");

        Ok(())
    }

    /// Writes one reply and flushes it.
    async fn send_response(&mut self, response: &RespValue) -> Result<(), ConnectionError> {
        let bytes = response.serialize();
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        self.stats.bytes_written(bytes.len());
        trace!(
            client = %self.addr,
            bytes = bytes.len(),
            "Sent response"
        );
        Ok(())
    }
}

/// Errors that end a session.
#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    /// I/O error (network issue)
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Frame could not be decoded
    #[error("Parse error: {0}")]
    ParseError(#[from] ParseError),

    /// Client closed the connection between requests
    #[error("Client disconnected")]
    ClientDisconnected,

    /// Unexpected end of stream (partial frame)
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Buffer size limit exceeded
    #[error("Buffer size limit exceeded")]
    BufferFull,

    /// No data arrived within the idle timeout
    #[error("Idle for more than {0:?}")]
    IdleTimeout(Duration),
}

/// Runs a session to completion.
///
/// Session errors end here; they never reach the listener.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    command_handler: CommandHandler,
    stats: Arc<ConnectionStats>,
    idle_timeout: Option<Duration>,
) {
    let handler = ConnectionHandler::new(stream, addr, command_handler, stats)
        .with_idle_timeout(idle_timeout);
    // `run` has already logged how the session ended.
    let _ = handler.run().await;
}
