//! enrolld - A Student Enrollment Server
//!
//! This is the main entry point for the enrolld server.
//! It prepares the database, binds the TCP listener and serves sessions
//! until Ctrl+C.

use anyhow::Context;
use enrolld::commands::CommandHandler;
use enrolld::connection::ConnectionStats;
use enrolld::server::{serve, ServerConfig};
use enrolld::storage::{schema, Database};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
    /// SQLite database file
    db_path: String,
    /// Password seeded for the admin account on first start
    admin_password: String,
    /// Idle session timeout, off when `None`
    idle_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: enrolld::DEFAULT_HOST.to_string(),
            port: enrolld::DEFAULT_PORT,
            db_path: enrolld::DEFAULT_DB_PATH.to_string(),
            admin_password: schema::DEFAULT_ADMIN_PASSWORD.to_string(),
            idle_timeout: None,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    config.host = value_of(&args, i, "--host").to_string();
                    i += 2;
                }
                "--port" | "-p" => {
                    config.port = value_of(&args, i, "--port").parse().unwrap_or_else(|_| {
                        eprintln!("Error: invalid port number");
                        std::process::exit(1);
                    });
                    i += 2;
                }
                "--db" | "-d" => {
                    config.db_path = value_of(&args, i, "--db").to_string();
                    i += 2;
                }
                "--admin-password" => {
                    config.admin_password = value_of(&args, i, "--admin-password").to_string();
                    i += 2;
                }
                "--idle-timeout" => {
                    let secs: u64 =
                        value_of(&args, i, "--idle-timeout")
                            .parse()
                            .unwrap_or_else(|_| {
                                eprintln!("Error: invalid idle timeout");
                                std::process::exit(1);
                            });
                    config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
                    i += 2;
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("enrolld version {}", enrolld::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Returns the value following flag `i`, or exits.
fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> &'a str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        r#"
enrolld - A Student Enrollment Server

USAGE:
    enrolld [OPTIONS]

OPTIONS:
    -h, --host <HOST>            Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>            Port to listen on (default: 12346)
    -d, --db <PATH>              SQLite database file (default: enrollment.db)
        --admin-password <PW>    Admin password seeded on first start (default: admin123)
        --idle-timeout <SECS>    Close sessions idle for this long (default: off)
    -v, --version                Print version information
        --help                   Print this help message

EXAMPLES:
    enrolld                           # Start on 127.0.0.1:12346
    enrolld --port 12400              # Start on port 12400
    enrolld --db /var/lib/school.db   # Use another database file

LOGGING:
    Set RUST_LOG to override the default level, e.g. RUST_LOG=enrolld=debug
"#
    );
}

fn print_banner(config: &Config) {
    println!(
        r#"
enrolld v{} - Student Enrollment Server
──────────────────────────────────────────────────────────────
Database: {}
Server started on {}
Ready to accept connections.

Use Ctrl+C to shutdown gracefully.
"#,
        enrolld::VERSION,
        config.db_path,
        config.bind_address()
    );
}

fn init_logging() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_target(false)
            .init();
    } else {
        FmtSubscriber::builder()
            .with_max_level(Level::INFO)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let config = Config::from_args();

    // Set up logging
    init_logging();

    // Create tables and seed the admin account
    let db = Database::new(&config.db_path);
    schema::bootstrap(&db, &config.admin_password)
        .with_context(|| format!("failed to prepare database {}", config.db_path))?;

    // Create connection statistics
    let stats = Arc::new(ConnectionStats::new());

    // Bind the TCP listener
    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_address()))?;
    info!("Listening on {}", config.bind_address());

    print_banner(&config);

    // Set up graceful shutdown
    let shutdown = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping server..."),
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    let server_config = ServerConfig {
        idle_timeout: config.idle_timeout,
    };

    // Main accept loop
    tokio::select! {
        _ = serve(listener, CommandHandler::new(db), Arc::clone(&stats), server_config) => {}
        _ = shutdown => {}
    }

    info!(
        connections = stats.connections_accepted.load(Ordering::Relaxed),
        requests = stats.requests_processed.load(Ordering::Relaxed),
        "Server shutdown complete"
    );
    Ok(())
}
