//! recstore Server Binary
//!
//! Starts the TCP server for recstore.

use std::sync::Arc;

use clap::Parser;
use recstore::network::Server;
use recstore::{Config, Engine};
use tracing_subscriber::{fmt, EnvFilter};

/// recstore Server
#[derive(Parser, Debug)]
#[command(name = "recstore-server")]
#[command(about = "Multi-client record server with an audit log")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./recstore_data")]
    data_dir: String,

    /// Record store file name inside the data directory
    #[arg(long, default_value = "records.bin")]
    records_file: String,

    /// Audit log file name inside the data directory
    #[arg(long, default_value = "server.log")]
    log_file: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:15005")]
    listen: String,

    /// Monitor key (defaults to the listening port)
    #[arg(short = 'k', long)]
    monitor_key: Option<u32>,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Read timeout per connection in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,

    /// Write timeout per connection in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,recstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("recstore Server v{}", recstore::VERSION);
    tracing::info!("Data directory: {}", args.data_dir);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let mut builder = Config::builder()
        .data_dir(&args.data_dir)
        .records_file(&args.records_file)
        .log_file(&args.log_file)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms);
    if let Some(key) = args.monitor_key {
        builder = builder.monitor_key(key);
    }
    let config = builder.build();

    // Open engine
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized successfully");
    tracing::debug!("Monitor state: {}", engine.monitor().snapshot());

    // Start server
    let server = match Server::bind(config, engine) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
