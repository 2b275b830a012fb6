//! confkv Server Binary
//!
//! Starts the HTTP server for confkv.

use std::path::PathBuf;

use clap::Parser;
use confkv::config::{StorageBackend, WalSyncStrategy};
use confkv::network::Server;
use confkv::Config;
use tracing_subscriber::{fmt, EnvFilter};

/// confkv Server
#[derive(Parser, Debug)]
#[command(name = "confkv-server")]
#[command(about = "Versioned configuration store over HTTP")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, env = "CONFKV_DATA_DIR", default_value = "./confkv_data")]
    data_dir: PathBuf,

    /// Listen address (host:port)
    #[arg(short, long, env = "CONFKV_LISTEN", default_value = "127.0.0.1:3000")]
    listen: String,

    /// MemTable size limit in MB before flush
    #[arg(short = 'm', long, env = "CONFKV_MEMTABLE_MB", default_value = "4")]
    memtable_mb: usize,

    /// Segments allowed on disk before they are merged
    #[arg(long, env = "CONFKV_MAX_SEGMENTS", default_value = "8")]
    max_segments: usize,

    /// fsync the WAL after every write instead of every 100 entries
    #[arg(long, env = "CONFKV_SYNC_EVERY_WRITE")]
    sync_every_write: bool,

    /// Keep records in memory only (nothing is written to disk)
    #[arg(long, env = "CONFKV_IN_MEMORY")]
    in_memory: bool,

    /// Largest accepted request body in KB
    #[arg(long, env = "CONFKV_MAX_BODY_KB", default_value = "64")]
    max_body_kb: usize,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,confkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let backend = if args.in_memory {
        StorageBackend::Memory
    } else {
        StorageBackend::Engine
    };
    let sync = if args.sync_every_write {
        WalSyncStrategy::EveryWrite
    } else {
        WalSyncStrategy::EveryNEntries { count: 100 }
    };

    tracing::info!("confkv server v{}", confkv::VERSION);
    tracing::info!("Data directory: {}", args.data_dir.display());
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .data_dir(args.data_dir)
        .listen_addr(args.listen)
        .backend(backend)
        .wal_sync_strategy(sync)
        .memtable_size_limit(args.memtable_mb * 1024 * 1024)
        .max_segments(args.max_segments)
        .max_body_bytes(args.max_body_kb * 1024)
        .build();

    // Store opening replays the WAL, which is blocking file I/O
    let server = match tokio::task::spawn_blocking(move || Server::new(config)).await {
        Ok(Ok(server)) => server,
        Ok(Err(e)) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
        Err(e) => {
            tracing::error!("Store startup task failed: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
