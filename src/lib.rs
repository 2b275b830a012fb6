//! # confkv
//!
//! A versioned configuration store served over HTTP:
//! - Records keyed by (client, version), each holding string entries
//! - Latest-version lookup per client
//! - Write-Ahead Logging (WAL) for durability
//! - Crash recovery with partial write handling
//! - Single-writer/multi-reader storage engine
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      HTTP Server                             │
//! │              (axum router, JSON bodies)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │             Validation  →  Config Service                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    Record Store                              │
//! │             (EngineStore | MemoryStore)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │  MemTable   │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └──────┬──────┘
//!                                   │
//!                                   ▼
//!                           ┌─────────────┐
//!                           │   Storage   │
//!                           │  (Segments) │
//!                           └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod wal;
pub mod memtable;
pub mod storage;
pub mod engine;

pub mod record;
pub mod store;
pub mod validation;
pub mod service;

pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ConfkvError, Result};
pub use config::Config;
pub use engine::Engine;
pub use record::ConfigRecord;
pub use service::ConfigService;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of confkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
