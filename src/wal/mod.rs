//! Write-Ahead Log (WAL) Module
//!
//! Every engine mutation is framed and appended here before it reaches the
//! MemTable. On startup the log is replayed, flushed into a segment and
//! started afresh.
//!
//! ## Frame Layout
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────────────────┐
//! │ LSN (8)  │ CRC (4)  │ Len (4)  │ bincode(op, timestamp)   │
//! └──────────┴──────────┴──────────┴──────────────────────────┘
//! ```
//!
//! A frame that ends early is a torn tail and marks the end of the log. A
//! frame whose checksum or length is wrong is corruption; replay keeps only
//! what precedes it.

mod entry;
mod reader;
mod recovery;
mod writer;

pub use entry::{Operation, WalEntry, HEADER_SIZE, MAX_PAYLOAD_SIZE};
pub use reader::{WalIterator, WalReader};
pub use recovery::{RecoveryResult, WalRecovery};
pub use writer::WalWriter;
