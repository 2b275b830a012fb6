//! Error types for confkv
//!
//! One error type for the storage engine, the config service and the HTTP
//! layer. Variants in the "Request Errors" group are operational: they carry
//! a client-facing message and map to a 4xx status. Everything else is an
//! unexpected failure and is reported to clients as a generic 500.

use thiserror::Error;

/// Result type alias using ConfkvError
pub type Result<T> = std::result::Result<T, ConfkvError>;

/// Unified error type for confkv operations
#[derive(Debug, Error)]
pub enum ConfkvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    /// Key absent from a single segment (callers keep searching older ones)
    #[error("Key not found")]
    KeyNotFound,

    /// Uniqueness violation at the persistence boundary
    #[error("Duplicate key for fields: {}", fields.join(", "))]
    DuplicateKey { fields: Vec<&'static str> },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Concurrency Errors
    // -------------------------------------------------------------------------
    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Background task failed: {0}")]
    Task(String),

    // -------------------------------------------------------------------------
    // Request Errors (operational)
    // -------------------------------------------------------------------------
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    PayloadTooLarge(String),
}

impl ConfkvError {
    /// Build the client-facing conflict for a set of duplicated fields
    pub fn duplicate_fields(fields: &[&str]) -> Self {
        ConfkvError::Conflict(format!(
            "Duplicate value for fields: {}. Please use another value!",
            fields.join(", ")
        ))
    }

    /// Translate store-level conditions into their operational counterpart.
    ///
    /// `DuplicateKey` becomes a `Conflict`; every other variant is returned
    /// unchanged.
    pub fn into_operational(self) -> Self {
        match self {
            ConfkvError::DuplicateKey { fields } => Self::duplicate_fields(&fields),
            other => other,
        }
    }

    /// Whether this is an expected, client-caused failure
    pub fn is_operational(&self) -> bool {
        matches!(
            self,
            ConfkvError::InvalidInput(_)
                | ConfkvError::Conflict(_)
                | ConfkvError::NotFound(_)
                | ConfkvError::PayloadTooLarge(_)
        )
    }

    /// HTTP status code this error maps to
    pub fn status_code(&self) -> u16 {
        match self {
            ConfkvError::InvalidInput(_) | ConfkvError::Conflict(_) => 400,
            ConfkvError::NotFound(_) => 404,
            ConfkvError::PayloadTooLarge(_) => 413,
            _ => 500,
        }
    }
}

impl From<bincode::Error> for ConfkvError {
    fn from(e: bincode::Error) -> Self {
        ConfkvError::Serialization(e.to_string())
    }
}
