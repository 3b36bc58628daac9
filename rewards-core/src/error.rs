//! Error types for the rewards core

use thiserror::Error;

/// Result type for rewards operations
pub type Result<T> = std::result::Result<T, Error>;

/// Rewards errors
#[derive(Error, Debug)]
pub enum Error {
    /// No resolvable actor identity
    #[error("No authenticated user")]
    Unauthenticated,

    /// Aggregate missing for a required operation
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Aggregate already exists at registration
    #[error("User already registered: {0}")]
    UserExists(String),

    /// Storage error (RocksDB / transport)
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Daily scan quota exhausted
    #[error("Daily scan quota exceeded: limit {limit}")]
    QuotaExceeded {
        /// The per-day limit that was hit
        limit: u32,
    },

    /// Ledger and aggregate disagree; caller should trigger a repair
    #[error("Balance reconciliation required for {user_id}: ledger total {ledger_total}, aggregate balance {balance}")]
    Reconciliation {
        /// User whose aggregate diverged
        user_id: String,
        /// Sum of ledger deltas
        ledger_total: i64,
        /// Stored aggregate balance
        balance: i64,
    },

    /// Invalid award parameters
    #[error("Invalid award: {0}")]
    InvalidAward(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::StoreUnavailable(err.to_string())
    }
}
