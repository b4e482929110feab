//! Error types for the future ledger

use thiserror::Error;

/// Result type for ledger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Ledger errors
#[derive(Error, Debug)]
pub enum Error {
    /// Storage error (RocksDB)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// Invalid amount (zero, or arithmetic overflow on a balance update)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Invalid identifier (owner or token id too long for key encoding)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid pagination parameters
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// Ledger corruption: dangling tick reference or a broken chain.
    ///
    /// Fatal by design. The enclosing state transition must abort rather
    /// than repair, so that fund-accounting bugs never get masked.
    #[error("Corrupt ledger: {0}")]
    Corrupt(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}
