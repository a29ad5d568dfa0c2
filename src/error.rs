//! Centralized error types for wwivnet.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the wwivnet library.
#[derive(Error, Debug)]
pub enum NetError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified packet file does not exist.
    #[error("Packet file not found: {0}")]
    FileNotFound(PathBuf),

    /// Fewer bytes were available than a declared header or record needs.
    #[error("Truncated data at offset {offset}: needed {needed} bytes, found {available}")]
    Truncated {
        offset: u64,
        needed: u64,
        available: u64,
    },

    /// A record is internally inconsistent.
    #[error("Malformed record at offset {offset}: {reason}")]
    Malformed { offset: u64, reason: String },

    /// A FidoNet address could not be parsed.
    #[error("Invalid FidoNet address: {0}")]
    InvalidAddress(String),

    /// A FidoNet packet's password does not match the one configured for
    /// its sender.
    #[error("Unexpected packet password from node {address}")]
    PasswordMismatch { address: String },

    /// The reader already failed on an earlier record.
    #[error("Reader is in the error state; reopen the packet to read again")]
    ReaderFailed,

    /// The configuration is missing a value the operation needs.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias for `Result<T, NetError>`.
pub type Result<T> = std::result::Result<T, NetError>;

impl NetError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Map an open failure, reporting a missing file distinctly.
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::io(path, source)
        }
    }
}

/// Allow `?` on `std::io::Error` inside functions returning `NetError`
/// when no path context is available (in-memory readers and writers).
impl From<std::io::Error> for NetError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<stream>"),
            source,
        }
    }
}
