//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during store and index operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred on the backing file or mapping.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A read was requested beyond the written content.
    ///
    /// For the index this also covers reads from an empty index.
    #[error("end of data: requested byte {requested}, size {size}")]
    EndOfData {
        /// The first byte past the requested range.
        requested: u64,
        /// The number of bytes currently written.
        size: u64,
    },

    /// The index has no mapped capacity left for another entry.
    ///
    /// Not a corruption: the owning segment is full and must roll.
    #[error("index full: size {size}, capacity {capacity}")]
    IndexFull {
        /// Bytes written so far.
        size: u64,
        /// Bytes of mapped capacity.
        capacity: u64,
    },

    /// The backing file does not hold a valid sequence of frames or entries.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// The store or index has been closed.
    #[error("storage is closed")]
    Closed,

    /// The configuration cannot be used to open a store or index.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    /// Returns `true` for [`StorageError::EndOfData`].
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData { .. })
    }

    /// Returns `true` for [`StorageError::IndexFull`].
    #[must_use]
    pub fn is_index_full(&self) -> bool {
        matches!(self, Self::IndexFull { .. })
    }
}

impl StorageError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
