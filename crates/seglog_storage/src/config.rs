//! Store and index configuration.

use crate::error::{StorageError, StorageResult};
use crate::format::ENTRY_WIDTH_U64;

/// Configuration for opening a [`Store`](crate::Store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// Capacity of the in-memory write buffer in bytes.
    ///
    /// Appends smaller than this are coalesced before reaching the file.
    pub write_buffer_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            write_buffer_capacity: 4096,
        }
    }
}

impl StoreConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write buffer capacity.
    #[must_use]
    pub const fn write_buffer_capacity(mut self, bytes: usize) -> Self {
        self.write_buffer_capacity = bytes;
        self
    }

    /// Checks that the configuration can open a store.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] for a zero-sized buffer.
    pub fn validate(&self) -> StorageResult<()> {
        if self.write_buffer_capacity == 0 {
            return Err(StorageError::invalid_config(
                "write buffer capacity must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Configuration for opening an [`Index`](crate::Index).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Size the index file is grown to and mapped at while open.
    ///
    /// This caps the number of entries at `max_index_bytes / 12`.
    pub max_index_bytes: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_index_bytes: 1024 * 1024, // 1 MiB
        }
    }
}

impl IndexConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum index size in bytes.
    #[must_use]
    pub const fn max_index_bytes(mut self, bytes: u64) -> Self {
        self.max_index_bytes = bytes;
        self
    }

    /// Sets the maximum index size to hold exactly `entries` entries.
    #[must_use]
    pub const fn max_entries(mut self, entries: u64) -> Self {
        self.max_index_bytes = entries.saturating_mul(ENTRY_WIDTH_U64);
        self
    }

    /// Number of entries the index can hold.
    #[must_use]
    pub const fn entry_capacity(&self) -> u64 {
        self.max_index_bytes / ENTRY_WIDTH_U64
    }

    /// Checks that the configuration can open an index.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidConfig`] if the capacity is smaller
    /// than one entry or too large to map on this platform.
    pub fn validate(&self) -> StorageResult<()> {
        if self.max_index_bytes < ENTRY_WIDTH_U64 {
            return Err(StorageError::invalid_config(format!(
                "max index bytes {} is smaller than one entry ({ENTRY_WIDTH_U64} bytes)",
                self.max_index_bytes
            )));
        }
        if usize::try_from(self.max_index_bytes).is_err() {
            return Err(StorageError::invalid_config(format!(
                "max index bytes {} cannot be mapped on this platform",
                self.max_index_bytes
            )));
        }
        Ok(())
    }
}

/// Store and index settings handed down by the owning segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Config {
    /// Store settings.
    pub store: StoreConfig,
    /// Index settings.
    pub index: IndexConfig,
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the store configuration.
    #[must_use]
    pub const fn store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Sets the index configuration.
    #[must_use]
    pub const fn index(mut self, index: IndexConfig) -> Self {
        self.index = index;
        self
    }

    /// Validates both halves of the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`StorageError::InvalidConfig`] found.
    pub fn validate(&self) -> StorageResult<()> {
        self.store.validate()?;
        self.index.validate()
    }
}
