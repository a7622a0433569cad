//! On-disk format shared by the store and the index.
//!
//! ## Store frame
//!
//! ```text
//! | length: u64 BE | payload: [u8; length] |
//! | 8 bytes        | variable              |
//! ```
//!
//! ## Index entry
//!
//! ```text
//! | relative offset: u32 BE | position: u64 BE |
//! | 4 bytes                 | 8 bytes          |
//! ```
//!
//! Neither file carries a header, footer or checksum. All integers are
//! big-endian.

use crate::error::{StorageError, StorageResult};

/// Width of the length prefix in front of every store frame.
pub const LEN_WIDTH: usize = 8;

/// Width of the relative offset field of an index entry.
pub const OFFSET_WIDTH: usize = 4;

/// Width of the position field of an index entry.
pub const POSITION_WIDTH: usize = 8;

/// Width of one index entry.
pub const ENTRY_WIDTH: usize = OFFSET_WIDTH + POSITION_WIDTH;

/// [`ENTRY_WIDTH`] as a `u64`, for arithmetic on file sizes.
pub const ENTRY_WIDTH_U64: u64 = ENTRY_WIDTH as u64;

/// [`LEN_WIDTH`] as a `u64`, for arithmetic on file sizes.
pub const LEN_WIDTH_U64: u64 = LEN_WIDTH as u64;

/// Encodes the length prefix of a frame carrying `payload_len` bytes.
#[must_use]
pub fn encode_len_prefix(payload_len: u64) -> [u8; LEN_WIDTH] {
    payload_len.to_be_bytes()
}

/// Decodes a frame length prefix.
///
/// # Errors
///
/// Returns [`StorageError::Corrupted`] if `bytes` is not exactly
/// [`LEN_WIDTH`] long.
pub fn decode_len_prefix(bytes: &[u8]) -> StorageResult<u64> {
    let prefix: [u8; LEN_WIDTH] = bytes.try_into().map_err(|_| {
        StorageError::corrupted(format!(
            "length prefix must be {LEN_WIDTH} bytes, got {}",
            bytes.len()
        ))
    })?;
    Ok(u64::from_be_bytes(prefix))
}

/// Total on-disk size of a frame with a `payload_len`-byte payload.
#[must_use]
pub const fn frame_len(payload_len: u64) -> u64 {
    LEN_WIDTH_U64 + payload_len
}

/// One `(relative offset, position)` pair of the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Entry {
    /// Record offset relative to the segment's base offset.
    pub offset: u32,
    /// Byte position of the record's frame in the store file.
    pub position: u64,
}

impl Entry {
    /// Creates a new entry.
    #[must_use]
    pub const fn new(offset: u32, position: u64) -> Self {
        Self { offset, position }
    }

    /// Encodes the entry into its fixed-width slot representation.
    #[must_use]
    pub fn encode(&self) -> [u8; ENTRY_WIDTH] {
        let mut slot = [0u8; ENTRY_WIDTH];
        self.encode_into(&mut slot);
        slot
    }

    /// Encodes the entry into the first [`ENTRY_WIDTH`] bytes of `slot`.
    ///
    /// # Panics
    ///
    /// Panics if `slot` is shorter than [`ENTRY_WIDTH`]. Callers slice the
    /// slot out of a bounds-checked region.
    pub fn encode_into(&self, slot: &mut [u8]) {
        slot[..OFFSET_WIDTH].copy_from_slice(&self.offset.to_be_bytes());
        slot[OFFSET_WIDTH..ENTRY_WIDTH].copy_from_slice(&self.position.to_be_bytes());
    }

    /// Decodes an entry from a slot.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Corrupted`] if `slot` is not exactly
    /// [`ENTRY_WIDTH`] long.
    pub fn decode(slot: &[u8]) -> StorageResult<Self> {
        if slot.len() != ENTRY_WIDTH {
            return Err(StorageError::corrupted(format!(
                "index entry must be {ENTRY_WIDTH} bytes, got {}",
                slot.len()
            )));
        }

        let mut offset = [0u8; OFFSET_WIDTH];
        offset.copy_from_slice(&slot[..OFFSET_WIDTH]);
        let mut position = [0u8; POSITION_WIDTH];
        position.copy_from_slice(&slot[OFFSET_WIDTH..]);

        Ok(Self {
            offset: u32::from_be_bytes(offset),
            position: u64::from_be_bytes(position),
        })
    }
}

impl From<(u32, u64)> for Entry {
    fn from((offset, position): (u32, u64)) -> Self {
        Self::new(offset, position)
    }
}

impl From<Entry> for (u32, u64) {
    fn from(entry: Entry) -> Self {
        (entry.offset, entry.position)
    }
}

/// Which index entry a read refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryRef {
    /// The most recently written entry.
    Last,
    /// The entry with the given relative number, counted from zero.
    At(u64),
}

impl From<u64> for EntryRef {
    fn from(n: u64) -> Self {
        Self::At(n)
    }
}
