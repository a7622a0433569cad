//! Memory-mapped offset index.

use crate::config::IndexConfig;
use crate::error::{StorageError, StorageResult};
use crate::format::{Entry, EntryRef, ENTRY_WIDTH, ENTRY_WIDTH_U64};
use crate::mmap::MmapRegion;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A dense table mapping relative record offsets to store positions.
///
/// Entry `n` sits at byte `n * 12` of the index file and holds the relative
/// offset and the store position of the `n`th record of the segment. The
/// table is append-only: a written slot is never rewritten.
///
/// ## On-disk lifecycle
///
/// On open the file's current length becomes the written size, then the file
/// is grown to `max_index_bytes` and mapped. On close the mapping is synced,
/// the file is synced and truncated back down to the written size. A closed
/// index file therefore holds exactly `len() * 12` bytes and the entry count
/// is recovered from the file length alone.
///
/// ## Ownership
///
/// - [`Index::write`] and [`Index::close`] take `&mut self`
/// - Reads take `&self` and may run concurrently with each other
/// - A read can never overlap a write; callers sharing an index across
///   threads put it behind a reader/writer lock
///
/// An index dropped while still open is closed implicitly; failures at that
/// point can only be logged, so owners should call [`Index::close`].
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    state: Option<OpenIndex>,
}

/// State that only exists while the index is open.
#[derive(Debug)]
struct OpenIndex {
    file: File,
    mmap: MmapRegion,
    /// Bytes of valid entries, always a multiple of the entry width.
    size: u64,
}

impl Index {
    /// Opens or creates an index at the given path.
    ///
    /// # Errors
    ///
    /// - [`StorageError::InvalidConfig`] if the configuration is invalid or
    ///   the existing file is larger than `max_index_bytes`
    /// - [`StorageError::Corrupted`] if the existing file length is not a
    ///   whole number of entries
    /// - I/O errors from open, stat, truncate or map
    pub fn open(path: &Path, config: &IndexConfig) -> StorageResult<Self> {
        config.validate()?;
        let capacity = config.max_index_bytes;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let size = file.metadata()?.len();

        if size % ENTRY_WIDTH_U64 != 0 {
            return Err(StorageError::corrupted(format!(
                "index file {} is {size} bytes, not a multiple of {ENTRY_WIDTH}",
                path.display()
            )));
        }
        if size > capacity {
            return Err(StorageError::invalid_config(format!(
                "index file {} holds {size} bytes, more than max index bytes {capacity}",
                path.display()
            )));
        }

        file.set_len(capacity)?;
        let mmap = match MmapRegion::map(&file) {
            Ok(mmap) => mmap,
            Err(e) => {
                // Undo the pre-allocation so the file still describes its entries.
                let _ = file.set_len(size);
                return Err(e.into());
            }
        };

        debug!(path = %path.display(), size, capacity, "opened index");

        Ok(Self {
            path: path.to_path_buf(),
            state: Some(OpenIndex { file, mmap, size }),
        })
    }

    /// Appends an entry.
    ///
    /// # Errors
    ///
    /// - [`StorageError::IndexFull`] if fewer than 12 bytes of mapped
    ///   capacity remain; the index is left unchanged
    /// - [`StorageError::Closed`] after close
    pub fn write(&mut self, offset: u32, position: u64) -> StorageResult<()> {
        let index = self.state.as_mut().ok_or(StorageError::Closed)?;

        let size = index.size;
        let capacity = index.mmap.len() as u64;
        let full = || StorageError::IndexFull { size, capacity };

        let end = size + ENTRY_WIDTH_U64;
        if end > capacity {
            return Err(full());
        }

        // size < capacity, which fits in usize since the region is mapped.
        let start = size as usize;
        let slot = index
            .mmap
            .get_mut(start..start + ENTRY_WIDTH)
            .ok_or_else(full)?;
        Entry::new(offset, position).encode_into(slot);

        index.size = end;
        Ok(())
    }

    /// Reads an entry.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EndOfData`] if the index is empty or the entry has
    ///   not been written
    /// - [`StorageError::Closed`] after close
    pub fn read(&self, entry: EntryRef) -> StorageResult<Entry> {
        let index = self.open_state()?;
        let size = index.size;

        if size == 0 {
            return Err(StorageError::EndOfData {
                requested: ENTRY_WIDTH_U64,
                size,
            });
        }

        let n = match entry {
            EntryRef::Last => size / ENTRY_WIDTH_U64 - 1,
            EntryRef::At(n) => n,
        };

        let end_of_data = || StorageError::EndOfData {
            requested: n.saturating_add(1).saturating_mul(ENTRY_WIDTH_U64),
            size,
        };

        let start = n
            .checked_mul(ENTRY_WIDTH_U64)
            .filter(|start| {
                start
                    .checked_add(ENTRY_WIDTH_U64)
                    .is_some_and(|end| end <= size)
            })
            .ok_or_else(end_of_data)?;

        // start + 12 <= size <= mapped length, so the cast is lossless.
        let start = start as usize;
        let slot = index
            .mmap
            .get(start..start + ENTRY_WIDTH)
            .ok_or_else(end_of_data)?;
        Entry::decode(slot)
    }

    /// Returns the path of the backing file.
    ///
    /// Valid in every state, including after close.
    #[must_use]
    pub fn name(&self) -> &Path {
        &self.path
    }

    /// Returns the number of bytes of valid entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn size(&self) -> StorageResult<u64> {
        Ok(self.open_state()?.size)
    }

    /// Returns the number of valid entries.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn len(&self) -> StorageResult<u64> {
        Ok(self.size()? / ENTRY_WIDTH_U64)
    }

    /// Returns `true` if no entry has been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.size()? == 0)
    }

    /// Returns the mapped capacity in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn capacity(&self) -> StorageResult<u64> {
        Ok(self.open_state()?.mmap.len() as u64)
    }

    /// Returns `true` once the index has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.is_none()
    }

    /// Syncs the mapping and the file, truncates the file to the written
    /// size and closes it.
    ///
    /// The steps run in that order and stop at the first failure, whose
    /// error is returned. The index is closed either way, and after a
    /// failure the file may still be at its pre-allocated length; a later
    /// open then counts the zeroed tail as entries. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if already closed, or the first I/O
    /// error.
    pub fn close(&mut self) -> StorageResult<()> {
        let index = self.state.take().ok_or(StorageError::Closed)?;
        index.close(&self.path)
    }

    fn open_state(&self) -> StorageResult<&OpenIndex> {
        self.state.as_ref().ok_or(StorageError::Closed)
    }
}

impl OpenIndex {
    fn close(self, path: &Path) -> StorageResult<()> {
        let Self { file, mmap, size } = self;

        mmap.flush()?;
        file.sync_all()?;

        // Unmap before shrinking the file underneath the mapping.
        drop(mmap);
        file.set_len(size)?;
        drop(file);

        debug!(path = %path.display(), size, "closed index");
        Ok(())
    }
}

impl Drop for Index {
    fn drop(&mut self) {
        if let Some(index) = self.state.take() {
            if let Err(error) = index.close(&self.path) {
                warn!(path = %self.path.display(), %error, "failed to close index on drop");
            }
        }
    }
}
