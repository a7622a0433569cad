//! Append-only record store.

use crate::config::StoreConfig;
use crate::error::{StorageError, StorageResult};
use crate::format::{decode_len_prefix, encode_len_prefix, frame_len, LEN_WIDTH, LEN_WIDTH_U64};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An append-only file of length-prefixed records.
///
/// Each record is written as a frame: an 8-byte big-endian length followed
/// by the payload. [`Store::append`] returns the position where the frame
/// starts; that position is what the index records.
///
/// # Buffering
///
/// Appends go through an in-memory write buffer. Every read flushes the
/// buffer first, so a read always observes earlier appends on the same
/// instance. Nothing is fsynced unless [`Store::sync`] is called.
///
/// # Thread Safety
///
/// All operations take one internal lock for their full duration, so the
/// store can be shared behind an `Arc` and concurrent appends receive
/// strictly increasing, gap-free positions.
///
/// # Example
///
/// ```no_run
/// use seglog_storage::Store;
/// use std::path::Path;
///
/// let store = Store::open(Path::new("00000000000000000000.store")).unwrap();
/// let (written, position) = store.append(b"hello").unwrap();
/// assert_eq!((written, position), (13, 0));
/// assert_eq!(store.read(position).unwrap(), b"hello");
/// store.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Store {
    path: PathBuf,
    inner: Mutex<Option<OpenStore>>,
}

/// State that only exists while the store is open.
#[derive(Debug)]
struct OpenStore {
    writer: BufWriter<File>,
    size: u64,
}

impl Store {
    /// Opens or creates a store at the given path with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or stat'ed.
    pub fn open(path: &Path) -> StorageResult<Self> {
        Self::open_with_config(path, &StoreConfig::default())
    }

    /// Opens or creates a store at the given path.
    ///
    /// The size is restored from the file's current length, so reopening a
    /// store resumes appending after any existing frames.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the file cannot
    /// be opened or stat'ed.
    pub fn open_with_config(path: &Path, config: &StoreConfig) -> StorageResult<Self> {
        config.validate()?;

        // Append mode keeps buffered writes at the end of the file even
        // after reads have moved the cursor.
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        let size = file.metadata()?.len();
        debug!(path = %path.display(), size, "opened store");

        Ok(Self {
            path: path.to_path_buf(),
            inner: Mutex::new(Some(OpenStore {
                writer: BufWriter::with_capacity(config.write_buffer_capacity, file),
                size,
            })),
        })
    }

    /// Appends a record.
    ///
    /// Returns `(bytes_written, position)`: the frame size including the
    /// length prefix, and the position where the frame starts.
    ///
    /// The frame may still sit in the write buffer when this returns. If an
    /// error is returned, part of the frame may already be buffered; the
    /// caller must treat the store as unusable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or an I/O error if the
    /// buffer spills to the file and the write fails.
    pub fn append(&self, payload: &[u8]) -> StorageResult<(u64, u64)> {
        self.with_open(|store| {
            let position = store.size;
            let payload_len = payload.len() as u64;

            store.writer.write_all(&encode_len_prefix(payload_len))?;
            store.writer.write_all(payload)?;

            let written = frame_len(payload_len);
            store.size += written;
            Ok((written, position))
        })
    }

    /// Reads the record whose frame starts at `position`.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EndOfData`] if no length prefix fits at `position`
    /// - [`StorageError::Corrupted`] if the prefix declares more bytes than
    ///   the store holds
    /// - [`StorageError::Closed`] after close
    /// - I/O errors from the flush or the read
    pub fn read(&self, position: u64) -> StorageResult<Vec<u8>> {
        self.with_open(|store| {
            store.writer.flush()?;
            let size = store.size;

            let header_end = position
                .checked_add(LEN_WIDTH_U64)
                .filter(|end| *end <= size)
                .ok_or_else(|| StorageError::EndOfData {
                    requested: position.saturating_add(LEN_WIDTH_U64),
                    size,
                })?;

            let file = store.writer.get_mut();
            file.seek(SeekFrom::Start(position))?;

            let mut prefix = [0u8; LEN_WIDTH];
            file.read_exact(&mut prefix)?;
            let len = decode_len_prefix(&prefix)?;

            let frame_end = header_end.checked_add(len).filter(|end| *end <= size);
            let len = match (frame_end, usize::try_from(len)) {
                (Some(_), Ok(len)) => len,
                _ => {
                    return Err(StorageError::corrupted(format!(
                        "frame at {position} declares {len} bytes but store size is {size}"
                    )));
                }
            };

            let mut payload = vec![0u8; len];
            file.read_exact(&mut payload)?;
            Ok(payload)
        })
    }

    /// Reads raw bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes read. This is `buf.len()` unless the
    /// range runs past the end of the store, in which case the bytes up to
    /// the end are read and their count returned.
    ///
    /// # Errors
    ///
    /// - [`StorageError::EndOfData`] if `offset` is at or beyond the end of
    ///   the store and `buf` is not empty
    /// - [`StorageError::Closed`] after close
    /// - I/O errors from the flush or the read
    pub fn read_at(&self, buf: &mut [u8], offset: u64) -> StorageResult<usize> {
        self.with_open(|store| {
            store.writer.flush()?;

            if buf.is_empty() {
                return Ok(0);
            }

            let size = store.size;
            if offset >= size {
                return Err(StorageError::EndOfData {
                    requested: offset.saturating_add(buf.len() as u64),
                    size,
                });
            }

            // Bounded by buf.len(), so the narrowing cannot truncate.
            let available = (size - offset).min(buf.len() as u64) as usize;

            let file = store.writer.get_mut();
            file.seek(SeekFrom::Start(offset))?;
            file.read_exact(&mut buf[..available])?;
            Ok(available)
        })
    }

    /// Flushes the write buffer and syncs data and metadata to disk.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close, or the I/O error from
    /// the flush or the sync.
    pub fn sync(&self) -> StorageResult<()> {
        self.with_open(|store| {
            store.writer.flush()?;
            store.writer.get_ref().sync_all()?;
            Ok(())
        })
    }

    /// Returns the store size in bytes, including buffered frames.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] after close.
    pub fn size(&self) -> StorageResult<u64> {
        self.with_open(|store| Ok(store.size))
    }

    /// Returns the path to the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` once [`Store::close`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().is_none()
    }

    /// Flushes buffered frames and closes the file.
    ///
    /// The store is closed even if the flush fails; frames that were still
    /// buffered at that point are lost.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Closed`] if already closed, or the I/O error
    /// from the flush.
    pub fn close(&self) -> StorageResult<()> {
        let store = self.inner.lock().take().ok_or(StorageError::Closed)?;
        let size = store.size;

        let file = store.writer.into_inner().map_err(|e| e.into_error())?;
        drop(file);

        debug!(path = %self.path.display(), size, "closed store");
        Ok(())
    }

    fn with_open<R>(
        &self,
        f: impl FnOnce(&mut OpenStore) -> StorageResult<R>,
    ) -> StorageResult<R> {
        let mut guard = self.inner.lock();
        let store = guard.as_mut().ok_or(StorageError::Closed)?;
        f(store)
    }
}
