//! Writable memory-mapped region over an index file.

use memmap2::MmapMut;
use std::fs::File;
use std::io;
use std::ops::Range;

/// A read-write shared mapping of a whole file.
///
/// # Ownership & Lifetime Rules
///
/// - The region is owned by exactly one [`Index`](crate::Index) and never
///   handed out; callers only see bounds-checked slices.
/// - The region is dropped (unmapped) before the file it maps is truncated
///   or closed.
/// - The file length is fixed for the lifetime of the region.
///
/// Bounds checks here are against the mapped capacity only. The logical
/// size of the written data is tracked by the owner.
#[derive(Debug)]
pub(crate) struct MmapRegion {
    mmap: MmapMut,
}

impl MmapRegion {
    /// Maps the whole of `file` read-write.
    ///
    /// The file must be open for reading and writing and must not be empty.
    pub(crate) fn map(file: &File) -> io::Result<Self> {
        let len = file.metadata()?.len();
        if len == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot map empty file",
            ));
        }

        // SAFETY: the mapping is only reachable through this struct, which
        // the owning index keeps private. The index holds the file open and
        // at a fixed length until the region is dropped, and no other handle
        // in this process writes to or truncates the file while it is mapped.
        let mmap = unsafe { MmapMut::map_mut(file)? };

        Ok(Self { mmap })
    }

    /// Length of the mapped region in bytes.
    pub(crate) fn len(&self) -> usize {
        self.mmap.len()
    }

    /// Returns the bytes in `range`, or `None` if it leaves the mapping.
    pub(crate) fn get(&self, range: Range<usize>) -> Option<&[u8]> {
        self.mmap.get(range)
    }

    /// Returns the bytes in `range` for writing, or `None` if it leaves the
    /// mapping.
    pub(crate) fn get_mut(&mut self, range: Range<usize>) -> Option<&mut [u8]> {
        self.mmap.get_mut(range)
    }

    /// Writes dirty pages back to the file and waits for completion.
    pub(crate) fn flush(&self) -> io::Result<()> {
        self.mmap.flush()
    }
}
