//! Store and index driven together the way an owning segment drives them.

use parking_lot::Mutex;
use seglog_storage::{
    Config, EntryRef, Index, IndexConfig, StorageError, StorageResult, Store, StoreConfig,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

/// Minimal segment: one store, one index, one lock around the pair.
struct TestSegment {
    base_offset: u64,
    store: Store,
    index: Mutex<Index>,
}

impl TestSegment {
    fn open(dir: &Path, base_offset: u64, config: &Config) -> StorageResult<Self> {
        let store = Store::open_with_config(&store_path(dir, base_offset), &config.store)?;
        let index = Index::open(&index_path(dir, base_offset), &config.index)?;
        Ok(Self {
            base_offset,
            store,
            index: Mutex::new(index),
        })
    }

    fn next_offset(&self) -> u64 {
        let index = self.index.lock();
        self.base_offset + index.len().unwrap()
    }

    /// Appends a record and returns its absolute offset.
    fn append(&self, payload: &[u8]) -> StorageResult<u64> {
        let mut index = self.index.lock();
        let relative = index.len()?;
        if relative * 12 + 12 > index.capacity()? {
            return Err(StorageError::IndexFull {
                size: index.size()?,
                capacity: index.capacity()?,
            });
        }
        let (_, position) = self.store.append(payload)?;
        index.write(relative as u32, position)?;
        Ok(self.base_offset + relative)
    }

    fn read(&self, offset: u64) -> StorageResult<Vec<u8>> {
        let entry = self.index.lock().read(EntryRef::At(offset - self.base_offset))?;
        self.store.read(entry.position)
    }

    fn close(self) -> StorageResult<()> {
        self.index.into_inner().close()?;
        self.store.close()
    }
}

fn store_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset:020}.store"))
}

fn index_path(dir: &Path, base_offset: u64) -> PathBuf {
    dir.join(format!("{base_offset:020}.index"))
}

fn small_config(entries: u64) -> Config {
    Config::new()
        .store(StoreConfig::new().write_buffer_capacity(256))
        .index(IndexConfig::new().max_entries(entries))
}

#[test]
fn append_then_read_by_offset() {
    let dir = TempDir::new().unwrap();
    let segment = TestSegment::open(dir.path(), 16, &small_config(10)).unwrap();

    let records: Vec<Vec<u8>> = (0..5).map(|i| format!("record-{i}").into_bytes()).collect();
    for (i, record) in records.iter().enumerate() {
        assert_eq!(segment.append(record).unwrap(), 16 + i as u64);
    }

    for (i, record) in records.iter().enumerate() {
        assert_eq!(&segment.read(16 + i as u64).unwrap(), record);
    }
    assert_eq!(segment.next_offset(), 21);
}

#[test]
fn index_positions_point_at_store_frames() {
    let dir = TempDir::new().unwrap();
    let segment = TestSegment::open(dir.path(), 0, &small_config(10)).unwrap();

    segment.append(b"hello").unwrap();
    segment.append(b"world!").unwrap();

    let index = segment.index.lock();
    let first = index.read(EntryRef::At(0)).unwrap();
    let last = index.read(EntryRef::Last).unwrap();
    assert_eq!((first.offset, first.position), (0, 0));
    assert_eq!((last.offset, last.position), (1, 13));
}

#[test]
fn reopen_resumes_both_files() {
    let dir = TempDir::new().unwrap();
    let config = small_config(10);

    {
        let segment = TestSegment::open(dir.path(), 0, &config).unwrap();
        segment.append(b"one").unwrap();
        segment.append(b"two").unwrap();
        segment.close().unwrap();
    }

    assert_eq!(std::fs::metadata(index_path(dir.path(), 0)).unwrap().len(), 24);
    assert_eq!(std::fs::metadata(store_path(dir.path(), 0)).unwrap().len(), 22);

    let segment = TestSegment::open(dir.path(), 0, &config).unwrap();
    assert_eq!(segment.next_offset(), 2);
    assert_eq!(segment.append(b"three").unwrap(), 2);

    assert_eq!(segment.read(0).unwrap(), b"one");
    assert_eq!(segment.read(1).unwrap(), b"two");
    assert_eq!(segment.read(2).unwrap(), b"three");
}

#[test]
fn full_index_signals_roll_to_next_segment() {
    let dir = TempDir::new().unwrap();
    let config = small_config(3);

    let first = TestSegment::open(dir.path(), 0, &config).unwrap();
    for i in 0..3 {
        first.append(format!("r{i}").as_bytes()).unwrap();
    }

    let err = first.append(b"r3").unwrap_err();
    assert!(err.is_index_full());

    // Nothing leaked into the store for the rejected record.
    assert_eq!(first.store.size().unwrap(), 3 * 10);

    let next_base = first.next_offset();
    first.close().unwrap();

    let second = TestSegment::open(dir.path(), next_base, &config).unwrap();
    assert_eq!(second.append(b"r3").unwrap(), 3);
    assert_eq!(second.read(3).unwrap(), b"r3");
}

#[test]
fn index_full_from_direct_write_leaves_entries_intact() {
    let dir = TempDir::new().unwrap();
    let mut index = Index::open(
        &dir.path().join("direct.index"),
        &IndexConfig::new().max_entries(2),
    )
    .unwrap();

    index.write(0, 0).unwrap();
    index.write(1, 9).unwrap();
    assert!(matches!(
        index.write(2, 18),
        Err(StorageError::IndexFull { size: 24, .. })
    ));
    assert_eq!(index.read(EntryRef::Last).unwrap().position, 9);
}

#[test]
fn reading_unknown_offset_is_end_of_data() {
    let dir = TempDir::new().unwrap();
    let segment = TestSegment::open(dir.path(), 0, &small_config(10)).unwrap();

    assert!(segment.read(0).unwrap_err().is_end_of_data());

    segment.append(b"a").unwrap();
    segment.append(b"b").unwrap();
    assert!(segment.read(5).unwrap_err().is_end_of_data());
}

#[test]
fn concurrent_producers_keep_offsets_and_positions_in_step() {
    let dir = TempDir::new().unwrap();
    let segment = Arc::new(TestSegment::open(dir.path(), 0, &small_config(1000)).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let segment = Arc::clone(&segment);
            thread::spawn(move || {
                (0..50)
                    .map(|i| {
                        let payload = format!("thread-{t}-record-{i}").into_bytes();
                        (segment.append(&payload).unwrap(), payload)
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let written: Vec<(u64, Vec<u8>)> = handles
        .into_iter()
        .flat_map(|h| h.join().unwrap())
        .collect();

    assert_eq!(segment.next_offset(), 200);
    for (offset, payload) in &written {
        assert_eq!(&segment.read(*offset).unwrap(), payload);
    }

    // Positions grow with offsets because both are assigned under one lock.
    let index = segment.index.lock();
    let mut previous = None;
    for n in 0..200 {
        let entry = index.read(EntryRef::At(n)).unwrap();
        assert_eq!(u64::from(entry.offset), n);
        if let Some(previous) = previous {
            assert!(entry.position > previous);
        }
        previous = Some(entry.position);
    }
}
