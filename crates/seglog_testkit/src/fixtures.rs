//! Test fixtures over temporary directories.
//!
//! Each fixture owns its [`TempDir`], so the backing files live exactly as
//! long as the fixture.

use seglog_storage::{Config, Index, IndexConfig, Store, StoreConfig};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Output goes
/// through the test harness so it is captured per test.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A store in its own temporary directory.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    _temp_dir: TempDir,
}

impl TestStore {
    /// Opens a store with default settings.
    pub fn new() -> Self {
        Self::with_config(&StoreConfig::default())
    }

    /// Opens a store with the given settings.
    pub fn with_config(config: &StoreConfig) -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.store");
        let store = Store::open_with_config(&path, config).expect("Failed to open store");

        Self {
            store,
            _temp_dir: temp_dir,
        }
    }

    /// Directory holding the store file.
    pub fn dir(&self) -> &Path {
        self._temp_dir.path()
    }

    /// Closes the store and opens a fresh instance over the same file.
    pub fn reopen(&mut self, config: &StoreConfig) {
        let path = self.store.path().to_path_buf();
        self.store.close().expect("Failed to close store");
        self.store = Store::open_with_config(&path, config).expect("Failed to reopen store");
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// An index in its own temporary directory.
pub struct TestIndex {
    /// The index instance.
    pub index: Index,
    _temp_dir: TempDir,
}

impl TestIndex {
    /// Opens an index that holds `entries` entries.
    pub fn with_entries(entries: u64) -> Self {
        Self::with_config(&IndexConfig::new().max_entries(entries))
    }

    /// Opens an index with the given settings.
    pub fn with_config(config: &IndexConfig) -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("test.index");
        let index = Index::open(&path, config).expect("Failed to open index");

        Self {
            index,
            _temp_dir: temp_dir,
        }
    }

    /// Path of the index file.
    pub fn path(&self) -> PathBuf {
        self.index.name().to_path_buf()
    }

    /// Closes the index and opens a fresh instance over the same file.
    pub fn reopen(&mut self, config: &IndexConfig) {
        let path = self.path();
        self.index.close().expect("Failed to close index");
        self.index = Index::open(&path, config).expect("Failed to reopen index");
    }
}

impl std::ops::Deref for TestIndex {
    type Target = Index;

    fn deref(&self) -> &Self::Target {
        &self.index
    }
}

impl std::ops::DerefMut for TestIndex {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.index
    }
}

/// A store and index pair sharing one temporary directory.
pub struct TestPair {
    /// The store half.
    pub store: Store,
    /// The index half.
    pub index: Index,
    config: Config,
    _temp_dir: TempDir,
}

impl TestPair {
    /// Opens a pair with the given settings.
    pub fn new(config: Config) -> Self {
        init_tracing();
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let (store, index) = open_pair(temp_dir.path(), &config);

        Self {
            store,
            index,
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Appends a record to the store and indexes it under the next offset.
    ///
    /// Returns the relative offset assigned.
    pub fn append(&mut self, payload: &[u8]) -> seglog_storage::StorageResult<u32> {
        let relative = self.index.len()? as u32;
        let (_, position) = self.store.append(payload)?;
        self.index.write(relative, position)?;
        Ok(relative)
    }

    /// Reads the record indexed under `relative`.
    pub fn read(&self, relative: u64) -> seglog_storage::StorageResult<Vec<u8>> {
        let entry = self
            .index
            .read(seglog_storage::EntryRef::At(relative))?;
        self.store.read(entry.position)
    }

    /// Closes both halves and reopens them over the same files.
    pub fn reopen(&mut self) {
        self.index.close().expect("Failed to close index");
        self.store.close().expect("Failed to close store");
        let (store, index) = open_pair(self._temp_dir.path(), &self.config);
        self.store = store;
        self.index = index;
    }
}

fn open_pair(dir: &Path, config: &Config) -> (Store, Index) {
    let store = Store::open_with_config(&dir.join("pair.store"), &config.store)
        .expect("Failed to open store");
    let index = Index::open(&dir.join("pair.index"), &config.index).expect("Failed to open index");
    (store, index)
}

/// Runs a test with a store in a temporary directory.
///
/// # Example
///
/// ```rust
/// use seglog_testkit::with_temp_store;
///
/// with_temp_store(|store| {
///     assert_eq!(store.append(b"x").unwrap(), (9, 0));
/// });
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::new();
    f(&test_store.store)
}

/// Runs a test with an index holding `entries` entries.
pub fn with_temp_index<F, R>(entries: u64, f: F) -> R
where
    F: FnOnce(&mut Index) -> R,
{
    let mut test_index = TestIndex::with_entries(entries);
    f(&mut test_index.index)
}
