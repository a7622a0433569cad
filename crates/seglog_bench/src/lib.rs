//! Benchmark utilities.

use rand::Rng;
use seglog_storage::{Index, IndexConfig, Store, StoreConfig};
use tempfile::TempDir;

/// Generate random record payload of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of random payloads.
pub fn generate_payloads(count: usize, payload_size: usize) -> Vec<Vec<u8>> {
    (0..count).map(|_| random_data(payload_size)).collect()
}

/// Opens a store in a fresh temporary directory.
///
/// The directory must outlive the store, so both are returned.
pub fn temp_store(config: &StoreConfig) -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_with_config(&temp_dir.path().join("bench.store"), config).unwrap();
    (temp_dir, store)
}

/// Opens an index sized for `entries` entries in a fresh temporary directory.
pub fn temp_index(entries: u64) -> (TempDir, Index) {
    let temp_dir = TempDir::new().unwrap();
    let index = Index::open(
        &temp_dir.path().join("bench.index"),
        &IndexConfig::new().max_entries(entries),
    )
    .unwrap();
    (temp_dir, index)
}
