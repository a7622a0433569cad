//! Property-based test generators using proptest.
//!
//! Provides strategies for generating record payloads and index entries
//! that respect the invariants of a segment.

use proptest::prelude::*;
use seglog_storage::Entry;

/// Strategy for generating a single record payload (arbitrary bytes).
pub fn payload_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..1024)
}

/// Strategy for generating a batch of record payloads.
pub fn payloads_strategy(max_records: usize) -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(payload_strategy(), 1..max_records.max(2))
}

/// Strategy for generating index entries as a segment writes them.
///
/// Offsets are dense from zero and positions strictly increase, each one
/// a plausible frame size past the previous.
pub fn entries_strategy(max_entries: usize) -> impl Strategy<Value = Vec<Entry>> {
    prop::collection::vec(0u64..4096, 1..max_entries.max(2)).prop_map(|payload_lens| {
        let mut position = 0u64;
        payload_lens
            .into_iter()
            .enumerate()
            .map(|(offset, len)| {
                let entry = Entry::new(offset as u32, position);
                position += 8 + len;
                entry
            })
            .collect()
    })
}

/// Operations a segment issues against its store and index.
#[derive(Debug, Clone)]
pub enum SegmentOperation {
    /// Append a record and index it.
    Append {
        /// Record payload
        payload: Vec<u8>,
    },
    /// Read back the record with the given relative offset, if it exists.
    Read {
        /// Relative offset, reduced modulo the number of records
        offset: u64,
    },
    /// Close both files and reopen them.
    Reopen,
}

/// Strategy for generating segment operations.
pub fn segment_operation_strategy() -> impl Strategy<Value = SegmentOperation> {
    prop_oneof![
        4 => payload_strategy().prop_map(|payload| SegmentOperation::Append { payload }),
        3 => any::<u64>().prop_map(|offset| SegmentOperation::Read { offset }),
        1 => Just(SegmentOperation::Reopen),
    ]
}

/// Strategy for generating a sequence of segment operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<SegmentOperation>> {
    prop::collection::vec(segment_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{TestIndex, TestPair, TestStore};
    use seglog_storage::{Config, EntryRef, IndexConfig, StorageError, StoreConfig};

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn store_reads_back_every_append(payloads in payloads_strategy(32)) {
            let test_store = TestStore::with_config(&StoreConfig::new().write_buffer_capacity(512));

            let mut expected_position = 0u64;
            let mut positions = Vec::with_capacity(payloads.len());
            for payload in &payloads {
                let (written, position) = test_store.append(payload).unwrap();
                prop_assert_eq!(position, expected_position);
                prop_assert_eq!(written, 8 + payload.len() as u64);
                expected_position += written;
                positions.push(position);
            }

            for (payload, position) in payloads.iter().zip(positions) {
                prop_assert_eq!(&test_store.read(position).unwrap(), payload);
            }
        }

        #[test]
        fn store_reopen_resumes_after_existing_frames(
            before in payloads_strategy(8),
            after in payloads_strategy(8),
        ) {
            let mut test_store = TestStore::new();
            for payload in &before {
                test_store.append(payload).unwrap();
            }
            let size = test_store.size().unwrap();

            test_store.reopen(&StoreConfig::default());
            prop_assert_eq!(test_store.size().unwrap(), size);

            let (_, position) = test_store.append(&after[0]).unwrap();
            prop_assert_eq!(position, size);
            prop_assert_eq!(&test_store.read(0).unwrap(), &before[0]);
        }

        #[test]
        fn index_reads_back_every_write(entries in entries_strategy(64)) {
            let mut test_index = TestIndex::with_entries(64);
            for entry in &entries {
                test_index.write(entry.offset, entry.position).unwrap();
            }

            for (n, entry) in entries.iter().enumerate() {
                prop_assert_eq!(test_index.read(EntryRef::At(n as u64)).unwrap(), *entry);
            }
            prop_assert_eq!(test_index.read(EntryRef::Last).unwrap(), *entries.last().unwrap());
            prop_assert!(test_index
                .read(EntryRef::At(entries.len() as u64))
                .unwrap_err()
                .is_end_of_data());
        }

        #[test]
        fn full_index_rejects_without_side_effects(entries in entries_strategy(16)) {
            let capacity = entries.len() as u64;
            let mut test_index = TestIndex::with_entries(capacity);
            for entry in &entries {
                test_index.write(entry.offset, entry.position).unwrap();
            }

            let result = test_index.write(u32::MAX, u64::MAX);
            let is_full = matches!(result, Err(StorageError::IndexFull { .. }));
            prop_assert!(is_full);
            prop_assert_eq!(test_index.size().unwrap(), capacity * 12);
            prop_assert_eq!(test_index.read(EntryRef::Last).unwrap(), *entries.last().unwrap());
        }

        #[test]
        fn closed_index_file_is_exactly_its_entries(entries in entries_strategy(32)) {
            let mut test_index = TestIndex::with_entries(32);
            for entry in &entries {
                test_index.write(entry.offset, entry.position).unwrap();
            }
            let path = test_index.path();

            test_index.reopen(&IndexConfig::new().max_entries(32));
            prop_assert_eq!(test_index.len().unwrap(), entries.len() as u64);

            test_index.index.close().unwrap();
            let bytes = std::fs::read(&path).unwrap();
            prop_assert_eq!(bytes.len(), entries.len() * 12);
            for (slot, entry) in bytes.chunks(12).zip(&entries) {
                prop_assert_eq!(Entry::decode(slot).unwrap(), *entry);
            }
        }

        #[test]
        fn segment_operations_keep_records_readable(ops in operation_sequence_strategy(1, 40)) {
            let config = Config::new().index(IndexConfig::new().max_entries(64));
            let mut pair = TestPair::new(config);
            let mut model: Vec<Vec<u8>> = Vec::new();

            for op in ops {
                match op {
                    SegmentOperation::Append { payload } => {
                        let offset = pair.append(&payload).unwrap();
                        prop_assert_eq!(offset as usize, model.len());
                        model.push(payload);
                    }
                    SegmentOperation::Read { offset } => {
                        if model.is_empty() {
                            prop_assert!(pair.read(offset).unwrap_err().is_end_of_data());
                        } else {
                            let n = offset % model.len() as u64;
                            prop_assert_eq!(&pair.read(n).unwrap(), &model[n as usize]);
                        }
                    }
                    SegmentOperation::Reopen => pair.reopen(),
                }
            }
        }
    }

    #[test]
    fn entries_strategy_positions_increase() {
        use proptest::strategy::ValueTree;
        use proptest::test_runner::TestRunner;

        let mut runner = TestRunner::default();
        let entries = entries_strategy(16)
            .new_tree(&mut runner)
            .unwrap()
            .current();

        for (n, pair) in entries.windows(2).enumerate() {
            assert_eq!(pair[0].offset as usize, n);
            assert!(pair[1].position > pair[0].position);
        }
    }
}
