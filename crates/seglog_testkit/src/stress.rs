//! Stress runs for stores and indexes.
//!
//! These exercise the primitives under sustained and concurrent load and
//! report throughput alongside failure counts.

use seglog_storage::{EntryRef, Index, Store};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads (for concurrent tests).
    pub threads: usize,
    /// Payload size in bytes.
    pub record_size: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            record_size: 256,
        }
    }
}

/// Appends `config.operations` records from a single thread.
pub fn stress_sequential_appends(store: &Store, config: &StressConfig) -> StressTestResult {
    let payload = vec![0xABu8; config.record_size];

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for _ in 0..config.operations {
        match store.append(&payload) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Appends from `config.threads` threads sharing one store.
pub fn stress_concurrent_appends(store: Arc<Store>, config: &StressConfig) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let ops_per_thread = config.operations / config.threads;

    let start = Instant::now();

    let handles: Vec<_> = (0..config.threads)
        .map(|t| {
            let store = Arc::clone(&store);
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let payload = vec![t as u8; config.record_size];

            thread::spawn(move || {
                for _ in 0..ops_per_thread {
                    match store.append(&payload) {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

/// Reads back frames at the given positions, cycling through them.
///
/// A read counts as successful only if the payload has the configured size.
pub fn stress_sequential_reads(
    store: &Store,
    positions: &[u64],
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    if positions.is_empty() {
        return StressTestResult::new(0, 0, start.elapsed());
    }

    for i in 0..config.operations {
        match store.read(positions[i % positions.len()]) {
            Ok(payload) if payload.len() == config.record_size => successful += 1,
            _ => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Fills an index to capacity, then reads every slot back.
///
/// Each write and each read counts as one operation; the fill stops at the
/// first `IndexFull`, which is not counted as a failure.
pub fn stress_index_fill_and_read(index: &mut Index) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    let mut position = 0u64;
    let mut offset = 0u32;
    loop {
        match index.write(offset, position) {
            Ok(()) => successful += 1,
            Err(e) if e.is_index_full() => break,
            Err(_) => {
                failed += 1;
                break;
            }
        }
        offset += 1;
        position += 64;
    }

    for n in 0..u64::from(offset) {
        match index.read(EntryRef::At(n)) {
            Ok(entry) if u64::from(entry.offset) == n && entry.position == n * 64 => {
                successful += 1
            }
            _ => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}
