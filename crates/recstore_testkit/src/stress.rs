//! Stress helpers for RecStore.
//!
//! These drive a store under heavy load and concurrent access.

use crate::fixtures::{person, person_with_val};
use recstore_core::Store;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress run.
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
}

/// Configuration for stress runs.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of operations to perform.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Number of records seeded before the run.
    pub record_count: usize,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 10_000,
            threads: 4,
            record_count: 1_000,
        }
    }
}

fn seed(store: &Store, count: usize) {
    store
        .load((0..count).map(|i| person_with_val(&format!("Seed {i}"), "Doe", (i % 10) as i64)))
        .expect("Failed to seed store");
}

/// Adds records one at a time.
pub fn stress_sequential_adds(store: &Store, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        match store.add(person(&format!("First {i}"), "Doe")) {
            Ok(_) => successful += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Interleaves adds, removals, field writes and compactions.
pub fn stress_mixed_operations(store: &Store, config: &StressConfig) -> StressTestResult {
    seed(store, config.record_count);

    let start = Instant::now();
    let mut successful = 0usize;
    let mut failed = 0usize;

    for i in 0..config.operations {
        let ok = match i % 4 {
            0 => store.add(person(&format!("Mixed {i}"), "Smith")).is_ok(),
            1 => {
                // A miss on a tombstone is still a successful removal attempt
                store.remove(i % store.length().max(1));
                true
            }
            2 => match store.get_record(i % store.length().max(1)) {
                Some(record) => record.set("val", (i % 10) as i64).is_ok(),
                None => true,
            },
            _ => {
                if i % 100 == 3 {
                    store.compact();
                }
                true
            }
        };
        if ok {
            successful += 1;
        } else {
            failed += 1;
        }
    }

    StressTestResult::new(successful, failed, start.elapsed())
}

/// Writes fields from several threads while others read through indexes.
pub fn stress_concurrent_writes(store: &Store, config: &StressConfig) -> StressTestResult {
    seed(store, config.record_count);

    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let ops_per_thread = config.operations / config.threads.max(1);
    let start = Instant::now();

    thread::scope(|scope| {
        for t in 0..config.threads {
            let successful = &successful;
            let failed = &failed;
            scope.spawn(move || {
                for i in 0..ops_per_thread {
                    let ok = if t % 2 == 0 {
                        let position = (i * config.threads + t) % config.record_count.max(1);
                        match store.get_record(position) {
                            Some(record) => record.set("val", ((i + t) % 10) as i64).is_ok(),
                            None => true,
                        }
                    } else {
                        store.index_count("val", (i % 10) as i64).is_ok()
                    };
                    if ok {
                        successful.fetch_add(1, Ordering::Relaxed);
                    } else {
                        failed.fetch_add(1, Ordering::Relaxed);
                    }
                }
            });
        }
    });

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::person_store;

    fn small() -> StressConfig {
        StressConfig {
            operations: 400,
            threads: 4,
            record_count: 50,
        }
    }

    #[test]
    fn sequential_adds() {
        let store = person_store();
        let result = stress_sequential_adds(&store, &small());
        assert_eq!(result.successful_ops, 400);
        assert_eq!(store.length(), 400);
    }

    #[test]
    fn mixed_operations_keep_index_consistent() {
        let store = person_store();
        store.create_index("val").unwrap();
        let result = stress_mixed_operations(&store, &small());
        assert_eq!(result.failed_ops, 0);

        let indexed: usize = (0..10)
            .map(|v| store.index_count("val", v).unwrap())
            .sum();
        let defaulted = store.index_count("val", 15).unwrap();
        assert_eq!(indexed + defaulted, store.size());
    }

    #[test]
    fn concurrent_writes() {
        let store = person_store();
        store.create_index("val").unwrap();
        let result = stress_concurrent_writes(&store, &small());
        assert_eq!(result.failed_ops, 0);

        let total: usize = (0..10)
            .map(|v| store.index_count("val", v).unwrap())
            .sum();
        assert_eq!(total, 50);
    }
}
