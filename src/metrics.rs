//! Process-wide counters for dataset loading.
//! Read through [`snapshot`] and [`dataset_counters_snapshot`]; the CLI
//! `status` command prints them.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

static HTTP_ATTEMPTS: AtomicU64 = AtomicU64::new(0);
static HTTP_RETRIES: AtomicU64 = AtomicU64::new(0);
static HTTP_FAILURES: AtomicU64 = AtomicU64::new(0);
static CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static CACHE_MISSES: AtomicU64 = AtomicU64::new(0);
static CACHE_EXPIRED: AtomicU64 = AtomicU64::new(0);
static CACHE_IO_ERRORS: AtomicU64 = AtomicU64::new(0);
static RECORDS_REJECTED: AtomicU64 = AtomicU64::new(0);

static DATASET_COUNTERS: OnceLock<Mutex<HashMap<String, DatasetCounter>>> = OnceLock::new();

pub fn inc_http_attempts() {
    HTTP_ATTEMPTS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_http_retries() {
    HTTP_RETRIES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_http_failures() {
    HTTP_FAILURES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_cache_hits() {
    CACHE_HITS.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_cache_misses() {
    CACHE_MISSES.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_cache_expired() {
    CACHE_EXPIRED.fetch_add(1, Ordering::Relaxed);
}
pub fn inc_cache_io_errors() {
    CACHE_IO_ERRORS.fetch_add(1, Ordering::Relaxed);
}
pub fn add_records_rejected(count: usize) {
    RECORDS_REJECTED.fetch_add(count as u64, Ordering::Relaxed);
}

/// Per-dataset load bookkeeping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DatasetCounter {
    pub loads: u64,
    pub failures: u64,
    pub last_record_count: usize,
}

fn dataset_counter_lock() -> &'static Mutex<HashMap<String, DatasetCounter>> {
    DATASET_COUNTERS.get_or_init(|| Mutex::new(HashMap::new()))
}

pub fn record_dataset_loaded(dataset: &str, records: usize) -> DatasetCounter {
    let mut guard = dataset_counter_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let counter = guard.entry(dataset.to_string()).or_default();
    counter.loads = counter.loads.saturating_add(1);
    counter.last_record_count = records;
    *counter
}

pub fn record_dataset_failed(dataset: &str) -> DatasetCounter {
    let mut guard = dataset_counter_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let counter = guard.entry(dataset.to_string()).or_default();
    counter.failures = counter.failures.saturating_add(1);
    *counter
}

pub fn dataset_counters_snapshot() -> HashMap<String, DatasetCounter> {
    dataset_counter_lock()
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .clone()
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub http_attempts: u64,
    pub http_retries: u64,
    pub http_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_expired: u64,
    pub cache_io_errors: u64,
    pub records_rejected: u64,
}

pub fn snapshot() -> Snapshot {
    Snapshot {
        http_attempts: HTTP_ATTEMPTS.load(Ordering::Relaxed),
        http_retries: HTTP_RETRIES.load(Ordering::Relaxed),
        http_failures: HTTP_FAILURES.load(Ordering::Relaxed),
        cache_hits: CACHE_HITS.load(Ordering::Relaxed),
        cache_misses: CACHE_MISSES.load(Ordering::Relaxed),
        cache_expired: CACHE_EXPIRED.load(Ordering::Relaxed),
        cache_io_errors: CACHE_IO_ERRORS.load(Ordering::Relaxed),
        records_rejected: RECORDS_REJECTED.load(Ordering::Relaxed),
    }
}
