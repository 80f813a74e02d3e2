//! Test utilities & fixtures.
//! Scripted HTTP transport, failing cache backend and loaders wired to
//! the JSON fixtures under `tests/test-data-int`.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arcdex::catalog::{join_url, CacheIoError, Dataset, DatasetLoader};
use arcdex::fetch::{Fetcher, HttpResponse, HttpTransport, RetryPolicy, TransportError};
use arcdex::storage::{CacheBackend, CacheEntry, CacheStore, ManualClock, MemoryBackend};

pub const BASE_URL: &str = "http://fixtures.test/data/";
pub const START_MILLIS: i64 = 1_700_000_000_000;
pub const TTL: Duration = Duration::from_secs(300);

/// Return the path to the static integration test fixture directory.
pub fn fixture_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("test-data-int")
}

/// Raw body of one fixture file.
pub fn fixture_body(file_name: &str) -> String {
    std::fs::read_to_string(fixture_root().join(file_name)).expect("fixture file")
}

pub fn url_for(dataset: Dataset) -> String {
    join_url(BASE_URL, dataset.file_name())
}

type Scripted = Result<HttpResponse, TransportError>;

/// In-memory transport. Each URL answers from its own queue; the last
/// scripted answer repeats once the queue is down to one. Unscripted URLs
/// answer 404.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: Mutex<Vec<(String, tokio::time::Instant)>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.push(url, Ok(HttpResponse::new(status, body)));
        self
    }

    pub fn fail(self, url: &str, message: &str) -> Self {
        self.push(url, Err(TransportError(message.to_string())));
        self
    }

    /// Serve every dataset from its fixture file.
    pub fn with_fixtures(self) -> Self {
        Dataset::ALL
            .iter()
            .fold(self, |transport, dataset| {
                transport.respond(&url_for(*dataset), 200, &fixture_body(dataset.file_name()))
            })
    }

    fn push(&self, url: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|(u, _)| u == url).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Instants (tokio clock) of every call to `url`, in order.
    pub fn call_times(&self, url: &str) -> Vec<tokio::time::Instant> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(u, _)| u == url)
            .map(|(_, at)| *at)
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((url.to_string(), tokio::time::Instant::now()));
        let mut responses = self.responses.lock().unwrap();
        match responses.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Ok(HttpResponse::new(404, "not found")),
        }
    }
}

/// Backend whose reads and/or writes always fail.
#[derive(Default)]
pub struct FailingBackend {
    pub fail_reads: bool,
    pub fail_writes: bool,
    inner: MemoryBackend,
}

impl FailingBackend {
    pub fn reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn both() -> Self {
        Self {
            fail_reads: true,
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl CacheBackend for FailingBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheIoError> {
        if self.fail_reads {
            return Err(CacheIoError::Unavailable("storage disabled".to_string()));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheIoError> {
        if self.fail_writes {
            return Err(CacheIoError::Unavailable("quota exceeded".to_string()));
        }
        self.inner.set(key, entry)
    }

    fn remove(&self, key: &str) -> Result<(), CacheIoError> {
        self.inner.remove(key)
    }

    fn clear(&self) -> Result<(), CacheIoError> {
        self.inner.clear()
    }
}

/// Collects every log record emitted in this test binary.
struct CaptureLogger {
    records: Mutex<Vec<(log::Level, String)>>,
}

static CAPTURE: CaptureLogger = CaptureLogger {
    records: Mutex::new(Vec::new()),
};

impl log::Log for CaptureLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

/// Route `log` records into the capture buffer. Safe to call from every test.
pub fn capture_logs() {
    let _ = log::set_logger(&CAPTURE);
    log::set_max_level(log::LevelFilter::Trace);
}

/// Captured `warn!` messages containing `needle`. Tests in one binary share
/// the buffer, so match on text unique to the test.
pub fn warnings_containing(needle: &str) -> Vec<String> {
    CAPTURE
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(level, message)| *level == log::Level::Warn && message.contains(needle))
        .map(|(_, message)| message.clone())
        .collect()
}

pub fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_secs(1),
    }
}

pub fn fetcher(transport: ScriptedTransport) -> Fetcher<ScriptedTransport> {
    Fetcher::new(transport, policy())
}

/// Loader over `transport` with an in-memory cache and a manual clock.
pub fn loader(transport: ScriptedTransport) -> (DatasetLoader<ScriptedTransport>, Arc<ManualClock>) {
    loader_with_backend(transport, Box::new(MemoryBackend::new()))
}

pub fn loader_with_backend(
    transport: ScriptedTransport,
    backend: Box<dyn CacheBackend>,
) -> (DatasetLoader<ScriptedTransport>, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START_MILLIS));
    let cache = CacheStore::with_clock(backend, clock.clone());
    (DatasetLoader::new(fetcher(transport), cache, BASE_URL, TTL), clock)
}
