//! Cache backing stores.
//!
//! Backends are plain key/value stores with no notion of TTL; expiry is the
//! [`CacheStore`](super::CacheStore)'s job. Every method may fail with a
//! [`CacheIoError`], which the store downgrades to a warning.

use fs2::FileExt;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::CacheEntry;
use crate::catalog::errors::CacheIoError;

pub trait CacheBackend: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheIoError>;
    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheIoError>;
    fn remove(&self, key: &str) -> Result<(), CacheIoError>;
    fn clear(&self) -> Result<(), CacheIoError>;
}

/// Volatile per-process cache.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, CacheEntry>>, CacheIoError> {
        self.entries
            .lock()
            .map_err(|_| CacheIoError::Unavailable("memory cache mutex poisoned".to_string()))
    }
}

impl CacheBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheIoError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheIoError> {
        self.lock()?.insert(key.to_string(), entry.clone());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheIoError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn clear(&self) -> Result<(), CacheIoError> {
        self.lock()?.clear();
        Ok(())
    }
}

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Path of the file backing `key`. Keys are percent-encoded so any key
    /// maps to a single safe filename.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", safe_filename(key)))
    }
}

/// Percent-encode everything but ASCII alphanumerics.
pub fn safe_filename(key: &str) -> String {
    utf8_percent_encode(key, NON_ALPHANUMERIC).to_string()
}

impl CacheBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<CacheEntry>, CacheIoError> {
        let path = self.path_for(key);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn set(&self, key: &str, entry: &CacheEntry) -> Result<(), CacheIoError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string(entry)?;
        write_file_locked(&self.path_for(key), &content)
    }

    fn remove(&self, key: &str) -> Result<(), CacheIoError> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn clear(&self) -> Result<(), CacheIoError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// Replace `path` atomically. The content goes to a unique temp file in the
/// same directory, which is renamed over `path` under an exclusive lock on the
/// target. The temp file never outlives a failed write.
fn write_file_locked(path: &Path, content: &str) -> Result<(), CacheIoError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let (tmp_path, mut tmp) = create_temp_beside(dir, path)?;

    let written = tmp.write_all(content.as_bytes()).and_then(|_| tmp.flush());
    let _ = tmp.sync_all();
    drop(tmp);
    let result = match written {
        Ok(()) => rename_locked(&tmp_path, path),
        Err(e) => Err(e.into()),
    };

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    } else if let Ok(dir_file) = File::open(dir) {
        let _ = dir_file.sync_all();
    }
    result
}

fn create_temp_beside(dir: &Path, path: &Path) -> Result<(PathBuf, File), CacheIoError> {
    let base = path.file_name().and_then(|s| s.to_str()).unwrap_or("cache.json");
    for counter in 0u32.. {
        let candidate = dir.join(format!(".{}.tmp-{}-{}", base, std::process::id(), counter));
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => return Ok((candidate, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Err(CacheIoError::Unavailable(format!("no free temp name for {}", path.display())))
}

fn rename_locked(tmp_path: &Path, path: &Path) -> Result<(), CacheIoError> {
    let lock_file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .truncate(false)
        .open(path)?;
    lock_file.lock_exclusive()?;
    fs::rename(tmp_path, path)?;
    Ok(())
}
