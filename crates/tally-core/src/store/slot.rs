//! Durable key-value slots.
//!
//! A slot holds whole string values under a small fixed set of keys: the
//! snapshot itself and the update sentinel. Writes replace the value
//! atomically; there is no partial update.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;

use crate::error::ErrorCode;

/// Key holding the serialized snapshot.
pub const DATA_KEY: &str = "intramurals_data";

/// Key whose change alone tells readers to reload [`DATA_KEY`].
pub const TRIGGER_KEY: &str = "intramurals_update_trigger";

const LOCK_FILE: &str = ".slot.lock";
const LOCK_TIMEOUT: Duration = Duration::from_secs(2);
const LOCK_RETRY: Duration = Duration::from_millis(10);

/// Errors from a durable slot.
#[derive(Debug, thiserror::Error)]
pub enum SlotError {
    #[error("failed to read slot {key}: {source}")]
    Read {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to write slot {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("slot lock {} still held after {waited:?}", .path.display())]
    Contended { path: PathBuf, waited: Duration },
}

impl SlotError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Read { .. } => ErrorCode::SlotReadFailed,
            Self::Write { .. } => ErrorCode::SlotWriteFailed,
            Self::Contended { .. } => ErrorCode::LockContention,
        }
    }
}

/// Durable storage for string values.
pub trait Slot {
    /// Read the value under `key`; `Ok(None)` when it was never written.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] when the value exists but cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, SlotError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SlotError`] when the value cannot be stored.
    fn write(&self, key: &str, value: &str) -> Result<(), SlotError>;
}

/// One file per key inside a directory.
///
/// Values are written to a temporary file and renamed into place under an
/// exclusive advisory lock, so readers see either the old or the new value.
#[derive(Debug, Clone)]
pub struct FileSlot {
    dir: PathBuf,
}

impl FileSlot {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }
}

impl Slot for FileSlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let _lock = SlotLock::acquire(&self.lock_path(), LockMode::Read, key, LOCK_TIMEOUT)?;
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(SlotError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let write_err = |source| SlotError::Write {
            key: key.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(write_err)?;
        let _lock = SlotLock::acquire(&self.lock_path(), LockMode::Write, key, LOCK_TIMEOUT)?;

        let path = self.path_for(key);
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, value.as_bytes()).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)?;
        tracing::trace!(key, bytes = value.len(), "slot written");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum LockMode {
    Read,
    Write,
}

/// Advisory lock on a [`FileSlot`] directory, released on drop.
///
/// Readers share the lock; a writer holds it exclusively.
#[derive(Debug)]
struct SlotLock {
    file: File,
}

impl SlotLock {
    /// Failures opening the lock file surface as a read or write failure
    /// of `key`, matching `mode`.
    fn acquire(path: &Path, mode: LockMode, key: &str, timeout: Duration) -> Result<Self, SlotError> {
        let io_err = |source: io::Error| match mode {
            LockMode::Read => SlotError::Read {
                key: key.to_string(),
                source,
            },
            LockMode::Write => SlotError::Write {
                key: key.to_string(),
                source,
            },
        };

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)
                .map_err(io_err)?;

            let locked = match mode {
                LockMode::Read => file.try_lock_shared().is_ok(),
                LockMode::Write => file.try_lock_exclusive().is_ok(),
            };
            if locked {
                return Ok(Self { file });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                tracing::warn!(path = %path.display(), ?waited, "slot lock contended");
                return Err(SlotError::Contended {
                    path: path.to_path_buf(),
                    waited,
                });
            }
            thread::sleep(LOCK_RETRY);
        }
    }
}

impl Drop for SlotLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

/// In-memory slot shared by every clone, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, String>,
    fail_writes: bool,
    write_log: Vec<String>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, simulating a full or read-only disk.
    pub fn set_fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    /// Keys in the order they were successfully written.
    #[must_use]
    pub fn write_log(&self) -> Vec<String> {
        self.lock().write_log.clone()
    }

    /// Store a raw value without going through [`Slot::write`].
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock()
            .values
            .insert(key.to_string(), value.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Slot for MemorySlot {
    fn read(&self, key: &str) -> Result<Option<String>, SlotError> {
        Ok(self.lock().values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), SlotError> {
        let mut inner = self.lock();
        if inner.fail_writes {
            return Err(SlotError::Write {
                key: key.to_string(),
                source: io::Error::other("storage quota exceeded"),
            });
        }
        inner.values.insert(key.to_string(), value.to_string());
        inner.write_log.push(key.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_slot_missing_key_reads_none() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        assert_eq!(slot.read(DATA_KEY).unwrap(), None);
    }

    #[test]
    fn file_slot_replaces_value() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path().join("slot"));
        slot.write(DATA_KEY, "{\"a\":1}").unwrap();
        slot.write(DATA_KEY, "{\"a\":2}").unwrap();

        assert_eq!(slot.read(DATA_KEY).unwrap().as_deref(), Some("{\"a\":2}"));
        assert!(!dir.path().join("slot/intramurals_data.tmp").exists());
    }

    #[test]
    fn file_slot_keys_are_independent() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        slot.write(TRIGGER_KEY, "1").unwrap();
        assert_eq!(slot.read(DATA_KEY).unwrap(), None);
        assert_eq!(slot.read(TRIGGER_KEY).unwrap().as_deref(), Some("1"));
    }

    fn hold(slot: &FileSlot, mode: LockMode) -> SlotLock {
        SlotLock::acquire(&slot.lock_path(), mode, DATA_KEY, Duration::from_millis(50)).unwrap()
    }

    #[test]
    fn writer_waits_out_a_held_lock_then_gives_up() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        let _held = hold(&slot, LockMode::Write);

        let err = SlotLock::acquire(
            &slot.lock_path(),
            LockMode::Write,
            DATA_KEY,
            Duration::from_millis(20),
        )
        .unwrap_err();

        assert!(matches!(&err, SlotError::Contended { path, .. } if *path == slot.lock_path()));
        assert_eq!(err.code(), ErrorCode::LockContention);
    }

    #[test]
    fn readers_share_the_lock() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        slot.write(DATA_KEY, "x").unwrap();
        let _held = hold(&slot, LockMode::Read);

        assert_eq!(slot.read(DATA_KEY).unwrap().as_deref(), Some("x"));
    }

    #[test]
    fn held_write_lock_blocks_readers() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        let _held = hold(&slot, LockMode::Write);

        let read = SlotLock::acquire(
            &slot.lock_path(),
            LockMode::Read,
            DATA_KEY,
            Duration::from_millis(20),
        );
        assert!(matches!(read, Err(SlotError::Contended { .. })));
    }

    #[test]
    fn dropping_the_lock_lets_the_next_writer_in() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        drop(hold(&slot, LockMode::Write));

        slot.write(DATA_KEY, "after").unwrap();
        assert_eq!(slot.read(DATA_KEY).unwrap().as_deref(), Some("after"));
    }

    #[test]
    fn unopenable_lock_file_reports_the_failing_direction() {
        let dir = TempDir::new().unwrap();
        let slot = FileSlot::new(dir.path());
        slot.write(DATA_KEY, "x").unwrap();
        fs::remove_file(slot.lock_path()).unwrap();
        fs::create_dir(slot.lock_path()).unwrap();

        let read = slot.read(DATA_KEY).unwrap_err();
        assert!(matches!(&read, SlotError::Read { key, .. } if key == DATA_KEY));
        assert_eq!(read.code(), ErrorCode::SlotReadFailed);

        let write = slot.write(DATA_KEY, "y").unwrap_err();
        assert_eq!(write.code(), ErrorCode::SlotWriteFailed);
    }

    #[test]
    fn memory_slot_clones_share_values() {
        let a = MemorySlot::new();
        let b = a.clone();
        a.write(DATA_KEY, "x").unwrap();
        assert_eq!(b.read(DATA_KEY).unwrap().as_deref(), Some("x"));
        assert_eq!(b.write_log(), vec![DATA_KEY.to_string()]);
    }

    #[test]
    fn memory_slot_failure_switch() {
        let slot = MemorySlot::new();
        slot.set_fail_writes(true);
        let err = slot.write(DATA_KEY, "x").unwrap_err();
        assert_eq!(err.code(), ErrorCode::SlotWriteFailed);
        assert_eq!(slot.read(DATA_KEY).unwrap(), None);
    }
}
