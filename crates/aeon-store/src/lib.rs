//! Storage layer for the aeon ledger.
//!
//! The ledger lives in a single JSON file, `aeon_vault.json`, inside the data
//! directory.
//!
//! # Concurrency
//!
//! [`aeon_core::Ledger`] has no synchronization of its own, and a load, operate,
//! save cycle is not transactional. Two processes racing through that cycle
//! would silently overwrite each other. Callers hold a [`StoreLock`] (an
//! exclusive advisory lock on `.lock` in the data directory) for the whole
//! cycle:
//!
//! ```no_run
//! # fn main() -> Result<(), aeon_store::StoreError> {
//! let store = aeon_store::Store::new("/tmp/aeon");
//! let _lock = store.lock()?;
//! let ledger = store.load()?;
//! store.save(&ledger)?;
//! # Ok(())
//! # }
//! ```
//!
//! A crash between the operation and the save loses that operation. Saves go
//! through a temporary file and a rename, so a crash during the write never
//! leaves a truncated ledger behind.
//!
//! # File Format
//!
//! Day keys are `YYYY-MM-DD` strings, units are keyed by UUID, timestamps are
//! RFC 3339 and durations use the `4h30m0s` notation. Totals, overtime, stop
//! and duration are omitted while unset.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use aeon_core::{Ledger, LedgerError};
use fs2::FileExt;
use thiserror::Error;

/// File name of the ledger inside the data directory.
pub const LEDGER_FILE_NAME: &str = "aeon_vault.json";

const LOCK_FILE_NAME: &str = ".lock";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No ledger has been saved yet.
    #[error("no ledger found at {}", path.display())]
    NotFound { path: PathBuf },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not a ledger.
    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file decodes but breaks a ledger invariant.
    #[error("invalid ledger in {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: LedgerError,
    },

    #[error("failed to encode ledger: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StoreError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Loads and validates the ledger stored at `path`.
pub fn load(path: &Path) -> Result<Ledger, StoreError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(e) => return Err(StoreError::io(path, e)),
    };

    let ledger: Ledger = serde_json::from_str(&content).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    ledger.validate().map_err(|source| StoreError::Invalid {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), days = ledger.days().len(), "loaded ledger");
    Ok(ledger)
}

/// Writes `ledger` to `path`, replacing any previous file.
pub fn save(path: &Path, ledger: &Ledger) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
    }
    let json = serde_json::to_string_pretty(ledger).map_err(StoreError::Encode)?;

    let tmp_path = path.with_extension("json.tmp");
    let mut file = File::create(&tmp_path).map_err(|e| StoreError::io(&tmp_path, e))?;
    file.write_all(json.as_bytes())
        .and_then(|()| file.sync_all())
        .map_err(|e| StoreError::io(&tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io(path, e))?;

    tracing::debug!(path = %path.display(), days = ledger.days().len(), "saved ledger");
    Ok(())
}

/// The data directory holding the ledger and its lock file.
#[derive(Debug, Clone)]
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the ledger file.
    pub fn ledger_path(&self) -> PathBuf {
        self.dir.join(LEDGER_FILE_NAME)
    }

    /// Whether a ledger has been saved.
    pub fn exists(&self) -> bool {
        self.ledger_path().is_file()
    }

    pub fn load(&self) -> Result<Ledger, StoreError> {
        load(&self.ledger_path())
    }

    pub fn save(&self, ledger: &Ledger) -> Result<(), StoreError> {
        save(&self.ledger_path(), ledger)
    }

    /// Blocks until the data directory's exclusive lock is acquired.
    pub fn lock(&self) -> Result<StoreLock, StoreError> {
        let file = self.open_lock_file()?;
        file.lock_exclusive()
            .map_err(|e| StoreError::io(&self.lock_path(), e))?;
        tracing::debug!(dir = %self.dir.display(), "acquired store lock");
        Ok(StoreLock { file })
    }

    /// Acquires the lock if no other holder has it.
    ///
    /// Returns `Ok(None)` when the lock is held elsewhere.
    pub fn try_lock(&self) -> Result<Option<StoreLock>, StoreError> {
        let file = self.open_lock_file()?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(StoreLock { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(StoreError::io(&self.lock_path(), e)),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE_NAME)
    }

    fn open_lock_file(&self) -> Result<File, StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        let path = self.lock_path();
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io(&path, e))
    }
}

/// Exclusive hold on a data directory. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            tracing::warn!(error = %e, "failed to release store lock");
        }
    }
}
