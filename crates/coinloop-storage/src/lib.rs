//! # Coinloop Storage
//!
//! Versioned persistence for the economy state.
//!
//! Every commit names the version it was computed from. A commit whose
//! expected version no longer matches the stored one is rejected with
//! [`StorageError::VersionConflict`] and nothing is written; the caller
//! reloads and recomputes.
//!
//! ## Backends
//!
//! - `memory_store/` - process-local state behind a lock
//! - `file_store/` - JSON envelope `{version, state}` on disk

use coinloop_economics::EconomyState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Version conflict: expected {expected:?}, found {found:?}")]
    VersionConflict {
        expected: Option<u64>,
        found: Option<u64>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Conflicts go away after reloading; the rest don't
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}

/// A stored value and the version it was committed as
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: u64,
    pub state: T,
}

/// Compare-and-swap store for a single economy state
pub trait StateStore: Send + Sync {
    /// Current state, or `None` if nothing was committed yet
    fn load(&self) -> Result<Option<Versioned<EconomyState>>>;

    /// Replace the state if the stored version equals `expected_version`
    /// (`None` means "must not exist yet"). Returns the new version.
    fn commit(&self, expected_version: Option<u64>, state: &EconomyState) -> Result<u64>;
}

impl<S: StateStore + ?Sized> StateStore for Arc<S> {
    fn load(&self) -> Result<Option<Versioned<EconomyState>>> {
        (**self).load()
    }

    fn commit(&self, expected_version: Option<u64>, state: &EconomyState) -> Result<u64> {
        (**self).commit(expected_version, state)
    }
}

fn check_version(expected: Option<u64>, found: Option<u64>) -> Result<u64> {
    if expected != found {
        return Err(StorageError::VersionConflict { expected, found });
    }
    Ok(found.map_or(1, |v| v + 1))
}

pub mod memory_store {
    //! In-process state store

    use super::*;
    use parking_lot::RwLock;

    /// State held in memory; lost on drop
    #[derive(Default)]
    pub struct MemoryStateStore {
        slot: RwLock<Option<Versioned<EconomyState>>>,
    }

    impl MemoryStateStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Store pre-seeded at version 1
        pub fn with_state(state: EconomyState) -> Self {
            Self {
                slot: RwLock::new(Some(Versioned { version: 1, state })),
            }
        }

        pub fn version(&self) -> Option<u64> {
            self.slot.read().as_ref().map(|v| v.version)
        }
    }

    impl StateStore for MemoryStateStore {
        fn load(&self) -> Result<Option<Versioned<EconomyState>>> {
            Ok(self.slot.read().clone())
        }

        fn commit(&self, expected_version: Option<u64>, state: &EconomyState) -> Result<u64> {
            let mut slot = self.slot.write();
            let version = check_version(expected_version, slot.as_ref().map(|v| v.version))?;
            *slot = Some(Versioned {
                version,
                state: state.clone(),
            });
            tracing::debug!(version, "Committed state to memory");
            Ok(version)
        }
    }
}

pub mod file_store {
    //! JSON file state store

    use super::*;
    use parking_lot::Mutex;
    use std::fs::{self, OpenOptions};
    use std::io::{ErrorKind, Write};
    use std::path::{Path, PathBuf};
    use tempfile::NamedTempFile;

    #[derive(Serialize)]
    struct EnvelopeRef<'a> {
        version: u64,
        state: &'a EconomyState,
    }

    /// State persisted as a single JSON document.
    ///
    /// A commit holds an exclusive OS lock on a sibling `.lock` file from the
    /// version check until the rename, so handles in other threads or
    /// processes see it as one step. The document is written to a uniquely
    /// named temp file and renamed over the target; readers never see a
    /// half-written document.
    pub struct FileStateStore {
        path: PathBuf,
        write_lock: Mutex<()>,
    }

    impl FileStateStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self {
                path: path.into(),
                write_lock: Mutex::new(()),
            }
        }

        pub fn path(&self) -> &Path {
            &self.path
        }

        fn sibling(&self, suffix: &str) -> PathBuf {
            let mut name = self
                .path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_default();
            name.push(suffix);
            self.path.with_file_name(name)
        }

        fn dir(&self) -> &Path {
            match self.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            }
        }

        fn read(&self) -> Result<Option<Versioned<EconomyState>>> {
            match fs::read(&self.path) {
                Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        }
    }

    impl StateStore for FileStateStore {
        fn load(&self) -> Result<Option<Versioned<EconomyState>>> {
            self.read()
        }

        fn commit(&self, expected_version: Option<u64>, state: &EconomyState) -> Result<u64> {
            let _guard = self.write_lock.lock();

            fs::create_dir_all(self.dir())?;
            let lock_file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(self.sibling(".lock"))?;
            let mut file_lock = fd_lock::RwLock::new(lock_file);
            let _file_guard = file_lock.write()?;

            let found = self.read()?.map(|v| v.version);
            let version = check_version(expected_version, found)?;

            let bytes = serde_json::to_vec_pretty(&EnvelopeRef { version, state })?;
            let mut temp = NamedTempFile::new_in(self.dir())?;
            temp.as_file_mut().write_all(&bytes)?;
            temp.as_file().sync_all()?;
            temp.persist(&self.path).map_err(|e| e.error)?;

            tracing::debug!(version, path = %self.path.display(), "Committed state to file");
            Ok(version)
        }
    }
}

// Re-export for convenience
pub use file_store::FileStateStore;
pub use memory_store::MemoryStateStore;
