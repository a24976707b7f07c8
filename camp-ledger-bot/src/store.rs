//! Persistence for the ledger.
//!
//! The whole ledger is written on every flush; there is no incremental log.
//! `JsonFileStore` writes a sibling temp file and renames it over the target
//! so a reader never sees half a file.

use camp_ledger_types::Ledger;
use std::path::{Path, PathBuf};

/// Error type for ledger persistence.
#[derive(Debug)]
pub enum StoreError {
    /// The file exists but couldn't be read
    Read { path: String, source: std::io::Error },
    /// The file was read but isn't a valid ledger
    Malformed { path: String, source: serde_json::Error },
    /// The ledger couldn't be encoded
    Serialize(serde_json::Error),
    /// Writing or replacing the file failed
    Write { path: String, source: std::io::Error },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Read { path, source } => write!(f, "Failed to read {}: {}", path, source),
            StoreError::Malformed { path, source } => {
                write!(f, "Malformed ledger file {}: {}", path, source)
            }
            StoreError::Serialize(e) => write!(f, "Failed to encode ledger: {}", e),
            StoreError::Write { path, source } => write!(f, "Failed to write {}: {}", path, source),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Read { source, .. } | StoreError::Write { source, .. } => Some(source),
            StoreError::Malformed { source, .. } => Some(source),
            StoreError::Serialize(e) => Some(e),
        }
    }
}

/// Where the ledger lives between restarts.
pub trait LedgerStore: Send + Sync {
    /// Read the persisted ledger. A store with nothing saved yet returns an empty ledger.
    fn load(&self) -> Result<Ledger, StoreError>;

    /// Replace the persisted ledger with `ledger`.
    fn flush(&self, ledger: &Ledger) -> Result<(), StoreError>;

    /// Short description for log lines.
    fn describe(&self) -> String;
}

/// Pretty-printed JSON file, one object keyed by member.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Ledger, StoreError> {
        if !self.path.exists() {
            log::info!("Store: {} does not exist yet, starting empty", self.display_path());
            return Ok(Ledger::new());
        }

        let raw = std::fs::read_to_string(&self.path).map_err(|source| StoreError::Read {
            path: self.display_path(),
            source,
        })?;

        serde_json::from_str(&raw).map_err(|source| StoreError::Malformed {
            path: self.display_path(),
            source,
        })
    }

    fn flush(&self, ledger: &Ledger) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(ledger).map_err(StoreError::Serialize)?;

        let temp = self.temp_path();
        std::fs::write(&temp, json).map_err(|source| StoreError::Write {
            path: temp.display().to_string(),
            source,
        })?;
        std::fs::rename(&temp, &self.path).map_err(|source| StoreError::Write {
            path: self.display_path(),
            source,
        })?;

        log::debug!("Store: flushed {} members to {}", ledger.len(), self.display_path());
        Ok(())
    }

    fn describe(&self) -> String {
        self.display_path()
    }
}

/// Load the ledger, falling back to an empty one if the stored copy is unusable.
pub fn load_or_empty(store: &dyn LedgerStore) -> Ledger {
    match store.load() {
        Ok(ledger) => {
            log::info!("Store: loaded {} members from {}", ledger.len(), store.describe());
            ledger
        }
        Err(e) => {
            log::error!("Store: {}; starting with an empty ledger", e);
            Ledger::new()
        }
    }
}

/// Replace the ledger with an empty one and persist it straight away.
pub fn reset(store: &dyn LedgerStore) -> Ledger {
    let ledger = Ledger::new();
    if let Err(e) = store.flush(&ledger) {
        log::error!("Store: reset could not be persisted: {}", e);
    }
    ledger
}

/// In-memory store holding the JSON text a file would contain.
#[cfg(test)]
pub struct MemoryStore {
    contents: std::sync::Mutex<Option<String>>,
    fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self {
            contents: std::sync::Mutex::new(None),
            fail_writes: false,
        }
    }

    pub fn with_contents(raw: &str) -> Self {
        Self {
            contents: std::sync::Mutex::new(Some(raw.to_string())),
            fail_writes: false,
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            contents: std::sync::Mutex::new(None),
            fail_writes: true,
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.contents.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger, StoreError> {
        match self.contents.lock().unwrap().as_deref() {
            None => Ok(Ledger::new()),
            Some(raw) => serde_json::from_str(raw).map_err(|source| StoreError::Malformed {
                path: "memory".to_string(),
                source,
            }),
        }
    }

    fn flush(&self, ledger: &Ledger) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Write {
                path: "memory".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        let json = serde_json::to_string_pretty(ledger).map_err(StoreError::Serialize)?;
        *self.contents.lock().unwrap() = Some(json);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
