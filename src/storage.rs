use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::models::PersistedState;

/// File name of the durable slot inside the storage root. A fixed name plays
/// the role the fixed key plays in a key-value store: every save overwrites
/// the whole record.
const DATA_FILE: &str = "taskpad.json";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Corrupt(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::Corrupt(reason) => write!(f, "corrupt data: {reason}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(value: std::io::Error) -> Self {
        StorageError::Io(value)
    }
}

pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn ensure_dirs(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn slot_path(&self) -> PathBuf {
        self.root.join(DATA_FILE)
    }

    /// Full overwrite of the slot. Failure is reported, never panics; the
    /// caller's in-memory state is not this layer's concern.
    pub fn save(&self, record: &PersistedState) -> Result<(), StorageError> {
        self.write_atomic(record)
    }

    /// Reads the slot. A missing slot is a valid empty result (`Ok(None)`).
    /// A present but unparseable or shape-invalid value is corrupt data: the
    /// slot is cleared so the poison value cannot survive a reload, and the
    /// failure is reported to the caller.
    pub fn load(&self) -> Result<Option<PersistedState>, StorageError> {
        let path = self.slot_path();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        // A slot that is not even UTF-8 is corrupt data, not an io failure:
        // it must be cleared like any other unparseable value.
        let buf = match String::from_utf8(bytes) {
            Ok(buf) => buf,
            Err(err) => return self.discard_corrupt(err.to_string()),
        };

        let record: PersistedState = match serde_json::from_str(&buf) {
            Ok(record) => record,
            Err(err) => return self.discard_corrupt(err.to_string()),
        };
        if let Err(reason) = record.validate() {
            return self.discard_corrupt(reason);
        }
        Ok(Some(record))
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn discard_corrupt(&self, reason: String) -> Result<Option<PersistedState>, StorageError> {
        log::warn!("clearing corrupt slot {}: {reason}", self.slot_path().display());
        if let Err(err) = self.clear() {
            log::warn!("failed to clear corrupt slot: {err}");
        }
        Err(StorageError::Corrupt(reason))
    }

    fn write_atomic(&self, record: &PersistedState) -> Result<(), StorageError> {
        let path = self.slot_path();
        let temp_path = path.with_extension("tmp");
        let json = serde_json::to_vec_pretty(record)
            .map_err(|err| StorageError::Corrupt(err.to_string()))?;
        {
            let mut file = File::create(&temp_path)?;
            file.write_all(&json)?;
            file.sync_all()?;
        }
        fs::rename(temp_path, path)?;
        Ok(())
    }
}
