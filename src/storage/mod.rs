//! Ledger persistence.
//!
//! The core algorithms never touch storage. This module is the collaborator
//! that feeds them active records and accepts their write-sets:
//! - [`LedgerSnapshot`]: the full in-memory state and every mutation on it
//! - [`LedgerStore`]: load/commit of whole snapshots
//! - [`JsonlStore`]: one JSONL file per entity under the data directory
//! - [`MemoryStore`]: a mutex-guarded snapshot for tests and embedders
//!
//! Write paths mutate a copy of the snapshot and commit it whole, so a failure
//! part-way leaves the stored state untouched.

mod jsonl;
mod snapshot;

pub use jsonl::*;
pub use snapshot::*;

use std::path::PathBuf;
use std::sync::Mutex;

use thiserror::Error;

use crate::models::{ArmyId, DetachmentId, MatchId};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unreadable row at {path:?} line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Army {0} does not exist")]
    ArmyNotFound(ArmyId),

    #[error("Detachment {0} does not exist")]
    DetachmentNotFound(DetachmentId),

    #[error("Match {0} does not exist")]
    MatchNotFound(MatchId),

    #[error("Detachment {detachment} does not belong to army {army}")]
    ForeignDetachment {
        detachment: DetachmentId,
        army: ArmyId,
    },

    #[error("Store lock poisoned")]
    Lock,
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Path of the JSONL file holding one entity type.
    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.data_dir.join(entity.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

/// Whole-snapshot persistence backend.
pub trait LedgerStore {
    /// Read the current state.
    fn load(&self) -> Result<LedgerSnapshot, StorageError>;

    /// Replace the stored state with `snapshot`.
    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StorageError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing state.
    pub fn with_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: Mutex::new(snapshot),
        }
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<LedgerSnapshot, StorageError> {
        let state = self.state.lock().map_err(|_| StorageError::Lock)?;
        Ok(state.clone())
    }

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        let mut state = self.state.lock().map_err(|_| StorageError::Lock)?;
        *state = snapshot.clone();
        Ok(())
    }
}

impl<S: LedgerStore + ?Sized> LedgerStore for &S {
    fn load(&self) -> Result<LedgerSnapshot, StorageError> {
        (**self).load()
    }

    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        (**self).commit(snapshot)
    }
}
