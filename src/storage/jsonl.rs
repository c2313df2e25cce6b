//! JSONL (JSON Lines) storage.
//!
//! Each entity type lives in its own file under the data directory, one JSON
//! object per line. Whole-file rewrites go through a temp file that is renamed
//! into place, so readers never see a half-written file.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::{LedgerSnapshot, LedgerStore, StorageConfig, StorageError};

/// Entity types for JSONL storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityType {
    Army,
    Detachment,
    Match,
}

impl EntityType {
    /// Get the filename for this entity type.
    pub fn filename(&self) -> &'static str {
        match self {
            EntityType::Army => "armies.jsonl",
            EntityType::Detachment => "detachments.jsonl",
            EntityType::Match => "matches.jsonl",
        }
    }
}

/// JSONL file writer.
pub struct JsonlWriter<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: Serialize> JsonlWriter<T> {
    /// Create a new JSONL writer for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a writer for a specific entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Ensure the parent directory exists.
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Write entities to a temp file next to the target without touching it.
    pub fn stage(&self, entities: &[T]) -> Result<StagedFile, StorageError> {
        self.ensure_dir()?;

        let staging = self.staging_path();
        let file = File::create(&staging)?;
        let mut writer = BufWriter::new(file);

        for entity in entities {
            let json = serde_json::to_string(entity)?;
            writeln!(writer, "{}", json)?;
        }

        writer.flush()?;
        writer.get_ref().sync_all()?;
        debug!("Staged {} entities at {:?}", entities.len(), staging);

        Ok(StagedFile {
            staging,
            target: self.path.clone(),
            count: entities.len(),
        })
    }

    /// Write entities, replacing the entire file.
    pub fn write_all(&self, entities: &[T]) -> Result<usize, StorageError> {
        self.stage(entities)?.publish()
    }
}

/// A fully written temp file waiting to replace its target.
#[derive(Debug)]
pub struct StagedFile {
    staging: PathBuf,
    target: PathBuf,
    count: usize,
}

impl StagedFile {
    /// Rename the staged file over the target.
    pub fn publish(self) -> Result<usize, StorageError> {
        fs::rename(&self.staging, &self.target)?;
        info!("Wrote {} entities to {:?}", self.count, self.target);
        Ok(self.count)
    }

    /// Remove the staged file, leaving the target as it was.
    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.staging) {
            warn!("Failed to remove staged file {:?}: {}", self.staging, e);
        }
    }
}

/// JSONL file reader.
pub struct JsonlReader<T> {
    path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T: DeserializeOwned> JsonlReader<T> {
    /// Create a new JSONL reader for the given path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _marker: PhantomData,
        }
    }

    /// Create a reader for a specific entity type.
    pub fn for_entity(config: &StorageConfig, entity: EntityType) -> Self {
        Self::new(config.entity_path(entity))
    }

    /// Check if the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Read all entities from the file. A missing file reads as empty.
    ///
    /// Any line that fails to parse is an error: the ledger rewrites whole
    /// files, so a skipped row would be dropped on the next commit.
    pub fn read_all(&self) -> Result<Vec<T>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let mut entities = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let entity = serde_json::from_str(&line).map_err(|source| {
                warn!("Failed to parse line {} in {:?}: {}", index + 1, self.path, source);
                StorageError::Corrupt {
                    path: self.path.clone(),
                    line: index + 1,
                    source,
                }
            })?;
            entities.push(entity);
        }

        debug!("Read {} entities from {:?}", entities.len(), self.path);
        Ok(entities)
    }
}

/// Ledger stored as three JSONL files.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

impl LedgerStore for JsonlStore {
    fn load(&self) -> Result<LedgerSnapshot, StorageError> {
        Ok(LedgerSnapshot {
            armies: JsonlReader::for_entity(&self.config, EntityType::Army).read_all()?,
            detachments: JsonlReader::for_entity(&self.config, EntityType::Detachment)
                .read_all()?,
            matches: JsonlReader::for_entity(&self.config, EntityType::Match).read_all()?,
        })
    }

    /// Stage every changed file before publishing any of them.
    ///
    /// Files whose contents already match the snapshot are left alone, so a
    /// write that only touches matches renames a single file. Publishing two
    /// or more files is still a sequence of renames: a crash between them
    /// leaves the earlier files new and the later ones old.
    fn commit(&self, snapshot: &LedgerSnapshot) -> Result<(), StorageError> {
        let current = self.load()?;

        let mut results = Vec::with_capacity(3);
        if current.armies != snapshot.armies {
            results.push(
                JsonlWriter::for_entity(&self.config, EntityType::Army).stage(&snapshot.armies),
            );
        }
        if current.detachments != snapshot.detachments {
            results.push(
                JsonlWriter::for_entity(&self.config, EntityType::Detachment)
                    .stage(&snapshot.detachments),
            );
        }
        if current.matches != snapshot.matches {
            results.push(
                JsonlWriter::for_entity(&self.config, EntityType::Match).stage(&snapshot.matches),
            );
        }

        let mut staged = Vec::with_capacity(results.len());
        let mut failure = None;
        for result in results {
            match result {
                Ok(file) => staged.push(file),
                Err(e) => failure = failure.or(Some(e)),
            }
        }

        if let Some(e) = failure {
            staged.into_iter().for_each(StagedFile::discard);
            return Err(e);
        }

        debug!("Publishing {} changed file(s)", staged.len());
        for file in staged {
            file.publish()?;
        }
        Ok(())
    }
}
