//! Persistence collaborator: the documents the engine reads and writes.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::sim::command::ActuatorCommands;

use super::documents::{
    ActuatorsDocument, BatteriesDocument, SensorDocument, Snapshot, StoredState, TimeDocument,
};

pub const TIME_FILE: &str = "time.json";
pub const CONCRETE_FILE: &str = "BETON.JSON";
pub const AIR_FILE: &str = "VAZDUH.JSON";
pub const BATTERIES_FILE: &str = "BATERIJE.JSON";
pub const ACTUATORS_FILE: &str = "AKTUATORI.JSON";

pub const ALL_FILES: [&str; 5] = [
    TIME_FILE,
    CONCRETE_FILE,
    AIR_FILE,
    BATTERIES_FILE,
    ACTUATORS_FILE,
];

/// Where the engine reads actuator commands and writes its state.
///
/// Command loading never fails: a missing or malformed command document
/// yields `ActuatorCommands::default()`.
pub trait StateStore {
    /// Commands for the coming step.
    fn load_commands(&self) -> ActuatorCommands;

    /// Previously written state, for resuming.
    fn load_state(&self) -> StoredState;

    /// Writes the engine-owned documents for one step.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if any document cannot be written.
    fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError>;

    /// Removes every document, including the command document.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a document exists but cannot be removed.
    fn clear(&mut self) -> Result<(), StoreError>;

    /// Writes `initial` for each missing document and an all-off command
    /// document if none exists. Existing documents are left alone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if a missing document cannot be written.
    fn create_initial(&mut self, initial: &Snapshot) -> Result<(), StoreError>;
}

/// Directory of pretty-printed JSON documents.
///
/// Every write goes to a temporary sibling first and is renamed into place,
/// so readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    /// `Ok(None)` when the file does not exist.
    pub fn read<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, StoreError> {
        let path = self.path(name);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StoreError::Json { path, source })
    }

    pub fn write<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path(name);
        let tmp = self.path(&format!(".{name}.tmp"));
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Json {
            path: path.clone(),
            source,
        })?;

        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io { path, source })
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path(name).is_file()
    }

    /// Reads a document for resuming, logging and discarding a bad one.
    fn read_soft<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.read(name).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable document");
            None
        })
    }

    fn write_if_missing<T: Serialize>(&self, name: &str, value: &T) -> Result<(), StoreError> {
        if self.exists(name) {
            return Ok(());
        }
        debug!(file = name, "creating initial document");
        self.write(name, value)
    }
}

impl StateStore for JsonStore {
    fn load_commands(&self) -> ActuatorCommands {
        match self.read::<ActuatorsDocument>(ACTUATORS_FILE) {
            Ok(Some(doc)) => doc.to_commands(),
            Ok(None) => ActuatorCommands::default(),
            Err(e) => {
                warn!(error = %e, "malformed command document, using defaults");
                ActuatorCommands::default()
            }
        }
    }

    fn load_state(&self) -> StoredState {
        StoredState {
            time: self.read_soft(TIME_FILE),
            concrete: self.read_soft(CONCRETE_FILE),
            air: self.read_soft(AIR_FILE),
            batteries: self.read_soft(BATTERIES_FILE),
        }
    }

    fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.write(TIME_FILE, &snapshot.time)?;
        self.write(CONCRETE_FILE, &snapshot.concrete)?;
        self.write(AIR_FILE, &snapshot.air)?;
        self.write(BATTERIES_FILE, &snapshot.batteries)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        for name in ALL_FILES {
            let path = self.path(name);
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(StoreError::Io { path, source }),
            }
        }
        Ok(())
    }

    fn create_initial(&mut self, initial: &Snapshot) -> Result<(), StoreError> {
        self.write_if_missing(TIME_FILE, &initial.time)?;
        self.write_if_missing(CONCRETE_FILE, &initial.concrete)?;
        self.write_if_missing(AIR_FILE, &initial.air)?;
        self.write_if_missing(BATTERIES_FILE, &initial.batteries)?;
        self.write_if_missing(ACTUATORS_FILE, &ActuatorsDocument::default())
    }
}

/// In-memory store for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub commands: Option<ActuatorsDocument>,
    pub time: Option<TimeDocument>,
    pub concrete: Option<SensorDocument>,
    pub air: Option<SensorDocument>,
    pub batteries: Option<BatteriesDocument>,
    /// Number of successful `save_snapshot` calls.
    pub saves: usize,
    /// When set, every write fails with an I/O error.
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_commands(&mut self, commands: ActuatorsDocument) {
        self.commands = Some(commands);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::Io {
                path: PathBuf::from("<memory>"),
                source: std::io::Error::other("writes disabled"),
            });
        }
        Ok(())
    }
}

impl StateStore for MemoryStore {
    fn load_commands(&self) -> ActuatorCommands {
        self.commands
            .as_ref()
            .map(ActuatorsDocument::to_commands)
            .unwrap_or_default()
    }

    fn load_state(&self) -> StoredState {
        StoredState {
            time: self.time.clone(),
            concrete: self.concrete,
            air: self.air,
            batteries: self.batteries,
        }
    }

    fn save_snapshot(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        self.check_writable()?;
        self.time = Some(snapshot.time.clone());
        self.concrete = Some(snapshot.concrete);
        self.air = Some(snapshot.air);
        self.batteries = Some(snapshot.batteries);
        self.saves += 1;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.check_writable()?;
        self.commands = None;
        self.time = None;
        self.concrete = None;
        self.air = None;
        self.batteries = None;
        Ok(())
    }

    fn create_initial(&mut self, initial: &Snapshot) -> Result<(), StoreError> {
        self.check_writable()?;
        self.time.get_or_insert_with(|| initial.time.clone());
        self.concrete.get_or_insert(initial.concrete);
        self.air.get_or_insert(initial.air);
        self.batteries.get_or_insert(initial.batteries);
        self.commands.get_or_insert_with(ActuatorsDocument::default);
        Ok(())
    }
}
