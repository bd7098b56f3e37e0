use std::fs;
use std::io;
use std::path::PathBuf;

use engine_logging::{engine_debug, engine_info, engine_warn};
use wikidump_core::CheckpointState;

use crate::config::Clock;
use crate::persist::{AtomicFileWriter, PersistError};

/// File name of the run state inside the logs directory.
pub const STATE_FILE_NAME: &str = ".conversion_state.json";

/// Durable storage for the run checkpoint.
pub trait CheckpointStore: Send {
    /// Returns the stored state, or `None` when there is nothing usable.
    fn load(&self) -> Option<CheckpointState>;
    fn save(&self, state: &CheckpointState) -> Result<(), PersistError>;
}

/// Keeps the checkpoint as a small JSON document, replaced atomically on
/// every save.
pub struct JsonCheckpointStore {
    writer: AtomicFileWriter,
}

impl JsonCheckpointStore {
    pub fn new(logs_dir: impl Into<PathBuf>) -> Self {
        Self {
            writer: AtomicFileWriter::new(logs_dir.into()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.writer.dir().join(STATE_FILE_NAME)
    }
}

impl CheckpointStore for JsonCheckpointStore {
    fn load(&self) -> Option<CheckpointState> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                engine_debug!("No checkpoint at {}", path.display());
                return None;
            }
            Err(err) => {
                engine_warn!("Failed to read checkpoint {}: {}", path.display(), err);
                return None;
            }
        };
        if content.trim().is_empty() {
            engine_debug!("Checkpoint {} is empty", path.display());
            return None;
        }
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(err) => {
                engine_warn!("Ignoring corrupt checkpoint {}: {}", path.display(), err);
                None
            }
        }
    }

    fn save(&self, state: &CheckpointState) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(state)?;
        self.writer.write(STATE_FILE_NAME, &json)?;
        Ok(())
    }
}

/// Sole writer of the checkpoint during a run.
pub struct CheckpointManager {
    store: Box<dyn CheckpointStore>,
    clock: Clock,
}

impl CheckpointManager {
    pub fn new(store: Box<dyn CheckpointStore>, clock: Clock) -> Self {
        Self { store, clock }
    }

    /// State to start the run from. A stored checkpoint wins over
    /// `resume_from`; a terminated one is re-opened.
    pub fn load(&self, resume_from: u64) -> CheckpointState {
        match self.store.load() {
            Some(state) => {
                engine_info!(
                    "Resuming at position {} ({} converted, {} failed, last saved {})",
                    state.position,
                    state.success_count,
                    state.failure_count,
                    state.last_updated
                );
                state.resumed()
            }
            None => {
                if resume_from > 0 {
                    engine_info!("No checkpoint found; starting at position {}", resume_from);
                }
                CheckpointState::starting_at(resume_from)
            }
        }
    }

    /// Stamps `last_updated` and writes the state through.
    pub fn save(&self, state: &mut CheckpointState) -> Result<(), PersistError> {
        state.last_updated = (self.clock)();
        self.store.save(state)
    }
}
