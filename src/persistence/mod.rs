//! Progression save/load
//!
//! The simulation never touches storage. Hosts load a [`Progression`] once
//! at startup, hand it to the run, and save it back whenever the run emits a
//! save request (achievement unlock or run end).
//!
//! Failures never reach the simulation:
//! - a failed load falls back to an empty progression
//! - a failed save is logged and ignored

pub mod achievement;
pub mod progression;

pub use achievement::{Achievement, AchievementState};
pub use progression::Progression;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Persistence failure
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("save data is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere a progression record can be kept
pub trait ProgressionStore {
    fn load(&self) -> Result<Progression, PersistError>;
    fn save(&self, progression: &Progression) -> Result<(), PersistError>;

    /// Load, falling back to defaults on any failure
    fn load_or_default(&self) -> Progression {
        match self.load() {
            Ok(progression) => progression,
            Err(err) => {
                log::warn!("Load error, starting fresh: {err}");
                Progression::default()
            }
        }
    }

    /// Save, logging (and otherwise ignoring) any failure
    fn save_or_log(&self, progression: &Progression) {
        if let Err(err) = self.save(progression) {
            log::error!("Save error: {err}");
        }
    }
}

/// JSON file on local disk
#[derive(Debug, Clone)]
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
}

impl ProgressionStore for JsonFileStore {
    fn load(&self) -> Result<Progression, PersistError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!("No save found at {}, starting fresh", self.path.display());
                return Ok(Progression::default());
            }
            Err(err) => return Err(err.into()),
        };
        let progression: Progression = serde_json::from_str(&json)?;
        log::info!(
            "Loaded progression ({} lifetime kills, high score {})",
            progression.total_enemies_killed,
            progression.high_score
        );
        Ok(progression)
    }

    fn save(&self, progression: &Progression) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(progression)?;
        // The previous save stays intact until the rename
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        log::debug!("Progression saved to {}", self.path.display());
        Ok(())
    }
}
