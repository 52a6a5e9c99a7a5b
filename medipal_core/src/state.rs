//! Medicine and snack-plan state persistence with file locking.
//!
//! This module handles saving and loading the app state file
//! with proper file locking to prevent concurrent access issues.

use crate::{Error, Medicine, Result, WeeklyPlan};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Everything except dose logs, stored as a single JSON document
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct AppState {
    #[serde(default)]
    pub medicines: Vec<Medicine>,
    #[serde(default)]
    pub weekly_plan: Option<WeeklyPlan>,
}

impl AppState {
    /// Load state from a file with shared locking
    ///
    /// Returns default state if file doesn't exist.
    /// If file is corrupted, logs a warning and returns default state.
    pub fn load(path: &Path) -> Result<Self> {
        match Self::read_strict(path) {
            Ok(state) => Ok(state),
            Err(e) => {
                tracing::warn!("Unable to load state file {:?}: {}. Using defaults.", path, e);
                Ok(Self::default())
            }
        }
    }

    /// Load state, failing on anything but a missing file
    fn read_strict(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No state file found, using default state");
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
        file.unlock()?;
        read?;

        let state = serde_json::from_str::<AppState>(&contents)?;
        tracing::debug!("Loaded {} medicines from {:?}", state.medicines.len(), path);
        Ok(state)
    }

    /// Save state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::State(format!("state path {:?} has no parent", path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string_pretty(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved state to {:?}", path);
        Ok(())
    }

    /// Load state, modify it, and save it back
    ///
    /// Unlike [`AppState::load`], an unreadable state file is an error here
    /// and the file is left as it is.
    pub fn update<F, T>(path: &Path, f: F) -> Result<T>
    where
        F: FnOnce(&mut AppState) -> Result<T>,
    {
        let mut state = Self::read_strict(path).map_err(|e| {
            Error::State(format!(
                "state file {:?} is unreadable ({}); fix or move it before making changes",
                path, e
            ))
        })?;
        let out = f(&mut state)?;
        state.save(path)?;
        Ok(out)
    }
}
