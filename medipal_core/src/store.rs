//! Row store for medicines, dose logs and the weekly snack plan.
//!
//! [`Store`] is the create/read/update/delete boundary the rest of the app
//! talks to. [`FileStore`] keeps everything under a local data directory:
//! - `state.json`: medicines and the weekly plan
//! - `wal/dose_logs.wal`: dose logs, one JSON object per line

use crate::state::AppState;
use crate::wal::{self, JsonlSink, LogSink};
use crate::{DoseLog, Error, Medicine, Result, WeeklyPlan};
use std::path::PathBuf;
use uuid::Uuid;

/// Persistent storage for adherence data
pub trait Store {
    fn medicines(&self) -> Result<Vec<Medicine>>;

    /// Insert or replace a medicine by id
    fn save_medicine(&mut self, medicine: &Medicine) -> Result<()>;

    /// Delete a medicine and all of its logs; returns false if it didn't exist
    fn delete_medicine(&mut self, id: Uuid) -> Result<bool>;

    fn logs(&self) -> Result<Vec<DoseLog>>;

    fn save_log(&mut self, log: &DoseLog) -> Result<()>;

    fn weekly_plan(&self) -> Result<Option<WeeklyPlan>>;

    /// Replace the current weekly plan
    fn save_weekly_plan(&mut self, plan: &WeeklyPlan) -> Result<()>;

    /// Set the checked flag of the plan entry for `day` (case-insensitive)
    fn toggle_plan_item(&mut self, day: &str, checked: bool) -> Result<()>;
}

/// File-backed store rooted at a data directory
#[derive(Clone, Debug)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join("wal").join("dose_logs.wal")
    }
}

impl Store for FileStore {
    fn medicines(&self) -> Result<Vec<Medicine>> {
        Ok(AppState::load(&self.state_path())?.medicines)
    }

    fn save_medicine(&mut self, medicine: &Medicine) -> Result<()> {
        AppState::update(&self.state_path(), |state| {
            match state.medicines.iter_mut().find(|m| m.id == medicine.id) {
                Some(existing) => *existing = medicine.clone(),
                None => state.medicines.push(medicine.clone()),
            }
            Ok(())
        })?;
        tracing::info!("Saved medicine {} ({})", medicine.name, medicine.id);
        Ok(())
    }

    fn delete_medicine(&mut self, id: Uuid) -> Result<bool> {
        let removed = AppState::update(&self.state_path(), |state| {
            let before = state.medicines.len();
            state.medicines.retain(|m| m.id != id);
            Ok(state.medicines.len() != before)
        })?;

        if !removed {
            tracing::debug!("No medicine {} to delete", id);
            return Ok(false);
        }

        let dropped = wal::retain_logs(&self.wal_path(), |log| log.medicine_id != id)?;

        tracing::info!("Deleted medicine {} and {} dose logs", id, dropped);
        Ok(true)
    }

    fn logs(&self) -> Result<Vec<DoseLog>> {
        wal::read_logs(&self.wal_path())
    }

    fn save_log(&mut self, log: &DoseLog) -> Result<()> {
        JsonlSink::new(self.wal_path()).append(log)
    }

    fn weekly_plan(&self) -> Result<Option<WeeklyPlan>> {
        Ok(AppState::load(&self.state_path())?.weekly_plan)
    }

    fn save_weekly_plan(&mut self, plan: &WeeklyPlan) -> Result<()> {
        AppState::update(&self.state_path(), |state| {
            state.weekly_plan = Some(plan.clone());
            Ok(())
        })
    }

    fn toggle_plan_item(&mut self, day: &str, checked: bool) -> Result<()> {
        AppState::update(&self.state_path(), |state| {
            let entry = state
                .weekly_plan
                .as_mut()
                .and_then(|plan| {
                    plan.entries
                        .iter_mut()
                        .find(|e| e.day.eq_ignore_ascii_case(day.trim()))
                })
                .ok_or_else(|| Error::NotFound(format!("no plan entry for '{}'", day)))?;
            entry.checked = checked;
            Ok(())
        })
    }
}
