#![forbid(unsafe_code)]

//! Core domain model and business logic for the MediPal adherence tracker.
//!
//! This crate provides:
//! - Domain types (medicines, dose logs, weekly snack plans)
//! - Schedule matching shared by every adherence view
//! - The adherence evaluator (mascot mood and streak)
//! - Calendar day-status classification
//! - Tip and snack-plan generation with local fallbacks
//! - Persistence (state file, dose log WAL)

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod schedule;
pub mod adherence;
pub mod calendar;
pub mod mascot;
pub mod tips;
pub mod wal;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use adherence::{evaluate, Evaluation, Mood};
pub use calendar::{day_status, month_grid, week_history, DayStatus};
pub use store::{FileStore, Store};
pub use tips::{daily_tip, weekly_food_plan, CommandGenerator, TextGenerator};
