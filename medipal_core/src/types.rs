//! Core domain types for the MediPal system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medicines and their schedules (time of day, weekday set)
//! - Dose log entries
//! - Weekly snack plans

use crate::{Error, Result};
use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Schedule Types
// ============================================================================

/// Set of weekdays a medicine is required on, encoded 0 (Sunday) to 6 (Saturday)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(BTreeSet<u8>);

impl WeekdaySet {
    /// Every day of the week
    pub fn every_day() -> Self {
        Self((0..7).collect())
    }

    /// Build from raw day numbers, rejecting anything outside 0-6
    pub fn from_days(days: impl IntoIterator<Item = u8>) -> Result<Self> {
        let mut set = BTreeSet::new();
        for day in days {
            if day > 6 {
                return Err(Error::InvalidSchedule(format!(
                    "weekday {} out of range 0-6",
                    day
                )));
            }
            set.insert(day);
        }
        Ok(Self(set))
    }

    /// Whether the given chrono weekday is part of the set
    pub fn contains(&self, weekday: Weekday) -> bool {
        self.0.contains(&(weekday.num_days_from_sunday() as u8))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.0.iter().copied()
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = Error;

    fn try_from(days: Vec<u8>) -> Result<Self> {
        Self::from_days(days)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.0.into_iter().collect()
    }
}

/// Parses `"daily"` or a comma-separated day list such as `"1,3,5"`
impl FromStr for WeekdaySet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("daily") {
            return Ok(Self::every_day());
        }

        let mut days = Vec::new();
        for part in trimmed.split(',') {
            let day = part.trim().parse::<u8>().map_err(|_| {
                Error::InvalidSchedule(format!("'{}' is not a weekday number", part.trim()))
            })?;
            days.push(day);
        }
        Self::from_days(days)
    }
}

/// Scheduled time of day, written as `"HH:MM"`
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(try_from = "String", into = "String")]
pub struct DoseTime {
    hour: u32,
    minute: u32,
}

impl DoseTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(Error::InvalidSchedule(format!(
                "time {:02}:{:02} out of range",
                hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Range checked at construction
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl FromStr for DoseTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (h, m) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| Error::InvalidSchedule(format!("'{}' is not HH:MM", s)))?;
        let hour = h
            .parse::<u32>()
            .map_err(|_| Error::InvalidSchedule(format!("'{}' is not HH:MM", s)))?;
        let minute = m
            .parse::<u32>()
            .map_err(|_| Error::InvalidSchedule(format!("'{}' is not HH:MM", s)))?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for DoseTime {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DoseTime> for String {
    fn from(t: DoseTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for DoseTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

// ============================================================================
// Medicine and Log Types
// ============================================================================

/// A registered medicine with its schedule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: Uuid,
    pub name: String,
    pub reason: String,
    pub time: DoseTime,
    pub days_of_week: WeekdaySet,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Medicine {
    /// Create a medicine with a fresh id, validating the user-entered fields
    pub fn new(
        name: impl Into<String>,
        reason: impl Into<String>,
        time: DoseTime,
        days_of_week: WeekdaySet,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::InvalidSchedule("medicine name is empty".into()));
        }
        if days_of_week.is_empty() {
            return Err(Error::InvalidSchedule(format!(
                "medicine '{}' has no weekdays",
                name
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            reason: reason.into(),
            time,
            days_of_week,
            created_at,
        })
    }
}

/// How a dose was recorded
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Taken,
    Skipped,
    Late,
}

/// A single recorded dose
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DoseLog {
    pub id: Uuid,
    pub medicine_id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub taken_at: DateTime<Utc>,
    pub status: DoseStatus,
}

impl DoseLog {
    pub fn new(medicine_id: Uuid, taken_at: DateTime<Utc>, status: DoseStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            medicine_id,
            taken_at,
            status,
        }
    }
}

// ============================================================================
// Snack Plan Types
// ============================================================================

/// One day of a generated snack plan, as returned by the generator
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoodPlanItem {
    pub day: String,
    pub food: String,
}

/// A persisted plan row with its check-off state
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub day: String,
    pub food: String,
    #[serde(default)]
    pub checked: bool,
}

/// The current weekly snack plan
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WeeklyPlan {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<PlanEntry>,
}

impl WeeklyPlan {
    /// Build a fresh plan with nothing checked off
    pub fn from_items(items: Vec<FoodPlanItem>, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            entries: items
                .into_iter()
                .map(|item| PlanEntry {
                    day: item.day,
                    food: item.food,
                    checked: false,
                })
                .collect(),
        }
    }
}
