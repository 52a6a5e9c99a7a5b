//! Per-date adherence classification for the history views.
//!
//! Uses the same matching rules as the evaluator (see [`crate::schedule`]),
//! so a day shown as missed here is a day the mascot counts against you.

use crate::schedule::{all_taken, logs_on, oldest_creation_date, required_medicines};
use crate::{DoseLog, DoseStatus, Error, Medicine, Result};
use chrono::{DateTime, Datelike, Days, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Number of days shown in the weekly history strip
pub const WEEK_HISTORY_DAYS: u64 = 7;

/// Display status of a single calendar date
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// No medicine is scheduled on this weekday
    None,
    Taken,
    /// Everything taken, at least one dose logged late
    Late,
    Missed,
    /// Today (or later) and not everything is taken yet
    Pending,
}

impl DayStatus {
    pub fn symbol(self) -> &'static str {
        match self {
            DayStatus::None => "-",
            DayStatus::Taken => "✓",
            DayStatus::Late => "◷",
            DayStatus::Missed => "✗",
            DayStatus::Pending => "·",
        }
    }
}

/// A calendar date with its status
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCell {
    pub date: NaiveDate,
    pub status: DayStatus,
}

/// Classify one date relative to `now`
///
/// Dates before the oldest medicine was created are `None`, matching the
/// evaluator, which never scans past that date.
pub fn day_status<Tz: TimeZone>(
    medicines: &[Medicine],
    logs: &[DoseLog],
    date: NaiveDate,
    now: &DateTime<Tz>,
) -> DayStatus {
    let tz = now.timezone();
    match oldest_creation_date(medicines, &tz) {
        Some(oldest) if date >= oldest => {}
        _ => return DayStatus::None,
    }

    let required = required_medicines(medicines, date);
    if required.is_empty() {
        return DayStatus::None;
    }

    if all_taken(&required, logs, date, &tz) {
        let any_late = logs_on(logs, date, &tz)
            .iter()
            .any(|log| log.status == DoseStatus::Late);
        return if any_late {
            DayStatus::Late
        } else {
            DayStatus::Taken
        };
    }

    if date >= now.date_naive() {
        DayStatus::Pending
    } else {
        DayStatus::Missed
    }
}

/// The last seven dates ending today, oldest first
pub fn week_history<Tz: TimeZone>(
    medicines: &[Medicine],
    logs: &[DoseLog],
    now: &DateTime<Tz>,
) -> Vec<DayCell> {
    let today = now.date_naive();
    (0..WEEK_HISTORY_DAYS)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(offset)))
        .map(|date| DayCell {
            date,
            status: day_status(medicines, logs, date, now),
        })
        .collect()
}

/// Sunday-first month grid: blank leading cells, then every day of the month
pub fn month_grid<Tz: TimeZone>(
    medicines: &[Medicine],
    logs: &[DoseLog],
    year: i32,
    month: u32,
    now: &DateTime<Tz>,
) -> Result<Vec<Option<DayCell>>> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::Calendar(format!("invalid month {}-{:02}", year, month)))?;

    let leading = first.weekday().num_days_from_sunday() as usize;
    let mut cells: Vec<Option<DayCell>> = vec![None; leading];

    let mut date = first;
    while date.month() == month {
        cells.push(Some(DayCell {
            date,
            status: day_status(medicines, logs, date, now),
        }));
        date = match date.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    tracing::debug!("Built {}-{:02} grid with {} cells", year, month, cells.len());
    Ok(cells)
}
