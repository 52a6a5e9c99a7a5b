//! Adherence evaluator: derives the mascot mood and the current streak.
//!
//! The evaluator walks backward from today over a 30-day window:
//! - Days with no required medicines are skipped
//! - Fully taken days extend the streak until the first incomplete day
//! - Incomplete past days count as misses until the first fully taken day
//! - Today alone never counts as a miss, but being more than an hour late
//!   on today's doses turns a happy mascot concerned

use crate::schedule::{all_taken, oldest_creation_date, required_medicines};
use crate::{DoseLog, Medicine};
use chrono::{DateTime, Days, Duration, TimeZone};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// How many days back the evaluator looks, today included
pub const SCAN_WINDOW_DAYS: u64 = 30;

/// How far past a scheduled time today's dose may slip before the mascot worries
pub fn late_threshold() -> Duration {
    Duration::minutes(60)
}

/// Mascot mood, ordered by severity
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Happy,
    Concerned,
    Sick,
    VerySick,
    Critical,
    Dead,
}

impl Mood {
    /// Severity ordinal, 0 (happy) through 5 (dead)
    pub fn severity(self) -> u8 {
        match self {
            Mood::Happy => 0,
            Mood::Concerned => 1,
            Mood::Sick => 2,
            Mood::VerySick => 3,
            Mood::Critical => 4,
            Mood::Dead => 5,
        }
    }

    /// Map a count of consecutive missed past days to a mood
    pub fn from_missed_days(missed: u32) -> Self {
        match missed {
            0 => Mood::Happy,
            1 => Mood::Concerned,
            2..=3 => Mood::Sick,
            4..=5 => Mood::VerySick,
            6 => Mood::Critical,
            _ => Mood::Dead,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Concerned => "concerned",
            Mood::Sick => "sick",
            Mood::VerySick => "very sick",
            Mood::Critical => "critical",
            Mood::Dead => "dead",
        }
    }
}

impl PartialOrd for Mood {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Mood {
    fn cmp(&self, other: &Self) -> Ordering {
        self.severity().cmp(&other.severity())
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one evaluation pass
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Evaluation {
    pub mood: Mood,
    /// Consecutive fully taken days ending today
    pub streak: u32,
    /// Consecutive missed past days ending yesterday
    pub missed_days: u32,
}

impl Evaluation {
    fn empty() -> Self {
        Self {
            mood: Mood::Happy,
            streak: 0,
            missed_days: 0,
        }
    }
}

/// Accumulator threaded through the backward scan.
///
/// Both flags only ever go from true to false.
#[derive(Clone, Copy, Debug)]
struct ScanState {
    streak: u32,
    missed: u32,
    counting_streak: bool,
    counting_misses: bool,
}

impl ScanState {
    fn start() -> Self {
        Self {
            streak: 0,
            missed: 0,
            counting_streak: true,
            counting_misses: true,
        }
    }

    fn step(self, offset: u64, taken: bool) -> Self {
        if taken {
            Self {
                streak: self.streak + u32::from(self.counting_streak),
                counting_misses: false,
                ..self
            }
        } else {
            let counts_as_miss = offset != 0 && self.counting_misses;
            Self {
                missed: self.missed + u32::from(counts_as_miss),
                counting_streak: false,
                ..self
            }
        }
    }
}

/// Evaluate mood and streak for a snapshot of medicines and logs at `now`.
///
/// Dates are taken in `now`'s timezone. Pure and deterministic: the same
/// snapshot and instant always give the same result.
pub fn evaluate<Tz: TimeZone>(
    medicines: &[Medicine],
    logs: &[DoseLog],
    now: &DateTime<Tz>,
) -> Evaluation {
    let tz = now.timezone();
    let oldest = match oldest_creation_date(medicines, &tz) {
        Some(date) => date,
        None => return Evaluation::empty(),
    };
    let today = now.date_naive();

    let state = (0..SCAN_WINDOW_DAYS)
        .map_while(|offset| today.checked_sub_days(Days::new(offset)).map(|d| (offset, d)))
        .take_while(|(_, date)| *date >= oldest)
        .fold(ScanState::start(), |state, (offset, date)| {
            let required = required_medicines(medicines, date);
            if required.is_empty() {
                return state;
            }
            state.step(offset, all_taken(&required, logs, date, &tz))
        });

    let mut mood = Mood::from_missed_days(state.missed);
    if mood == Mood::Happy && is_late_today(medicines, logs, now) {
        mood = Mood::Concerned;
    }

    tracing::debug!(
        streak = state.streak,
        missed = state.missed,
        ?mood,
        "Evaluated adherence"
    );

    Evaluation {
        mood,
        streak: state.streak,
        missed_days: state.missed,
    }
}

/// Whether any of today's still-outstanding doses is more than an hour overdue.
///
/// Returns false when nothing is due today or everything due is already logged.
pub fn is_late_today<Tz: TimeZone>(
    medicines: &[Medicine],
    logs: &[DoseLog],
    now: &DateTime<Tz>,
) -> bool {
    let tz = now.timezone();
    let today = now.date_naive();
    let todays = required_medicines(medicines, today);

    if todays.is_empty() || all_taken(&todays, logs, today, &tz) {
        return false;
    }

    let now_local = now.naive_local();
    todays.iter().any(|med| {
        let scheduled = today.and_time(med.time.to_naive_time());
        now_local - scheduled > late_threshold()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DoseStatus, WeekdaySet};
    use chrono::{FixedOffset, Utc};

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    fn med(time: &str, days: &str, created: DateTime<Utc>) -> Medicine {
        Medicine::new(
            "Test",
            "",
            time.parse().unwrap(),
            days.parse::<WeekdaySet>().unwrap(),
            created,
        )
        .unwrap()
    }

    fn taken(med: &Medicine, when: DateTime<Utc>) -> DoseLog {
        DoseLog::new(med.id, when, DoseStatus::Taken)
    }

    #[test]
    fn test_no_medicines_is_happy() {
        let logs = vec![DoseLog::new(uuid::Uuid::new_v4(), at(10, 8, 0), DoseStatus::Taken)];
        let result = evaluate(&[], &logs, &at(20, 12, 0));
        assert_eq!(result.mood, Mood::Happy);
        assert_eq!(result.streak, 0);
        assert_eq!(result.missed_days, 0);
    }

    #[test]
    fn test_mood_table() {
        let expected = [
            (0, Mood::Happy),
            (1, Mood::Concerned),
            (2, Mood::Sick),
            (3, Mood::Sick),
            (4, Mood::VerySick),
            (5, Mood::VerySick),
            (6, Mood::Critical),
            (7, Mood::Dead),
            (30, Mood::Dead),
        ];
        for (missed, mood) in expected {
            assert_eq!(Mood::from_missed_days(missed), mood, "missed = {}", missed);
        }
    }

    #[test]
    fn test_mood_monotonic_in_misses() {
        for m in 0..40 {
            assert!(Mood::from_missed_days(m) <= Mood::from_missed_days(m + 1));
        }
        assert!(Mood::Happy < Mood::Concerned);
        assert!(Mood::Critical < Mood::Dead);
    }

    #[test]
    fn test_taken_today_freezes_miss_count() {
        // Today is the 20th; taken 18th-20th, missed 15th-17th, taken 13th-14th.
        // The taken run starting today stops miss counting before the gap.
        let m = med("08:00", "daily", at(10, 7, 0));
        let mut logs: Vec<_> = [20, 19, 18, 14].iter().map(|d| taken(&m, at(*d, 8, 0))).collect();
        logs.push(taken(&m, at(13, 8, 0)));

        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.missed_days, 0);
        assert_eq!(result.streak, 3);
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_consecutive_misses_from_yesterday() {
        // Nothing logged today (not late yet), missed 17th-19th, taken 16th
        let m = med("23:00", "daily", at(10, 7, 0));
        let logs: Vec<_> = [16, 15, 14].iter().map(|d| taken(&m, at(*d, 8, 0))).collect();

        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.missed_days, 3);
        assert_eq!(result.mood, Mood::Sick);
        assert_eq!(result.streak, 0);
    }

    #[test]
    fn test_late_today_escalates_happy() {
        // Created today at 07:00, scheduled 08:00, now 09:30
        let m = med("08:00", "daily", at(20, 7, 0));
        let result = evaluate(&[m], &[], &at(20, 9, 30));
        assert_eq!(result.mood, Mood::Concerned);
        assert_eq!(result.streak, 0);
        assert_eq!(result.missed_days, 0);
    }

    #[test]
    fn test_exactly_one_hour_is_not_late() {
        let m = med("08:00", "daily", at(20, 7, 0));
        let result = evaluate(&[m], &[], &at(20, 9, 0));
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_late_check_skipped_once_taken() {
        let m = med("08:00", "daily", at(20, 7, 0));
        let logs = vec![taken(&m, at(20, 11, 0))];
        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.mood, Mood::Happy);
        assert_eq!(result.streak, 1);
    }

    #[test]
    fn test_late_check_never_changes_worse_moods() {
        // One missed past day and late today: stays concerned, not escalated further
        let m = med("08:00", "daily", at(18, 7, 0));
        let logs = vec![taken(&m, at(18, 8, 0))];
        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.missed_days, 1);
        assert_eq!(result.mood, Mood::Concerned);
    }

    #[test]
    fn test_weekly_medicine_miss_counts_once() {
        // 2024-03-20 is a Wednesday; Monday the 18th is the only required day
        let m = med("08:00", "1", at(1, 7, 0));
        let logs = vec![taken(&m, at(11, 8, 0))];

        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.missed_days, 1);
        assert_eq!(result.mood, Mood::Concerned);
        assert_eq!(result.streak, 0);
    }

    #[test]
    fn test_non_required_days_do_not_break_streak() {
        // Monday-only medicine taken on the last three Mondays
        let m = med("08:00", "1", at(1, 7, 0));
        let logs: Vec<_> = [18, 11, 4].iter().map(|d| taken(&m, at(*d, 8, 0))).collect();

        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.streak, 3);
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_seven_day_streak() {
        // Created 8 days before today, taken every day since then
        let m = med("08:00", "daily", at(12, 7, 0));
        let logs: Vec<_> = (14..=20).map(|d| taken(&m, at(d, 8, 0))).collect();

        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.streak, 7);
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_scan_stops_at_creation_date() {
        // Created yesterday, nothing ever logged: only yesterday can be missed
        let m = med("23:00", "daily", at(19, 20, 0));
        let result = evaluate(&[m], &[], &at(20, 12, 0));
        assert_eq!(result.missed_days, 1);
        assert_eq!(result.mood, Mood::Concerned);
    }

    #[test]
    fn test_scan_window_is_thirty_days() {
        // Created long ago, never taken: 29 past days fall inside the window
        let created = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
        let m = med("23:00", "daily", created);
        let result = evaluate(&[m], &[], &at(20, 12, 0));
        assert_eq!(result.missed_days, (SCAN_WINDOW_DAYS - 1) as u32);
        assert_eq!(result.mood, Mood::Dead);
    }

    #[test]
    fn test_late_dose_counts_as_taken() {
        let m = med("08:00", "daily", at(19, 7, 0));
        let logs = vec![
            DoseLog::new(m.id, at(19, 21, 0), DoseStatus::Late),
            DoseLog::new(m.id, at(20, 8, 0), DoseStatus::Taken),
        ];
        let result = evaluate(&[m], &logs, &at(20, 12, 0));
        assert_eq!(result.streak, 2);
        assert_eq!(result.missed_days, 0);
    }

    #[test]
    fn test_day_needs_every_required_medicine() {
        // Both due daily at 23:00; only A was taken on the 19th
        let a = med("23:00", "daily", at(15, 7, 0));
        let b = med("23:00", "daily", at(15, 7, 0));
        let mut logs = vec![
            taken(&a, at(18, 23, 0)),
            taken(&b, at(18, 23, 0)),
            taken(&a, at(19, 23, 0)),
        ];
        let meds = vec![a, b.clone()];
        let now = at(20, 12, 0);

        let result = evaluate(&meds, &logs, &now);
        assert_eq!(result.missed_days, 1);
        assert_eq!(result.streak, 0);
        assert_eq!(result.mood, Mood::Concerned);

        logs.push(taken(&b, at(19, 23, 30)));
        let result = evaluate(&meds, &logs, &now);
        assert_eq!(result.missed_days, 0);
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_skipped_dose_satisfies_day() {
        let a = med("08:00", "daily", at(18, 7, 0));
        let b = med("08:00", "daily", at(18, 7, 0));
        let logs = vec![
            taken(&a, at(19, 8, 0)),
            DoseLog::new(b.id, at(19, 8, 5), DoseStatus::Skipped),
            taken(&a, at(20, 8, 0)),
            DoseLog::new(b.id, at(20, 8, 0), DoseStatus::Skipped),
        ];

        let result = evaluate(&[a, b], &logs, &at(20, 12, 0));
        assert_eq!(result.streak, 2);
        assert_eq!(result.missed_days, 0);
        assert_eq!(result.mood, Mood::Happy);
    }

    #[test]
    fn test_dates_follow_now_timezone() {
        // 01:30 UTC on the 20th is still the 19th at UTC-3
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let m = med("08:00", "daily", at(15, 12, 0));
        let logs = vec![taken(&m, at(20, 1, 30))];
        let now = brt.with_ymd_and_hms(2024, 3, 19, 23, 0, 0).unwrap();

        let result = evaluate(&[m], &logs, &now);
        assert_eq!(result.streak, 1);
    }

    #[test]
    fn test_evaluate_is_idempotent() {
        let m = med("08:00", "daily", at(10, 7, 0));
        let logs: Vec<_> = [20, 17, 12].iter().map(|d| taken(&m, at(*d, 8, 0))).collect();
        let meds = vec![m];
        let now = at(20, 12, 0);
        assert_eq!(evaluate(&meds, &logs, &now), evaluate(&meds, &logs, &now));
    }
}
