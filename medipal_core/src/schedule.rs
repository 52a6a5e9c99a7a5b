//! Day-matching rules shared by the adherence evaluator and the calendar.
//!
//! Every "is this medicine due / was it taken on this date" question goes
//! through these functions so the mood and the history views agree.

use crate::{DoseLog, Medicine};
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Normalize an instant to its calendar date in the given timezone
pub fn local_date<Tz: TimeZone>(instant: &DateTime<Utc>, tz: &Tz) -> NaiveDate {
    instant.with_timezone(tz).date_naive()
}

/// Medicines whose weekday set contains the date's weekday
pub fn required_medicines<'a>(medicines: &'a [Medicine], date: NaiveDate) -> Vec<&'a Medicine> {
    let weekday = date.weekday();
    medicines
        .iter()
        .filter(|m| m.days_of_week.contains(weekday))
        .collect()
}

/// Whether every required medicine has at least one log on `date`
///
/// Any status counts, including `late` and `skipped`.
pub fn all_taken<Tz: TimeZone>(
    required: &[&Medicine],
    logs: &[DoseLog],
    date: NaiveDate,
    tz: &Tz,
) -> bool {
    required.iter().all(|med| {
        logs.iter()
            .any(|log| log.medicine_id == med.id && local_date(&log.taken_at, tz) == date)
    })
}

/// Logs recorded on `date`, oldest first
pub fn logs_on<'a, Tz: TimeZone>(
    logs: &'a [DoseLog],
    date: NaiveDate,
    tz: &Tz,
) -> Vec<&'a DoseLog> {
    let mut day_logs: Vec<_> = logs
        .iter()
        .filter(|log| local_date(&log.taken_at, tz) == date)
        .collect();
    day_logs.sort_by_key(|log| log.taken_at);
    day_logs
}

/// Date the oldest medicine was created, if there are any medicines
pub fn oldest_creation_date<Tz: TimeZone>(medicines: &[Medicine], tz: &Tz) -> Option<NaiveDate> {
    medicines
        .iter()
        .map(|m| m.created_at)
        .min()
        .map(|created| local_date(&created, tz))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DoseStatus, WeekdaySet};
    use chrono::FixedOffset;

    fn med(days: &str) -> Medicine {
        Medicine::new(
            "Test",
            "",
            "08:00".parse().unwrap(),
            days.parse::<WeekdaySet>().unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_required_medicines_by_weekday() {
        let meds = vec![med("1"), med("daily")];
        // 2024-03-04 is a Monday, 2024-03-05 a Tuesday
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(required_medicines(&meds, monday).len(), 2);
        assert_eq!(required_medicines(&meds, tuesday).len(), 1);
    }

    #[test]
    fn test_local_date_respects_timezone() {
        let instant = Utc.with_ymd_and_hms(2024, 3, 4, 23, 30, 0).unwrap();
        let brt = FixedOffset::west_opt(3 * 3600).unwrap();
        let jst = FixedOffset::east_opt(9 * 3600).unwrap();

        assert_eq!(local_date(&instant, &brt), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
        assert_eq!(local_date(&instant, &jst), NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
    }

    #[test]
    fn test_all_taken_needs_every_medicine() {
        let a = med("daily");
        let b = med("daily");
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let meds = vec![a.clone(), b.clone()];
        let required = required_medicines(&meds, date);

        let one = vec![DoseLog::new(a.id, at, DoseStatus::Taken)];
        assert!(!all_taken(&required, &one, date, &Utc));

        let both = vec![
            DoseLog::new(a.id, at, DoseStatus::Taken),
            DoseLog::new(b.id, at, DoseStatus::Late),
        ];
        assert!(all_taken(&required, &both, date, &Utc));

        let next_day = date.succ_opt().unwrap();
        assert!(!all_taken(&required, &both, next_day, &Utc));
    }

    #[test]
    fn test_logs_on_sorted() {
        let a = med("daily");
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let late = DoseLog::new(a.id, Utc.with_ymd_and_hms(2024, 3, 4, 20, 0, 0).unwrap(), DoseStatus::Taken);
        let early = DoseLog::new(a.id, Utc.with_ymd_and_hms(2024, 3, 4, 7, 0, 0).unwrap(), DoseStatus::Taken);
        let other = DoseLog::new(a.id, Utc.with_ymd_and_hms(2024, 3, 5, 7, 0, 0).unwrap(), DoseStatus::Taken);
        let logs = vec![late.clone(), other, early.clone()];

        let found = logs_on(&logs, date, &Utc);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].id, early.id);
        assert_eq!(found[1].id, late.id);
    }
}
