// libs/scheduling-cell/src/services/availability.rs
//
// Pure slot-grid calculator. Given resolved preferences and a reference
// instant it produces the bookable grid; it performs no I/O and never fails.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc};

use crate::models::{DayOfWeek, ResolvedPreferences, SLOT_MINUTES};

/// Candidate slots for one calendar day, times in chronological order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub times: Vec<NaiveTime>,
}

/// Compute the bookable grid over `horizon_days` calendar days starting at
/// the reference instant's date. Days whose weekday tag is not preferred are
/// skipped; for the current day, start times at or before the reference
/// instant are suppressed. Days left with zero times are omitted entirely.
pub fn compute_slots(
    prefs: &ResolvedPreferences,
    reference: DateTime<Utc>,
    horizon_days: u32,
) -> Vec<DayAvailability> {
    let today = reference.date_naive();
    let mut days = Vec::new();

    for offset in 0..horizon_days {
        let date = today + Duration::days(offset as i64);
        if !prefs.days.contains(&DayOfWeek::from_weekday(date.weekday())) {
            continue;
        }

        let cutoff = if offset == 0 { Some(reference.time()) } else { None };
        let times = day_grid(prefs, cutoff);
        if !times.is_empty() {
            days.push(DayAvailability { date, times });
        }
    }

    days
}

/// Whether (date, time) lies on this doctor's bookable grid: preferred
/// weekday, within hours, and aligned to the slot granularity. Past-time
/// suppression is the caller's concern.
pub fn slot_on_grid(prefs: &ResolvedPreferences, date: NaiveDate, time: NaiveTime) -> bool {
    if !prefs.days.contains(&DayOfWeek::from_weekday(date.weekday())) {
        return false;
    }
    let start = minutes_of_day(prefs.start);
    let end = minutes_of_day(prefs.end);
    let candidate = minutes_of_day(time);
    candidate >= start && candidate < end && (candidate - start) % SLOT_MINUTES == 0
}

fn day_grid(prefs: &ResolvedPreferences, cutoff: Option<NaiveTime>) -> Vec<NaiveTime> {
    let start = minutes_of_day(prefs.start);
    let end = minutes_of_day(prefs.end);

    let mut times = Vec::new();
    let mut minute = start;
    // start >= end yields an empty day by construction
    while minute < end {
        if let Some(time) = time_from_minutes(minute) {
            if cutoff.map_or(true, |c| time > c) {
                times.push(time);
            }
        }
        minute += SLOT_MINUTES;
    }
    times
}

fn minutes_of_day(time: NaiveTime) -> u32 {
    time.num_seconds_from_midnight() / 60
}

fn time_from_minutes(minutes: u32) -> Option<NaiveTime> {
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SchedulePreferences;
    use chrono::TimeZone;

    fn prefs(days: Vec<DayOfWeek>, start: &str, end: &str) -> ResolvedPreferences {
        ResolvedPreferences {
            days: days.into_iter().collect(),
            start: NaiveTime::parse_from_str(start, "%H:%M").unwrap(),
            end: NaiveTime::parse_from_str(end, "%H:%M").unwrap(),
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_grid_respects_preferred_days_and_hours() {
        // 2026-08-31 is a Monday
        let prefs = prefs(vec![DayOfWeek::Mon, DayOfWeek::Wed], "09:00", "11:00");
        let days = compute_slots(&prefs, at(2026, 8, 30, 6, 0), 7);

        assert_eq!(days.len(), 2);
        for day in &days {
            assert!(matches!(
                DayOfWeek::from_weekday(day.date.weekday()),
                DayOfWeek::Mon | DayOfWeek::Wed
            ));
            let labels: Vec<String> =
                day.times.iter().map(|t| t.format("%H:%M").to_string()).collect();
            assert_eq!(labels, vec!["09:00", "09:30", "10:00", "10:30"]);
        }
    }

    #[test]
    fn test_today_suppresses_past_and_present_times() {
        let prefs = prefs(DayOfWeek::weekdays(), "09:00", "17:00");
        // Monday 10:15
        let reference = at(2026, 8, 31, 10, 15);
        let days = compute_slots(&prefs, reference, 1);

        assert_eq!(days.len(), 1);
        let first = days[0].times[0];
        assert_eq!(first.format("%H:%M").to_string(), "10:30");
    }

    #[test]
    fn test_exhausted_day_is_omitted_not_empty() {
        let prefs = prefs(DayOfWeek::weekdays(), "09:00", "10:00");
        // Monday 18:00, after the whole window
        let days = compute_slots(&prefs, at(2026, 8, 31, 18, 0), 1);
        assert!(days.is_empty());
    }

    #[test]
    fn test_inverted_hours_yield_zero_slots() {
        let prefs = prefs(DayOfWeek::weekdays(), "17:00", "09:00");
        let days = compute_slots(&prefs, at(2026, 8, 31, 6, 0), 7);
        assert!(days.is_empty());
    }

    #[test]
    fn test_resolve_falls_back_on_malformed_preferences() {
        let raw = SchedulePreferences {
            preferred_days: Some(vec![]),
            preferred_hours: Some(crate::models::PreferredHours {
                start: "9 o'clock".to_string(),
                end: "later".to_string(),
            }),
        };
        let resolved = raw.resolve();
        let weekdays: std::collections::HashSet<_> =
            DayOfWeek::weekdays().into_iter().collect();
        assert_eq!(resolved.days, weekdays);
        assert_eq!(resolved.start.format("%H:%M").to_string(), "09:00");
        assert_eq!(resolved.end.format("%H:%M").to_string(), "17:00");
    }

    #[test]
    fn test_slot_on_grid_alignment() {
        let prefs = prefs(vec![DayOfWeek::Mon], "09:00", "11:00");
        let monday = NaiveDate::from_ymd_opt(2026, 8, 31).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();

        assert!(slot_on_grid(&prefs, monday, t("09:30")));
        assert!(!slot_on_grid(&prefs, monday, t("09:45"))); // off-grid
        assert!(!slot_on_grid(&prefs, monday, t("11:00"))); // start >= end bound
        assert!(!slot_on_grid(&prefs, monday, t("08:30"))); // before hours
        assert!(!slot_on_grid(&prefs, tuesday, t("09:30"))); // wrong weekday
    }
}
