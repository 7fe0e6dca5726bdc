// Weekly progress aggregation.
//
// Purpose
// - Sum the hours a user logged in one category since the week began.
//
// Responsibilities
// - Stay pure over the entries handed in; routes fetch the window and pass a
//   timezone-aware "now" so tests can pin the clock.

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Utc};

use crate::modules::entries::model::Entry;

pub const MS_PER_HOUR: f64 = 3_600_000.0;

/// Most recent Monday at 00:00:00 in the timezone of `now`. On a Monday the
/// week starts that same day.
pub fn week_start<Tz: TimeZone>(now: DateTime<Tz>) -> DateTime<Tz> {
    let days_into_week = i64::from(now.weekday().num_days_from_monday());
    let monday = now.date_naive() - Duration::days(days_into_week);
    let midnight = monday.and_time(NaiveTime::MIN);
    let timezone = now.timezone();
    if let Some(start) = timezone.from_local_datetime(&midnight).earliest() {
        return start;
    }
    // A DST jump (or a calendar transition that skips whole days) can make
    // local midnight nonexistent; take the first hour that does exist.
    for hours in 1..=48 {
        let shifted = midnight + Duration::hours(hours);
        if let Some(start) = timezone.from_local_datetime(&shifted).earliest() {
            return start;
        }
    }
    now
}

/// Hours covered by `entries`, counting only time at or after `week_start`.
/// Entries that end before the week began contribute nothing.
pub fn logged_hours(entries: &[Entry], week_start: DateTime<Utc>) -> f64 {
    let mut total_ms: i64 = 0;
    for entry in entries {
        let counted_from = entry.start.max(week_start);
        let ms = (entry.end - counted_from).num_milliseconds();
        total_ms += ms.max(0);
    }
    total_ms as f64 / MS_PER_HOUR
}
