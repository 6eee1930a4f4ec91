// Activity time accounting
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

const MINUTES_PER_HOUR: u32 = 60;

/// Elapsed time between two clock times of an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActivityTime {
    pub minutes: u32,
    /// End time falls on the day after the start time
    pub crosses_midnight: bool,
}

/// Parse a 24h clock time (`HH:MM`, optionally `HH:MM:SS`).
///
/// Empty or malformed input yields `None`, which callers treat as "unset".
pub fn parse_clock(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}

/// Minutes elapsed from `start` to `end`, both same-day clock times.
///
/// An end time earlier than the start time is read as falling on the next
/// day. Equal times give zero, never a full day. Unset or malformed times
/// give zero.
pub fn elapsed(start: &str, end: &str) -> ActivityTime {
    let (Some(start), Some(end)) = (parse_clock(start), parse_clock(end)) else {
        return ActivityTime::default();
    };

    elapsed_between(start, end)
}

/// Same as [`elapsed`] for already-parsed times
pub fn elapsed_between(start: NaiveTime, end: NaiveTime) -> ActivityTime {
    let (start_at, end_at) = on_reference_day(reference_day(), start, end);
    let crosses_midnight = end < start;

    if end_at <= start_at {
        return ActivityTime::default();
    }

    let minutes = (end_at - start_at).num_minutes();
    ActivityTime {
        minutes: u32::try_from(minutes).unwrap_or(0),
        crosses_midnight,
    }
}

/// Place a start/end clock pair on `day`, moving the end to the next day
/// when it is earlier than the start.
pub fn on_reference_day(
    day: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (NaiveDateTime, NaiveDateTime) {
    let start_at = day.and_time(start);
    let mut end_at = day.and_time(end);
    if end < start {
        end_at += Duration::days(1);
    }
    (start_at, end_at)
}

fn reference_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

/// Format a minute total as `"2h 05m"` / `"45m"`
pub fn format_minutes(minutes: u32) -> String {
    let hours = minutes / MINUTES_PER_HOUR;
    let mins = minutes % MINUTES_PER_HOUR;

    if hours > 0 {
        format!("{}h {:02}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}
