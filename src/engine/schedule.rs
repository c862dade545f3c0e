//! Schedule string parsing.
//!
//! Course records carry their meeting pattern as a compact string such as
//! `"MWF 9:00-9:50 AM"` or `"TTh 2:00-3:50 PM"`. This module turns that
//! string into one [`MeetingInterval`] per meeting day, and
//! [`format_schedule`] builds the string back from picked days and times.
//!
//! # Grammar
//!
//! ```text
//! ^(TTh|[MTWRFSU]+) (\d{1,2}):(\d{2})-(\d{1,2}):(\d{2}) (AM|PM)$
//! ```
//!
//! `R` is Thursday and `U` is Sunday. The single trailing period applies to
//! both ends of the range, so a range can never cross noon or midnight.
//!
//! Anything that does not match (placeholder `"TBA"`, lowercase days, extra
//! whitespace) parses to an empty set. A course without intervals simply
//! never takes part in time or room conflicts.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static SCHEDULE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(TTh|[MTWRFSU]+) (\d{1,2}):(\d{2})-(\d{1,2}):(\d{2}) (AM|PM)$")
        .expect("schedule pattern is valid")
});

/// Minutes in a day; minute-of-day values stay below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A day of the week, Monday first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "Monday",
            Self::Tuesday => "Tuesday",
            Self::Wednesday => "Wednesday",
            Self::Thursday => "Thursday",
            Self::Friday => "Friday",
            Self::Saturday => "Saturday",
            Self::Sunday => "Sunday",
        }
    }

    /// Map a single schedule day letter.
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(Self::Monday),
            'T' => Some(Self::Tuesday),
            'W' => Some(Self::Wednesday),
            'R' => Some(Self::Thursday),
            'F' => Some(Self::Friday),
            'S' => Some(Self::Saturday),
            'U' => Some(Self::Sunday),
            _ => None,
        }
    }

    /// The schedule day letter, the inverse of [`Day::from_code`].
    pub fn code(&self) -> char {
        match self {
            Self::Monday => 'M',
            Self::Tuesday => 'T',
            Self::Wednesday => 'W',
            Self::Thursday => 'R',
            Self::Friday => 'F',
            Self::Saturday => 'S',
            Self::Sunday => 'U',
        }
    }

    pub fn is_weekday(&self) -> bool {
        !matches!(self, Self::Saturday | Self::Sunday)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One weekly meeting of a course: a day plus a half-open `[start, end)`
/// minute-of-day range.
///
/// Invariant: `start_minute < end_minute < MINUTES_PER_DAY`. Intervals are
/// only built by [`parse_schedule`] or [`MeetingInterval::new`], both of
/// which enforce it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct MeetingInterval {
    pub day: Day,
    pub start_minute: u16,
    pub end_minute: u16,
}

impl MeetingInterval {
    /// Returns `None` unless `start < end` and both fall inside one day.
    pub fn new(day: Day, start_minute: u16, end_minute: u16) -> Option<Self> {
        if start_minute < end_minute && end_minute < MINUTES_PER_DAY {
            Some(Self {
                day,
                start_minute,
                end_minute,
            })
        } else {
            None
        }
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end_minute - self.start_minute
    }

    /// Whether this interval covers the minute `t` of its day.
    #[inline]
    pub fn contains(&self, t: u16) -> bool {
        self.start_minute <= t && t < self.end_minute
    }
}

impl fmt::Display for MeetingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{}",
            self.day,
            format_clock(self.start_minute),
            format_clock(self.end_minute)
        )
    }
}

/// Parse a schedule string into meeting intervals.
///
/// Never fails: malformed input yields an empty vector.
pub fn parse_schedule(schedule: &str) -> Vec<MeetingInterval> {
    let Some(caps) = SCHEDULE_PATTERN.captures(schedule) else {
        return Vec::new();
    };

    let days = resolve_days(&caps[1]);
    let pm = &caps[6] == "PM";

    let (Some(start), Some(end)) = (
        to_minute_of_day(&caps[2], &caps[3], pm),
        to_minute_of_day(&caps[4], &caps[5], pm),
    ) else {
        return Vec::new();
    };

    days.into_iter()
        .filter_map(|day| MeetingInterval::new(day, start, end))
        .collect()
}

/// Resolve a day token. `TTh` is checked before splitting into letters.
fn resolve_days(token: &str) -> BTreeSet<Day> {
    if token == "TTh" {
        return BTreeSet::from([Day::Tuesday, Day::Thursday]);
    }
    token.chars().filter_map(Day::from_code).collect()
}

/// 12-hour clock to minute-of-day. `12 AM` is midnight, `12 PM` is noon.
fn to_minute_of_day(hour: &str, minute: &str, pm: bool) -> Option<u16> {
    let hour: u16 = hour.parse().ok()?;
    let minute: u16 = minute.parse().ok()?;
    if hour > 12 || minute > 59 {
        return None;
    }

    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    Some(hour * 60 + minute)
}

/// Build a schedule string from picked days and a minute-of-day range.
///
/// The inverse of [`parse_schedule`]: days are written Monday first, exactly
/// Tuesday plus Thursday becomes `TTh`, and one period marker closes the
/// range. Returns `None` when no day is picked, when `start >= end`, or when
/// the range crosses noon or midnight, since one marker cannot describe it.
pub fn format_schedule(days: &[Day], start_minute: u16, end_minute: u16) -> Option<String> {
    let days: BTreeSet<Day> = days.iter().copied().collect();
    if days.is_empty() || start_minute >= end_minute || end_minute >= MINUTES_PER_DAY {
        return None;
    }
    if start_minute / 720 != end_minute / 720 {
        return None;
    }

    let token: String = if days == BTreeSet::from([Day::Tuesday, Day::Thursday]) {
        "TTh".to_string()
    } else {
        days.iter().map(Day::code).collect()
    };

    Some(format!(
        "{} {}-{} {}",
        token,
        clock_digits(start_minute),
        clock_digits(end_minute),
        period(end_minute)
    ))
}

/// Render a minute-of-day as a 12-hour clock, e.g. `540` → `"9:00 AM"`.
pub fn format_clock(minute_of_day: u16) -> String {
    format!("{} {}", clock_digits(minute_of_day), period(minute_of_day))
}

fn clock_digits(minute_of_day: u16) -> String {
    let display_hour = match (minute_of_day / 60) % 12 {
        0 => 12,
        h => h,
    };
    format!("{}:{:02}", display_hour, minute_of_day % 60)
}

fn period(minute_of_day: u16) -> &'static str {
    if minute_of_day >= 720 {
        "PM"
    } else {
        "AM"
    }
}
