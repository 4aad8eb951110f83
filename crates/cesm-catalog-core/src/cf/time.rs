//! CF time coordinate decoding.
//!
//! Time coordinates are stored as numeric offsets with a `units` attribute of
//! the form `"<unit> since <reference>"` and an optional `calendar`
//! attribute. Climate runs commonly use model calendars (`noleap`,
//! `360_day`) that chrono cannot represent, so those are handled with plain
//! day arithmetic on a fixed-length year; real-world calendars go through
//! chrono.

use std::{fmt, str::FromStr};

use chrono::{NaiveDate, TimeDelta};
use snafu::prelude::*;

use crate::zarr::NumericValue;

/// Output format of decoded times.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SECONDS_PER_DAY: i64 = 86_400;

/// Errors from decoding a time coordinate value.
#[derive(Debug, Snafu, Clone, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum TimeError {
    /// The `calendar` attribute names a calendar this decoder does not know.
    #[snafu(display("Unsupported calendar '{calendar}'"))]
    UnknownCalendar {
        /// The calendar attribute.
        calendar: String,
    },

    /// The reference date after `since` cannot be parsed or is not a valid
    /// date in the calendar.
    #[snafu(display("Invalid reference time '{reference}' in units '{units}'"))]
    InvalidReference {
        /// The reference part of the units.
        reference: String,
        /// The full units attribute.
        units: String,
    },

    /// The stored value is NaN or infinite.
    #[snafu(display("Time value {value} is not finite"))]
    NotFinite {
        /// The stored value.
        value: f64,
    },

    /// The decoded instant is outside the representable range.
    #[snafu(display("Time value {value} {unit} overflows the calendar"))]
    OutOfRange {
        /// The stored value.
        value: f64,
        /// Unit of the stored value.
        unit: TimeUnit,
    },
}

/// CF calendars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// `standard`, `gregorian`, `proleptic_gregorian`.
    Standard,
    /// `noleap`, `365_day`.
    NoLeap,
    /// `all_leap`, `366_day`.
    AllLeap,
    /// `360_day`.
    Day360,
}

impl FromStr for Calendar {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Calendar::Standard),
            "noleap" | "365_day" => Ok(Calendar::NoLeap),
            "all_leap" | "366_day" => Ok(Calendar::AllLeap),
            "360_day" => Ok(Calendar::Day360),
            _ => UnknownCalendarSnafu { calendar: s }.fail(),
        }
    }
}

impl Calendar {
    fn month_lengths(self) -> Option<[i64; 12]> {
        match self {
            Calendar::Standard => None,
            Calendar::NoLeap => Some([31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]),
            Calendar::AllLeap => Some([31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]),
            Calendar::Day360 => Some([30; 12]),
        }
    }
}

/// Unit of a time offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    /// Days of 86400 seconds.
    Days,
    /// Hours.
    Hours,
    /// Minutes.
    Minutes,
    /// Seconds.
    Seconds,
}

impl TimeUnit {
    fn parse(word: &str) -> Option<TimeUnit> {
        match word.to_ascii_lowercase().as_str() {
            "days" | "day" | "d" => Some(TimeUnit::Days),
            "hours" | "hour" | "hr" | "h" => Some(TimeUnit::Hours),
            "minutes" | "minute" | "min" => Some(TimeUnit::Minutes),
            "seconds" | "second" | "sec" | "s" => Some(TimeUnit::Seconds),
            _ => None,
        }
    }

    fn seconds(self) -> f64 {
        match self {
            TimeUnit::Days => 86_400.0,
            TimeUnit::Hours => 3_600.0,
            TimeUnit::Minutes => 60.0,
            TimeUnit::Seconds => 1.0,
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeUnit::Days => "days",
            TimeUnit::Hours => "hours",
            TimeUnit::Minutes => "minutes",
            TimeUnit::Seconds => "seconds",
        })
    }
}

/// Broken-down civil time, independent of calendar.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Civil {
    year: i64,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: f64,
}

/// Parsed `"<unit> since <reference>"` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeUnits {
    unit: TimeUnit,
    reference: Civil,
    source: String,
}

impl TimeUnits {
    /// Parse a `units` attribute.
    ///
    /// Returns `Ok(None)` when the attribute is not a CF time unit at all
    /// (no `since`, or an unknown unit word) and an error when it is one
    /// but the reference time is malformed.
    pub fn parse(units: &str) -> Result<Option<TimeUnits>, TimeError> {
        let Some((unit, reference)) = units.trim().split_once(" since ") else {
            return Ok(None);
        };
        let Some(unit) = TimeUnit::parse(unit.trim()) else {
            return Ok(None);
        };

        let reference = parse_reference(reference.trim()).context(InvalidReferenceSnafu {
            reference: reference.trim(),
            units,
        })?;

        Ok(Some(TimeUnits {
            unit,
            reference,
            source: units.to_string(),
        }))
    }

    /// Unit of the stored offsets.
    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Render `value` (an offset in these units) as `YYYY-MM-DD HH:MM:SS`.
    pub fn format(&self, value: f64, calendar: Calendar) -> Result<String, TimeError> {
        ensure!(value.is_finite(), NotFiniteSnafu { value });

        let out_of_range = || TimeError::OutOfRange {
            value,
            unit: self.unit,
        };

        let offset = value * self.unit.seconds() + self.reference.second.fract();
        ensure!(
            offset.abs() < i64::MAX as f64 / 2.0,
            OutOfRangeSnafu {
                value,
                unit: self.unit
            }
        );
        let offset = offset.round() as i64;

        match calendar.month_lengths() {
            None => {
                let r = self.reference;
                let start = i32::try_from(r.year)
                    .ok()
                    .and_then(|y| NaiveDate::from_ymd_opt(y, r.month, r.day))
                    .and_then(|d| d.and_hms_opt(r.hour, r.minute, r.second.trunc() as u32))
                    .context(InvalidReferenceSnafu {
                        reference: format!("{:04}-{:02}-{:02}", r.year, r.month, r.day),
                        units: self.source.as_str(),
                    })?;
                let instant = TimeDelta::try_seconds(offset)
                    .and_then(|d| start.checked_add_signed(d))
                    .ok_or_else(out_of_range)?;
                Ok(instant.format(TIME_FORMAT).to_string())
            }
            Some(months) => {
                let start = fixed_seconds(&self.reference, &months).context(
                    InvalidReferenceSnafu {
                        reference: format!(
                            "{:04}-{:02}-{:02}",
                            self.reference.year, self.reference.month, self.reference.day
                        ),
                        units: self.source.as_str(),
                    },
                )?;
                let total = start.checked_add(offset).ok_or_else(out_of_range)?;
                Ok(format_fixed(total, &months))
            }
        }
    }
}

/// Decode a stored time value to text.
///
/// When `units` is absent or not a CF time unit the value is rendered
/// unchanged. A missing `calendar` means `standard`.
pub fn decode_time(
    value: NumericValue,
    units: Option<&str>,
    calendar: Option<&str>,
) -> Result<String, TimeError> {
    let Some(units) = units.map(TimeUnits::parse).transpose()?.flatten() else {
        return Ok(value.to_string());
    };
    let calendar = match calendar {
        Some(name) => name.parse()?,
        None => Calendar::Standard,
    };
    units.format(value.as_f64(), calendar)
}

/// Parse `YYYY-M-D[( |T)h:m[:s[.f]]][Z| UTC]`.
fn parse_reference(text: &str) -> Option<Civil> {
    let normalized = text.replacen('T', " ", 1);
    let mut parts = normalized.split_whitespace();

    let date = parts.next()?;
    let mut fields = date.splitn(3, '-');
    let year: i64 = fields.next()?.parse().ok()?;
    let month: u32 = fields.next()?.parse().ok()?;
    let day: u32 = fields.next()?.parse().ok()?;

    let (hour, minute, second) = match parts.next() {
        Some(clock) => {
            let clock = clock.trim_end_matches('Z');
            let mut fields = clock.split(':');
            let hour: u32 = fields.next()?.parse().ok()?;
            let minute: u32 = fields.next().unwrap_or("0").parse().ok()?;
            let second: f64 = fields.next().unwrap_or("0").parse().ok()?;
            (hour, minute, second)
        }
        None => (0, 0, 0.0),
    };

    let valid = (1..=12).contains(&month)
        && (1..=31).contains(&day)
        && hour < 24
        && minute < 60
        && (0.0..60.0).contains(&second);
    valid.then_some(Civil {
        year,
        month,
        day,
        hour,
        minute,
        second,
    })
}

/// Seconds since year 0 in a calendar with fixed month lengths.
fn fixed_seconds(civil: &Civil, months: &[i64; 12]) -> Option<i64> {
    let month_index = usize::try_from(civil.month).ok()?.checked_sub(1)?;
    let day = i64::from(civil.day);
    if day > months[month_index] {
        return None;
    }

    let year_days: i64 = months.iter().sum();
    let days = civil
        .year
        .checked_mul(year_days)?
        .checked_add(months[..month_index].iter().sum::<i64>())?
        .checked_add(day - 1)?;

    let clock = i64::from(civil.hour) * 3_600
        + i64::from(civil.minute) * 60
        + civil.second.trunc() as i64;
    days.checked_mul(SECONDS_PER_DAY)?.checked_add(clock)
}

fn format_fixed(total: i64, months: &[i64; 12]) -> String {
    let year_days: i64 = months.iter().sum();
    let days = total.div_euclid(SECONDS_PER_DAY);
    let clock = total.rem_euclid(SECONDS_PER_DAY);

    let year = days.div_euclid(year_days);
    let mut day_of_year = days.rem_euclid(year_days);
    let mut month = 1;
    for len in months {
        if day_of_year < *len {
            break;
        }
        day_of_year -= len;
        month += 1;
    }

    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        year,
        month,
        day_of_year + 1,
        clock / 3_600,
        (clock % 3_600) / 60,
        clock % 60
    )
}
