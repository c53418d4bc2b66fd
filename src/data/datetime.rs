// src/data/datetime.rs

//! Parse the leading timestamp of a cloud-init log line into a
//! [`LogTimestamp`] and compute elapsed seconds between two of them.
//!
//! A cloud-init log line looks like
//!
//! ```text
//! 2023-03-27 15:49:06,560 - subp.py[DEBUG]: Running command ['netplan', 'generate'] ...
//! ```
//!
//! Field 0 is the date `YYYY-MM-DD`, field 1 is the time of day
//! `HH:MM:SS,ffffff`. The fraction may have 1 to 9 digits and is
//! left-aligned, so `560` is 560 milliseconds. A `.` is accepted in place
//! of the `,`.
//!
//! The date is optional. When both timestamps carry a date the elapsed
//! time is exact across days. When either lacks a date only the time of
//! day is compared and a negative difference is taken to be a rollover
//! past midnight; see [`elapsed_seconds`].

use std::fmt;

use crate::common::{ExtractError, ExtractResult};
use crate::data::line::LogLine;

use ::bstr::ByteSlice;
#[doc(hidden)]
pub use ::chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// strftime pattern of the date field
pub const DATE_PATTERN: &str = "%Y-%m-%d";
/// strftime pattern of the time of day field once the fraction separator
/// is normalized to `.`
pub const TIME_PATTERN: &str = "%H:%M:%S%.f";

/// Seconds in one calendar day, for time-of-day rollover.
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// A point in time read from a log line.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct LogTimestamp {
    pub date: Option<NaiveDate>,
    pub time: NaiveTime,
}

impl LogTimestamp {
    pub const fn new(date: Option<NaiveDate>, time: NaiveTime) -> LogTimestamp {
        LogTimestamp { date, time }
    }

    /// Full date and time, if the date is known.
    pub fn datetime(&self) -> Option<NaiveDateTime> {
        self.date.map(|date| date.and_time(self.time))
    }
}

impl fmt::Display for LogTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.date {
            Some(date) => write!(f, "{} {}", date, self.time),
            None => write!(f, "{}", self.time),
        }
    }
}

fn timestamp_error(field: &[u8], reason: String) -> ExtractError {
    ExtractError::TimestampParse {
        field: field.to_str_lossy().into_owned(),
        reason,
    }
}

/// Parse a time of day `HH:MM:SS,ffffff` (or `HH:MM:SS.ffffff`).
pub fn parse_clock_field(field: &[u8]) -> ExtractResult<NaiveTime> {
    defn!("({:?})", field.as_bstr());
    let s: &str = match field.to_str() {
        Ok(val) => val,
        Err(err) => {
            defx!("to_str() Err {:?}", err);
            return Err(timestamp_error(field, format!("not UTF-8; {}", err)));
        }
    };
    let normalized: String = s.replacen(',', ".", 1);
    let time = NaiveTime::parse_from_str(normalized.as_str(), TIME_PATTERN)
        .map_err(|err| timestamp_error(field, format!("expected HH:MM:SS,ffffff; {}", err)))?;
    defx!("return {:?}", time);

    Ok(time)
}

/// Parse a date `YYYY-MM-DD`.
pub fn parse_date_field(field: &[u8]) -> ExtractResult<NaiveDate> {
    defñ!("({:?})", field.as_bstr());
    let s: &str = field
        .to_str()
        .map_err(|err| timestamp_error(field, format!("not UTF-8; {}", err)))?;

    NaiveDate::parse_from_str(s, DATE_PATTERN)
        .map_err(|err| timestamp_error(field, format!("expected YYYY-MM-DD; {}", err)))
}

/// Read the [`LogTimestamp`] of a cloud-init log line.
///
/// Field 1 (space-delimited) must be a time of day. Field 0 is used as
/// the date if it parses as one; otherwise the date is `None`.
pub fn log_line_timestamp(line: &LogLine) -> ExtractResult<LogTimestamp> {
    defn!("({:?})", line);
    let mut fields = line.fields();
    let field0: &[u8] = fields.next().unwrap_or_default();
    let field1: &[u8] = match fields.next() {
        Some(val) => val,
        None => {
            defx!("no field 1");
            return Err(timestamp_error(
                line.as_bytes(),
                String::from("missing time of day field"),
            ));
        }
    };
    let time: NaiveTime = parse_clock_field(field1)?;
    let date: Option<NaiveDate> = parse_date_field(field0).ok();
    let ts = LogTimestamp::new(date, time);
    defx!("return {}", ts);

    Ok(ts)
}

/// `Duration` as `f64` seconds with sub-second precision.
pub fn duration_to_seconds(duration: &Duration) -> f64 {
    match duration.num_nanoseconds() {
        Some(nanos) => nanos as f64 / 1_000_000_000.0,
        // beyond ±292 years; milliseconds suffice
        None => duration.num_milliseconds() as f64 / 1_000.0,
    }
}

/// Elapsed seconds from `earlier` to `later`.
///
/// If both have a date then this is the exact difference of the full
/// datetimes and may be negative.
///
/// If either lacks a date then the time-of-day difference is used; a
/// negative time-of-day difference is treated as a rollover past midnight
/// and one day is added.
pub fn elapsed_seconds(earlier: &LogTimestamp, later: &LogTimestamp) -> f64 {
    defn!("({}, {})", earlier, later);
    let delta: Duration = match (earlier.datetime(), later.datetime()) {
        (Some(dt_earlier), Some(dt_later)) => {
            defo!("full datetimes");
            dt_later.signed_duration_since(dt_earlier)
        }
        _ => {
            let delta = later.time.signed_duration_since(earlier.time);
            if delta < Duration::zero() {
                defo!("time of day rollover; delta {:?}", delta);
                delta + Duration::seconds(SECONDS_PER_DAY)
            } else {
                delta
            }
        }
    };
    let seconds = duration_to_seconds(&delta);
    defx!("return {}", seconds);

    seconds
}
