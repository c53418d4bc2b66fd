// src/readers/blame.rs

//! Read unit durations out of a `systemd-analyze blame` report.
//!
//! A report has one line per unit, the slowest first:
//!
//! ```text
//!           2.539s cloud-init-local.service
//!  1min 3.201s snapd.seeded.service
//!           539ms systemd-journald.service
//! ```
//!
//! The duration is a systemd timespan of one or more `<number><unit>`
//! tokens preceding the unit name.

use crate::common::{ExtractError, ExtractResult};
use crate::data::line::{find_marker, LogLine, Marker, MarkerMatch, ScanDirection};

use ::bstr::ByteSlice;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default unit looked up in the blame report.
pub const BLAME_UNIT_DEFAULT: &str = "cloud-init-local.service";

/// Seconds per systemd timespan unit suffix.
///
/// Longest suffixes first so `ms` is not read as `s`.
const TIMESPAN_UNITS: [(&str, f64); 6] = [
    ("min", 60.0),
    ("ms", 0.001),
    ("us", 0.000_001),
    ("µs", 0.000_001),
    ("h", 3600.0),
    ("s", 1.0),
];

fn malformed(line: &LogLine, reason: &str) -> ExtractError {
    ExtractError::MalformedLine {
        line: line.to_string_lossy(),
        reason: reason.to_string(),
    }
}

/// Parse one timespan token, e.g. `2.539s` or `1min`, into seconds.
///
/// Returns `None` if the token has no known unit suffix or the number
/// does not parse.
pub fn parse_timespan_token(token: &[u8]) -> Option<f64> {
    let token: &str = token.to_str().ok()?;
    for (suffix, scale) in TIMESPAN_UNITS.iter() {
        if let Some(number) = token.strip_suffix(suffix) {
            return match number.parse::<f64>() {
                Ok(val) => Some(val * scale),
                Err(_) => None,
            };
        }
    }

    None
}

/// Parse the timespan tokens of a blame line into seconds.
///
/// The tokens are the whitespace-delimited tokens before the token where
/// `unit` first occurs. All are summed, so `1min 3.201s` is `63.201`.
/// `unit` may contain whitespace.
pub fn blame_line_seconds(line: &LogLine, unit: &Marker) -> ExtractResult<f64> {
    defn!("({:?})", line);
    let bytes: &[u8] = line.as_bytes();
    let offset: usize = match unit.find(bytes) {
        Some(val) => val,
        None => {
            defx!("unit not in line");
            return Err(malformed(line, "unit name not found in line"));
        }
    };
    // back up to the start of the token holding the unit name
    let prefix: &[u8] = &bytes[..offset];
    let end: usize = prefix
        .iter()
        .rposition(|b| b.is_ascii_whitespace())
        .map_or(0, |at| at + 1);
    let durations = LogLine::new(line.fileoffset(), &prefix[..end]);
    let mut seconds: f64 = 0.0;
    let mut count: usize = 0;
    for token in durations.tokens() {
        match parse_timespan_token(token) {
            Some(val) => seconds += val,
            None => {
                defx!("bad timespan token {:?}", token.as_bstr());
                return Err(malformed(line, "expected a timespan like 2.539s before the unit name"));
            }
        }
        count += 1;
    }
    if count == 0 {
        defx!("no timespan tokens");
        return Err(malformed(line, "no duration before the unit name"));
    }
    defx!("return {}", seconds);

    Ok(seconds)
}

/// Duration in seconds of the first line of the blame report `buffer`
/// that contains `unit_name`.
///
/// Lines are scanned in file order. No matching line is not an error;
/// not every boot has an entry for every unit, so `Ok(None)` is returned.
/// A matching line whose duration cannot be parsed is
/// [`ExtractError::MalformedLine`].
pub fn extract_unit_blame(buffer: &[u8], unit_name: &str) -> ExtractResult<Option<f64>> {
    defn!("(buffer len {}, {:?})", buffer.len(), unit_name);
    let unit = Marker::from(unit_name);
    let found: MarkerMatch = match find_marker(buffer, &unit, ScanDirection::Forward) {
        Some(val) => val,
        None => {
            defx!("unit {:?} not found; return Ok(None)", unit_name);
            return Ok(None);
        }
    };
    let seconds: f64 = blame_line_seconds(&found.line, &unit)?;
    defx!("return Ok(Some({}))", seconds);

    Ok(Some(seconds))
}
