// src/readers/cloudinitlog.rs

//! Read elapsed times out of a `cloud-init.log`.
//!
//! Each line of a `cloud-init.log` begins with a date and a time of day
//! followed by a dash, the source file, a bracketed level, a colon, and
//! the message:
//!
//! ```text
//! 2023-03-27 15:52:22,568 - util.py[DEBUG]: cloud-init mode 'init' took 0.333 seconds (0.34)
//! 2023-03-27 15:52:22,569 - handlers.py[DEBUG]: finish: init-local: SUCCESS: searching for local datasources
//! ```
//!
//! Both extractions scan in [`ScanDirection::Reverse`] because the
//! interesting lines are the last occurrences, near the end of the log.

use crate::common::{ExtractError, ExtractResult};
use crate::data::datetime::{elapsed_seconds, log_line_timestamp, LogTimestamp};
use crate::data::line::{find_marker, LogLine, Marker, MarkerMatch, ScanDirection};

use ::bstr::ByteSlice;
use ::lazy_static::lazy_static;
use ::regex::bytes::Regex;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Default marker of the line logged when local datasource detection
/// completes.
pub const DATASOURCE_MARKER_DEFAULT: &str = "finish: init-local: SUCCESS";
/// Default marker of the network config generation command.
pub const COMMAND_MARKER_DEFAULT: &str = "Running command ['netplan', 'generate']";

lazy_static! {
    /// Grammar of the duration sentence preceding the datasource marker,
    /// e.g. `cloud-init mode 'init' took 0.333 seconds (0.34)`.
    static ref REGEX_TOOK_SECONDS: Regex = Regex::new(
        r"\btook\s+([0-9]+(?:\.[0-9]+)?)\s+seconds\b"
    ).unwrap();
}

/// Result of matching the `took <float> seconds` grammar on a line that
/// is present.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TookSeconds {
    /// The phrase was found; this is the number of seconds.
    Matched(f64),
    /// The line does not have the phrase.
    Unparseable,
}

/// Match `took <float> seconds` in `line`. The last such phrase wins.
pub fn parse_took_seconds(line: &[u8]) -> TookSeconds {
    defñ!("({:?})", line.as_bstr());
    let captures = match REGEX_TOOK_SECONDS.captures_iter(line).last() {
        Some(val) => val,
        None => return TookSeconds::Unparseable,
    };
    let number: &[u8] = match captures.get(1) {
        Some(val) => val.as_bytes(),
        None => return TookSeconds::Unparseable,
    };
    // the regex only admits ASCII digits and '.'
    match number.to_str().ok().and_then(|s| s.parse::<f64>().ok()) {
        Some(val) => TookSeconds::Matched(val),
        None => TookSeconds::Unparseable,
    }
}

fn marker_not_found(marker: &Marker) -> ExtractError {
    ExtractError::MarkerNotFound {
        marker: marker.to_string_lossy(),
    }
}

fn malformed(line: &LogLine, reason: &str) -> ExtractError {
    ExtractError::MalformedLine {
        line: line.to_string_lossy(),
        reason: reason.to_string(),
    }
}

/// Seconds taken by local datasource detection, using `marker` as the
/// completion line.
///
/// The last line containing `marker` is found and the value is read from
/// the line immediately before it in the file with the grammar
/// `took <float> seconds`.
pub fn extract_datasource_detection_time_with(
    buffer: &[u8],
    marker: &Marker,
) -> ExtractResult<f64> {
    defn!("(buffer len {}, {:?})", buffer.len(), marker.as_bytes().as_bstr());
    let found: MarkerMatch = match find_marker(buffer, marker, ScanDirection::Reverse) {
        Some(val) => val,
        None => {
            defx!("marker not found");
            return Err(marker_not_found(marker));
        }
    };
    let prev: LogLine = match found.file_prev {
        Some(val) => val,
        None => {
            defx!("marker on first line");
            return Err(malformed(&found.line, "no line precedes the completion marker"));
        }
    };
    match parse_took_seconds(prev.as_bytes()) {
        TookSeconds::Matched(seconds) => {
            defx!("return Ok({})", seconds);

            Ok(seconds)
        }
        TookSeconds::Unparseable => {
            defx!("preceding line unparseable {:?}", prev);

            Err(malformed(&prev, "expected \"took <float> seconds\""))
        }
    }
}

/// Seconds taken by local datasource detection.
///
/// Uses [`DATASOURCE_MARKER_DEFAULT`]; see
/// [`extract_datasource_detection_time_with`].
///
/// Given
///
/// ```text
/// 2023-03-27 15:52:22,568 - util.py[DEBUG]: cloud-init mode 'init' took 0.333 seconds (0.34)
/// 2023-03-27 15:52:22,569 - handlers.py[DEBUG]: finish: init-local: SUCCESS: searching for local datasources
/// ```
///
/// returns `0.333`.
pub fn extract_datasource_detection_time(buffer: &[u8]) -> ExtractResult<f64> {
    extract_datasource_detection_time_with(buffer, &Marker::from(DATASOURCE_MARKER_DEFAULT))
}

/// Seconds from the last line containing `command_marker` to the line
/// after it.
///
/// This is the latency until the next logged event after the command was
/// issued, not the run time of the command itself.
///
/// Given
///
/// ```text
/// 2023-03-27 15:49:06,560 - subp.py[DEBUG]: Running command ['netplan', 'generate'] ...
/// 2023-03-27 15:49:06,890 - subp.py[DEBUG]: Running command ['udevadm', 'test-builtin', ...] ...
/// ```
///
/// and marker `Running command ['netplan', 'generate']` returns `0.33`.
///
/// The result is not clamped and may be negative if the log is out of
/// order. See [`elapsed_seconds`] for day boundaries.
pub fn extract_last_command_duration(buffer: &[u8], command_marker: &str) -> ExtractResult<f64> {
    extract_last_command_duration_with(buffer, &Marker::from(command_marker))
}

/// [`extract_last_command_duration`] with a prebuilt [`Marker`].
pub fn extract_last_command_duration_with(buffer: &[u8], marker: &Marker) -> ExtractResult<f64> {
    defn!("(buffer len {}, {:?})", buffer.len(), marker.as_bytes().as_bstr());
    let found: MarkerMatch = match find_marker(buffer, marker, ScanDirection::Reverse) {
        Some(val) => val,
        None => {
            defx!("marker not found");
            return Err(marker_not_found(marker));
        }
    };
    let next: LogLine = match found.file_next {
        Some(val) => val,
        None => {
            defx!("marker on last line");
            return Err(malformed(&found.line, "no line follows the command marker"));
        }
    };
    let ts_marker: LogTimestamp = log_line_timestamp(&found.line)?;
    let ts_next: LogTimestamp = log_line_timestamp(&next)?;
    let seconds: f64 = elapsed_seconds(&ts_marker, &ts_next);
    defx!("return Ok({})", seconds);

    Ok(seconds)
}

/// Markers used by [`extract_cloud_init_log`].
#[derive(Clone, Debug)]
pub struct CloudInitMarkers {
    pub datasource: Marker,
    pub command: Marker,
}

impl Default for CloudInitMarkers {
    fn default() -> Self {
        CloudInitMarkers {
            datasource: Marker::from(DATASOURCE_MARKER_DEFAULT),
            command: Marker::from(COMMAND_MARKER_DEFAULT),
        }
    }
}

/// Both elapsed times of one `cloud-init.log`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CloudInitTimes {
    /// local datasource detection seconds
    pub local_time: f64,
    /// seconds after the network config generation command
    pub netplan_time: f64,
}

/// Run both cloud-init extractions on `buffer`.
pub fn extract_cloud_init_log(
    buffer: &[u8],
    markers: &CloudInitMarkers,
) -> ExtractResult<CloudInitTimes> {
    defn!("(buffer len {})", buffer.len());
    let local_time: f64 = extract_datasource_detection_time_with(buffer, &markers.datasource)?;
    let netplan_time: f64 = extract_last_command_duration_with(buffer, &markers.command)?;
    defx!("local_time {}, netplan_time {}", local_time, netplan_time);

    Ok(CloudInitTimes { local_time, netplan_time })
}
