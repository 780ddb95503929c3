//! Date handling for Bio-Logic files.
//!
//! Module headers carry an 8-character date in one of three US-style
//! layouts, the log module stores the acquisition start as an OLE day count,
//! and the text exports print an `Acquisition started on : ...` line.

use crate::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Accepted module date layouts, tried in order.
pub const DATE_FORMATS: &[&str] = &["%m/%d/%y", "%m-%d-%y", "%m.%d.%y"];

/// Accepted layouts of the acquisition start line.
pub const ACQUISITION_FORMATS: &[&str] = &["%m/%d/%Y %H:%M:%S%.f", "%m/%d/%Y %H:%M:%S"];

/// Prefix of the acquisition start line in text exports and log side files.
pub const ACQUISITION_PREFIX: &str = "Acquisition started on";

const MICROS_PER_DAY: f64 = 86_400_000_000.0;

/// Parse a module date such as `02/23/17` or `b"10-03-05"`.
///
/// Byte input must be ASCII; trailing NUL padding is ignored. Two-digit years follow the chrono convention
/// (`00`-`68` map to 2000-2068, `69`-`99` to 1969-1999).
///
/// # Errors
/// [`Error::DateParse`] naming the input and every format tried.
pub fn parse_biologic_date<T: AsRef<[u8]> + ?Sized>(date: &T) -> Result<NaiveDate> {
    let bytes = date.as_ref();
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    let bytes = &bytes[..end];
    let text = match core::str::from_utf8(bytes) {
        Ok(text) if text.is_ascii() => text,
        _ => return Err(date_error(&String::from_utf8_lossy(bytes), DATE_FORMATS)),
    };
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| date_error(text, DATE_FORMATS))
}

/// Convert an OLE automation day count (epoch 1899-12-30) to a timestamp.
///
/// The fractional part is rounded to the nearest microsecond.
pub fn ole_to_datetime(days: f64) -> NaiveDateTime {
    let micros = (days * MICROS_PER_DAY).round() as i64;
    ole_epoch() + Duration::microseconds(micros)
}

fn ole_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Parse an `Acquisition started on : 2/7/2024 09:59:45.908` line.
///
/// Leading whitespace is ignored. Returns `Ok(None)` when the line is not
/// an acquisition line at all and an error when it is but the timestamp is
/// malformed.
pub fn parse_acquisition_line(line: &str) -> Result<Option<NaiveDateTime>> {
    let Some(rest) = line.trim_start().strip_prefix(ACQUISITION_PREFIX) else {
        return Ok(None);
    };
    let value = rest.trim_start().trim_start_matches(':').trim();
    ACQUISITION_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(Some)
        .ok_or_else(|| date_error(value, ACQUISITION_FORMATS))
}

fn date_error(input: &str, formats: &'static [&'static str]) -> Error {
    Error::DateParse {
        input: input.to_string(),
        formats,
    }
}
