// log_module.rs
use super::Module;
use crate::{
    Error, Result,
    blocks::common::read_f64_at,
    dates::{ole_to_datetime, parse_biologic_date},
};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, trace};

/// Payload offsets at which EC-Lab has been seen to store the acquisition
/// timestamp. Which one a file uses varies between software releases.
pub const TIMESTAMP_OFFSETS: &[usize] = &[465, 469, 473, 585];

/// Day counts outside this open interval are rejected (years ~1990-2036).
pub const TIMESTAMP_MIN_DAYS: f64 = 33000.0;
pub const TIMESTAMP_MAX_DAYS: f64 = 50000.0;

/// Information extracted from the `VMP LOG` module.
#[derive(Debug, Clone, PartialEq)]
pub struct LogModule {
    /// Date the experiment finished.
    pub end_date: NaiveDate,
    /// Precise acquisition start.
    pub timestamp: NaiveDateTime,
    /// Payload offset the timestamp was found at.
    pub timestamp_offset: usize,
}

impl LogModule {
    pub fn from_module(module: &Module) -> Result<Self> {
        let end_date = parse_biologic_date(module.date())?;
        let (timestamp_offset, days) = find_ole_timestamp(&module.data)?;
        debug!("LOG module timestamp at offset {timestamp_offset}: {days} days");
        Ok(Self {
            end_date,
            timestamp: ole_to_datetime(days),
            timestamp_offset,
        })
    }
}

fn is_plausible(days: f64) -> bool {
    days > TIMESTAMP_MIN_DAYS && days < TIMESTAMP_MAX_DAYS
}

/// Probe [`TIMESTAMP_OFFSETS`] in order and return the first plausible value.
pub fn find_ole_timestamp(payload: &[u8]) -> Result<(usize, f64)> {
    for &offset in TIMESTAMP_OFFSETS {
        match read_f64_at(payload, offset) {
            Some(days) if is_plausible(days) => return Ok((offset, days)),
            Some(days) => trace!("rejecting timestamp candidate {days} at offset {offset}"),
            None => trace!("timestamp offset {offset} past end of {}-byte LOG", payload.len()),
        }
    }
    Err(Error::TimestampNotFound {
        offsets: TIMESTAMP_OFFSETS,
    })
}
