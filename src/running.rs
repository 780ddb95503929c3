//! Side files written by EC-Lab while an experiment is still running.
//!
//! Until an experiment finishes, the loop and log modules are missing from
//! the `.mpr` file. EC-Lab writes the same information next to it as plain
//! text: `<stem>_LOOP.txt` with the loop start indices and `<stem>_LOG.txt`
//! with the acquisition start time.

use crate::{
    Error, Result,
    blocks::latin1_to_string,
    dates::{ACQUISITION_PREFIX, parse_acquisition_line},
};
use chrono::NaiveDateTime;
use log::debug;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// First line of a `_LOOP.txt` side file.
pub const LOOP_BANNER: &str = "VMP EXPERIMENT LOOP INDEXES";
/// First line of a `_LOG.txt` side file.
pub const LOG_BANNER: &str = "EC-Lab LOG FILE";

pub const LOOP_SUFFIX: &str = "_LOOP.txt";
pub const LOG_SUFFIX: &str = "_LOG.txt";

/// Path of the side file with `suffix` belonging to `mpr_path`.
///
/// `data/run1.mpr` with `_LOOP.txt` gives `data/run1_LOOP.txt`.
pub fn side_file_path(mpr_path: &Path, suffix: &str) -> PathBuf {
    let stem = mpr_path.file_stem().unwrap_or_default().to_string_lossy();
    mpr_path.with_file_name(format!("{stem}{suffix}"))
}

/// Parse the text of a `_LOOP.txt` file.
pub fn parse_loop_file(text: &str) -> Result<Vec<u32>> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    expect_banner(lines.next(), LOOP_BANNER)?;
    lines
        .map(|line| {
            line.parse::<u32>().map_err(|_| {
                Error::InvalidText(format!("Invalid loop index {line:?} in loop file"))
            })
        })
        .collect()
}

/// Parse the text of a `_LOG.txt` file and return the acquisition start.
pub fn parse_log_file(text: &str) -> Result<NaiveDateTime> {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    expect_banner(lines.next(), LOG_BANNER)?;
    for line in lines {
        if let Some(timestamp) = parse_acquisition_line(line)? {
            return Ok(timestamp);
        }
    }
    Err(Error::InvalidText(format!(
        "No '{ACQUISITION_PREFIX}' line in log file"
    )))
}

fn expect_banner(line: Option<&str>, banner: &str) -> Result<()> {
    match line {
        Some(l) if l.trim() == banner => Ok(()),
        Some(l) => Err(Error::InvalidText(format!(
            "Expected {banner:?} as first line, found {:?}",
            l.trim()
        ))),
        None => Err(Error::InvalidText(format!("Empty file, expected {banner:?}"))),
    }
}

/// Read a side file as Latin-1 text, or `None` if it does not exist.
fn read_side_file(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(latin1_to_string(&bytes))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Loop indices from the `_LOOP.txt` file next to `mpr_path`, if present.
pub fn read_loop_file(mpr_path: &Path) -> Result<Option<Vec<u32>>> {
    let path = side_file_path(mpr_path, LOOP_SUFFIX);
    let Some(text) = read_side_file(&path)? else {
        return Ok(None);
    };
    let index = parse_loop_file(&text)?;
    debug!("{} loop indices from {}", index.len(), path.display());
    Ok(Some(index))
}

/// Acquisition start from the `_LOG.txt` file next to `mpr_path`, if present.
pub fn read_log_file(mpr_path: &Path) -> Result<Option<NaiveDateTime>> {
    let path = side_file_path(mpr_path, LOG_SUFFIX);
    let Some(text) = read_side_file(&path)? else {
        return Ok(None);
    };
    let timestamp = parse_log_file(&text)?;
    debug!("acquisition start {timestamp} from {}", path.display());
    Ok(Some(timestamp))
}
