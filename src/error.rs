//! Error types for `.mpr` and `.mpt` reading.
//!
//! This module defines the [`Error`] enum which represents every failure
//! that can occur while decoding a Bio-Logic file, plus [`ErrorKind`], the
//! coarse classification callers usually branch on.
//!
//! # Example
//!
//! ```no_run
//! use galvani_rs::{ErrorKind, MprFile, Result};
//!
//! fn load(path: &str) -> Result<()> {
//!     match MprFile::open(path) {
//!         Ok(mpr) => {
//!             println!("Loaded {} points", mpr.point_count());
//!             Ok(())
//!         }
//!         Err(e) if e.kind() == ErrorKind::UnknownColumn => {
//!             eprintln!("Unsupported column layout: {e}");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use chrono::{NaiveDate, NaiveDateTime};

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Wrong magic, wrong module tag, unknown version or a non-zero reserved byte.
    Format,
    /// Fewer bytes available than a declared or fixed size.
    Truncation,
    /// A column code absent from every registry table.
    UnknownColumn,
    /// Decoded row count differs from the declared point count.
    CountMismatch,
    /// A date or timestamp could not be parsed or located.
    DateParse,
    /// Dates derived from different modules disagree.
    Consistency,
    /// Underlying I/O failure.
    Io,
    /// Malformed text input (`.mpt` export or side file).
    Text,
    /// A field or flag was requested that the decoded table does not contain.
    Lookup,
}

/// Errors that can occur while reading Bio-Logic files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error occurred while reading the input.
    #[error("I/O error: {0}")]
    IOError(#[from] std::io::Error),

    /// The file does not start with the `.mpr` magic signature.
    #[error("Invalid magic for .mpr file: {}", escape_bytes(.found))]
    InvalidMagic {
        /// The bytes actually found at the start of the file
        found: Vec<u8>,
    },

    /// A module did not start with the `MODULE` tag.
    #[error("Found {}, expecting start of new VMP MODULE", escape_bytes(.found))]
    ModuleTagError {
        /// The bytes read where the tag was expected
        found: Vec<u8>,
    },

    /// Buffer or stream provided for parsing was too small.
    #[error("Unexpected end of data while reading {context}: need {expected} bytes, got {actual}")]
    TooShortBuffer {
        /// Actual number of bytes available
        actual: usize,
        /// Number of bytes required
        expected: usize,
        /// What was being read
        context: &'static str,
    },

    /// A module payload was shorter than its header declared.
    #[error(
        "Unexpected end of file while reading data of module {name:?}: \
         length read {actual}, length expected {expected}"
    )]
    ModuleTruncated {
        /// Long name of the module being read
        name: String,
        /// Declared payload length
        expected: u64,
        /// Bytes actually available
        actual: u64,
    },

    /// The data module version has no known layout.
    #[error("Unrecognised version for data module: {0}")]
    UnsupportedDataVersion(u32),

    /// The loop module version has no known layout.
    #[error("Unrecognised version for loop module: {0}")]
    UnsupportedLoopVersion(u32),

    /// The loop index array does not end on a u32 boundary.
    #[error("Loop index of {len} bytes is not a whole number of u32 words")]
    LoopIndexAlignment { len: usize },

    /// A byte in a region that must be zero was not zero.
    #[error("Non-zero byte {value:#04x} at offset {offset} of the data module header")]
    NonZeroHeader {
        /// Offset within the data module payload
        offset: usize,
        /// The offending byte
        value: u8,
    },

    /// The column code array runs past the fixed header of the data module.
    #[error("{columns} column codes do not fit in a data module header of {header_len} bytes")]
    ColumnArrayOverflow {
        /// Declared column count
        columns: usize,
        /// Size of the fixed header for this layout
        header_len: usize,
    },

    /// A required module is missing from the file.
    #[error("No {0:?} module found")]
    MissingModule(&'static str),

    /// A module that may appear at most once appeared several times.
    #[error("More than one {0:?} module found")]
    DuplicateModule(&'static str),

    /// A column code is absent from both the scalar and flag registries.
    #[error("{}", describe_unknown_column(.code, .previous))]
    UnknownColumn {
        /// The unrecognised code
        code: u16,
        /// Name of the column placed immediately before it, if any
        previous: Option<String>,
    },

    /// The number of decoded records differs from the declared point count.
    #[error("Data module declares {declared} points but {decoded} records were decoded")]
    PointCountMismatch {
        /// Point count from the data module header
        declared: u32,
        /// Records actually decoded
        decoded: usize,
    },

    /// The record payload is not a whole number of records.
    #[error("Data payload of {payload_len} bytes is not a multiple of the {record_size}-byte record size")]
    RecordAlignment {
        /// Bytes of record data
        payload_len: usize,
        /// Size of one record
        record_size: usize,
    },

    /// A date string matched none of the accepted formats.
    #[error("Could not parse timestamp {input:?} with any of the formats {formats:?}")]
    DateParse {
        /// The text that failed to parse
        input: String,
        /// The formats that were tried
        formats: &'static [&'static str],
    },

    /// No plausible acquisition timestamp was found in the log module.
    #[error("Could not find timestamp in the LOG module (offsets tried: {offsets:?})")]
    TimestampNotFound {
        /// Candidate byte offsets that were probed
        offsets: &'static [usize],
    },

    /// The settings date and the log timestamp disagree.
    #[error(
        "Date mismatch: start date {start}, end date {}, timestamp {timestamp}",
        display_optional_date(.end)
    )]
    DateMismatch {
        /// Start date from the settings module
        start: NaiveDate,
        /// End date from the log module
        end: Option<NaiveDate>,
        /// Acquisition timestamp from the log module
        timestamp: NaiveDateTime,
    },

    /// A text export or side file is malformed.
    #[error("{0}")]
    InvalidText(String),

    /// The tab-separated body of a text export could not be split.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// The requested flag is not present in the decoded table.
    #[error("Flag '{0}' not present")]
    FlagNotPresent(String),

    /// The requested field is not present in the decoded table.
    #[error("Field '{0}' not present")]
    FieldNotPresent(String),

    /// A summary could not be serialized.
    #[cfg(feature = "serde")]
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Classify this error according to the failure taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::IOError(_) => ErrorKind::Io,
            Error::InvalidMagic { .. }
            | Error::ModuleTagError { .. }
            | Error::UnsupportedDataVersion(_)
            | Error::UnsupportedLoopVersion(_)
            | Error::LoopIndexAlignment { .. }
            | Error::NonZeroHeader { .. }
            | Error::ColumnArrayOverflow { .. }
            | Error::MissingModule(_)
            | Error::DuplicateModule(_) => ErrorKind::Format,
            Error::TooShortBuffer { .. } | Error::ModuleTruncated { .. } => ErrorKind::Truncation,
            Error::UnknownColumn { .. } => ErrorKind::UnknownColumn,
            Error::PointCountMismatch { .. } | Error::RecordAlignment { .. } => {
                ErrorKind::CountMismatch
            }
            Error::DateParse { .. } | Error::TimestampNotFound { .. } => ErrorKind::DateParse,
            Error::DateMismatch { .. } => ErrorKind::Consistency,
            Error::InvalidText(_) | Error::CsvError(_) => ErrorKind::Text,
            Error::FlagNotPresent(_) | Error::FieldNotPresent(_) => ErrorKind::Lookup,
            #[cfg(feature = "serde")]
            Error::Json(_) => ErrorKind::Io,
        }
    }
}

fn describe_unknown_column(code: &u16, previous: &Option<String>) -> String {
    match previous {
        Some(prev) => format!("Column ID {code} after column {prev} is unknown"),
        None => format!("Column ID {code} is the first column and is unknown"),
    }
}

fn display_optional_date(date: &Option<NaiveDate>) -> String {
    match date {
        Some(d) => d.to_string(),
        None => String::from("<none>"),
    }
}

/// Render raw bytes the way a byte-string literal would look.
pub(crate) fn escape_bytes(bytes: &[u8]) -> String {
    let escaped: String = bytes
        .iter()
        .flat_map(|&b| core::ascii::escape_default(b))
        .map(char::from)
        .collect();
    format!("b\"{escaped}\"")
}

/// A specialized Result type for Bio-Logic file operations.
pub type Result<T> = core::result::Result<T, Error>;
