//! Reader for `.mpt` text exports.
//!
//! EC-Lab and BT-Lab can export an experiment as tab-separated text. The
//! file starts with a magic line and a header-line count, followed by free
//! comment lines, one line of column names and the data rows.
//!
//! ```text
//! EC-Lab ASCII FILE
//! Nb header lines : 5
//! <comment>
//! <comment>
//! mode<TAB>ox/red<TAB>time/s<TAB>Ewe/V
//! 1<TAB>0<TAB>0,5<TAB>3,2
//! ```
//!
//! Column names are mapped to the same canonical names the binary reader
//! uses wherever the two disagree, so both can be compared field by field.

use crate::{
    Error, Result,
    blocks::latin1_to_string,
    dates::parse_acquisition_line,
    types::ColumnValues,
};
use chrono::NaiveDateTime;
use log::debug;
use std::fs;
use std::path::Path;

/// Accepted first lines.
pub const MPT_MAGICS: &[&str] = &["EC-Lab ASCII FILE", "BT-Lab ASCII FILE"];

const HEADER_COUNT_PREFIX: &str = "Nb header lines :";

/// Lines counted in the header besides the comments: magic, count and
/// column names.
const FIXED_HEADER_LINES: usize = 3;

const FLOAT_FIELDS: &[&str] = &[
    "time/s",
    "P/W",
    "(Q-Qo)/mA.h",
    "x",
    "control/V",
    "control/mA",
    "control/V/mA",
    "(Q-Qo)/C",
    "dQ/C",
    "freq/Hz",
    "|Ewe|/V",
    "|I|/A",
    "Phase(Z)/deg",
    "|Z|/Ohm",
    "Re(Z)/Ohm",
    "-Im(Z)/Ohm",
    "Re(M)",
    "Im(M)",
    "|M|",
    "Re(Permittivity)",
    "Im(Permittivity)",
    "|Permittivity|",
    "Tan(Delta)",
    "Q charge/discharge/mA.h",
    "step time/s",
    "Q charge/mA.h",
    "Q discharge/mA.h",
    "Temperature/°C",
    "Efficiency/%",
    "Capacity/mA.h",
];

const FLOAT_UNIT_SUFFIXES: &[&str] = &[
    "/s", "/Hz", "/deg", "/W", "/mW", "/W.h", "/mW.h", "/A", "/mA", "/A.h", "/mA.h", "/V", "/mV",
    "/F", "/mF", "/uF", "/µF", "/nF", "/C", "/Ohm", "/Ohm-1", "/Ohm.cm", "/mS/cm", "/%",
];

const BOOL_FIELDS: &[&str] = &["ox/red", "error", "control changes", "Ns changes", "counter inc."];

const INT_FIELDS: &[&str] = &["cycle number", "I Range", "Ns", "half cycle", "z cycle"];

/// Character encoding of an `.mpt` file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MptEncoding {
    /// ASCII or UTF-8.
    #[default]
    Utf8,
    /// ISO 8859-1, as written by EC-Lab on most Windows installations.
    Latin1,
}

/// How the values of a text column are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MptColumnType {
    /// Small integer (`mode`).
    U8,
    Bool,
    /// Non-negative counter.
    Int,
    Float,
}

/// A column of a text export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MptColumn {
    /// Canonical name, e.g. `I/mA` for `<I>/mA`.
    pub name: String,
    /// Name as written in the file.
    pub header: String,
    pub column_type: MptColumnType,
}

/// Map a column header to its canonical name and type.
///
/// # Errors
/// [`Error::InvalidText`] for headers that are not recognised.
pub fn canonical_field(header: &str) -> Result<(String, MptColumnType)> {
    let (name, column_type) = match header {
        "mode" => ("mode", MptColumnType::U8),
        h if BOOL_FIELDS.contains(&h) => (h, MptColumnType::Bool),
        h if FLOAT_FIELDS.contains(&h) => (h, MptColumnType::Float),
        h if INT_FIELDS.contains(&h) => (h, MptColumnType::Int),
        "dq/mA.h" | "dQ/mA.h" => ("dQ/mA.h", MptColumnType::Float),
        "I/mA" | "<I>/mA" => ("I/mA", MptColumnType::Float),
        "Ewe/V" | "<Ewe>/V" | "Ecell/V" | "<Ewe/V>" => ("Ewe/V", MptColumnType::Float),
        h if FLOAT_UNIT_SUFFIXES.iter().any(|s| h.ends_with(s)) => (h, MptColumnType::Float),
        h => {
            return Err(Error::InvalidText(format!("Invalid column header: {h}")));
        }
    };
    Ok((name.to_string(), column_type))
}

/// A parsed `.mpt` text export.
#[derive(Debug, Clone, PartialEq)]
pub struct MptFile {
    comments: Vec<String>,
    columns: Vec<MptColumn>,
    values: Vec<ColumnValues>,
    rows: usize,
}

impl MptFile {
    /// Read an `.mpt` file, decoding it as UTF-8.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_encoding(path, MptEncoding::Utf8)
    }

    /// Read an `.mpt` file with an explicit encoding.
    pub fn open_with_encoding(path: impl AsRef<Path>, encoding: MptEncoding) -> Result<Self> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes, encoding)
    }

    /// Parse the raw bytes of an `.mpt` file.
    pub fn from_bytes(bytes: &[u8], encoding: MptEncoding) -> Result<Self> {
        match encoding {
            MptEncoding::Utf8 => {
                let text = core::str::from_utf8(bytes).map_err(|e| {
                    Error::InvalidText(format!("File is not valid UTF-8: {e}"))
                })?;
                Self::parse(text)
            }
            MptEncoding::Latin1 => Self::parse(&latin1_to_string(bytes)),
        }
    }

    /// Parse the decoded text of an `.mpt` file.
    pub fn parse(text: &str) -> Result<Self> {
        let mut lines = text.split_inclusive('\n');
        let mut consumed = 0;
        let mut next_line = || {
            lines
                .next()
                .map(|line| {
                    consumed += line.len();
                    line.trim_end_matches(['\r', '\n'])
                })
                .ok_or_else(|| Error::InvalidText("Unexpected end of header".to_string()))
        };

        let magic = next_line()?;
        if !MPT_MAGICS.contains(&magic.trim_end()) {
            return Err(Error::InvalidText(format!(
                "Bad first line for EC-Lab file: {magic:?}"
            )));
        }

        let header_count = parse_header_count(next_line()?)?;
        let comments = (0..header_count - FIXED_HEADER_LINES)
            .map(|_| next_line().map(str::to_string))
            .collect::<Result<Vec<_>>>()?;

        let columns = next_line()?
            .trim()
            .split('\t')
            .map(|header| {
                canonical_field(header).map(|(name, column_type)| MptColumn {
                    name,
                    header: header.to_string(),
                    column_type,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(Error::InvalidText(format!(
                    "Duplicate column {:?} (from header {:?})",
                    column.name, column.header
                )));
            }
        }

        let body = &text[consumed..];
        let mut raw: Vec<Vec<f64>> = vec![Vec::new(); columns.len()];
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());

        for record in csv_reader.records() {
            let record = record?;
            let fields: Vec<&str> = record.iter().filter(|f| !f.is_empty()).collect();
            if fields.is_empty() {
                continue;
            }
            let line = header_count + record.position().map_or(0, |p| p.line() as usize);
            if fields.len() != columns.len() {
                return Err(Error::InvalidText(format!(
                    "Line {line}: expected {} values, found {}",
                    columns.len(),
                    fields.len()
                )));
            }
            for (column, field) in raw.iter_mut().zip(fields) {
                column.push(parse_number(field, line)?);
            }
        }

        let rows = raw.first().map_or(0, Vec::len);
        let values = columns
            .iter()
            .zip(raw)
            .map(|(column, raw)| convert_column(column, raw))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "parsed .mpt export: {} comment lines, {} columns, {rows} rows",
            comments.len(),
            columns.len()
        );

        Ok(Self {
            comments,
            columns,
            values,
            rows,
        })
    }

    /// Comment lines between the header count and the column names.
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn columns(&self) -> &[MptColumn] {
        &self.columns
    }

    /// Canonical column names in file order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Values of the column with canonical name `name`.
    pub fn column(&self, name: &str) -> Option<&ColumnValues> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|i| &self.values[i])
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// The `Acquisition started on` timestamp from the comments, if any.
    pub fn acquisition_start(&self) -> Result<Option<NaiveDateTime>> {
        for line in &self.comments {
            if let Some(timestamp) = parse_acquisition_line(line)? {
                return Ok(Some(timestamp));
            }
        }
        Ok(None)
    }
}

fn parse_header_count(line: &str) -> Result<usize> {
    let count = line
        .strip_prefix(HEADER_COUNT_PREFIX)
        .and_then(|rest| rest.trim().parse::<usize>().ok())
        .ok_or_else(|| Error::InvalidText(format!("Bad header count line: {line:?}")))?;
    if count < FIXED_HEADER_LINES {
        return Err(Error::InvalidText(format!(
            "Too few header lines: {count}"
        )));
    }
    Ok(count)
}

/// Parse a number written with either `.` or `,` as decimal separator.
fn parse_number(text: &str, line: usize) -> Result<f64> {
    let parsed = if text.contains(',') {
        text.replace(',', ".").parse::<f64>()
    } else {
        text.parse::<f64>()
    };
    parsed.map_err(|_| Error::InvalidText(format!("Line {line}: invalid number {text:?}")))
}

fn convert_column(column: &MptColumn, raw: Vec<f64>) -> Result<ColumnValues> {
    let out_of_range = |v: f64| {
        Error::InvalidText(format!(
            "Value {v} out of range for column {:?}",
            column.header
        ))
    };
    Ok(match column.column_type {
        MptColumnType::Float => ColumnValues::F64(raw),
        MptColumnType::Bool => ColumnValues::Bool(raw.into_iter().map(|v| v != 0.0).collect()),
        MptColumnType::U8 => ColumnValues::U8(
            raw.into_iter()
                .map(|v| {
                    if (0.0..=255.0).contains(&v) {
                        Ok(v as u8)
                    } else {
                        Err(out_of_range(v))
                    }
                })
                .collect::<Result<_>>()?,
        ),
        MptColumnType::Int => ColumnValues::U32(
            raw.into_iter()
                .map(|v| {
                    if (0.0..=f64::from(u32::MAX)).contains(&v) {
                        Ok(v as u32)
                    } else {
                        Err(out_of_range(v))
                    }
                })
                .collect::<Result<_>>()?,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn canonical_names() {
        assert_eq!(
            canonical_field("<I>/mA").unwrap(),
            ("I/mA".to_string(), MptColumnType::Float)
        );
        assert_eq!(canonical_field("dq/mA.h").unwrap().0, "dQ/mA.h");
        assert_eq!(canonical_field("<Ewe/V>").unwrap().0, "Ewe/V");
        assert_eq!(canonical_field("mode").unwrap().1, MptColumnType::U8);
        assert_eq!(canonical_field("counter inc.").unwrap().1, MptColumnType::Bool);
        assert_eq!(canonical_field("cycle number").unwrap().1, MptColumnType::Int);
        assert_eq!(canonical_field("Cs/µF").unwrap().1, MptColumnType::Float);
        assert_eq!(canonical_field("Temperature/°C").unwrap().1, MptColumnType::Float);
    }

    #[test]
    fn unknown_header() {
        let err = canonical_field("mystery").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Text);
        assert!(err.to_string().contains("mystery"));
    }

    #[test]
    fn header_count_line() {
        assert_eq!(parse_header_count("Nb header lines : 57  ").unwrap(), 57);
        assert!(parse_header_count("Nb header lines : 2").is_err());
        assert!(parse_header_count("Header lines: 5").is_err());
    }

    #[test]
    fn decimal_comma() {
        assert_eq!(parse_number("3,25", 1).unwrap(), 3.25);
        assert_eq!(parse_number("-1.5E-003", 1).unwrap(), -0.0015);
        assert!(parse_number("1,2,3", 1).is_err());
    }

    #[test]
    fn minimal_file() {
        let text = "EC-Lab ASCII FILE\r\n\
                    Nb header lines : 4\r\n\
                    Acquisition started on : 02/07/2024 09:59:45.908\r\n\
                    mode\tox/red\ttime/s\t<Ewe>/V\tcycle number\t\r\n\
                    2\t1\t0,5\t3,2\t0\t\r\n\
                    1\t0\t1,0\t3,4\t1\t\r\n";
        let mpt = MptFile::parse(text).unwrap();
        assert_eq!(mpt.len(), 2);
        assert_eq!(mpt.comments().len(), 1);
        assert_eq!(
            mpt.field_names().collect::<Vec<_>>(),
            ["mode", "ox/red", "time/s", "Ewe/V", "cycle number"]
        );
        assert_eq!(mpt.column("mode"), Some(&ColumnValues::U8(vec![2, 1])));
        assert_eq!(
            mpt.column("ox/red"),
            Some(&ColumnValues::Bool(vec![true, false]))
        );
        assert_eq!(mpt.column("Ewe/V"), Some(&ColumnValues::F64(vec![3.2, 3.4])));
        assert_eq!(mpt.column("cycle number"), Some(&ColumnValues::U32(vec![0, 1])));
        assert!(mpt.acquisition_start().unwrap().is_some());
    }

    #[test]
    fn bad_magic_and_short_rows() {
        assert!(MptFile::parse("Some file\nNb header lines : 3\nx\n").is_err());
        let text = "BT-Lab ASCII FILE\nNb header lines : 3\ntime/s\tEwe/V\n1.0\n";
        let err = MptFile::parse(text).unwrap_err();
        assert!(err.to_string().contains("expected 2 values"));
    }

    #[test]
    fn latin1_encoding() {
        let mut bytes = b"EC-Lab ASCII FILE\nNb header lines : 3\nTemperature/".to_vec();
        bytes.push(0xB0);
        bytes.extend_from_slice(b"C\n21.5\n");
        assert!(MptFile::from_bytes(&bytes, MptEncoding::Utf8).is_err());
        let mpt = MptFile::from_bytes(&bytes, MptEncoding::Latin1).unwrap();
        assert_eq!(
            mpt.column("Temperature/°C"),
            Some(&ColumnValues::F64(vec![21.5]))
        );
    }
}
