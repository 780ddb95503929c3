//! Serializable overview of a decoded `.mpr` file.
//!
//! The summary carries everything except the records themselves, which
//! makes it handy for cataloguing many files:
//!
//! ```no_run
//! use galvani_rs::{MprFile, Result};
//!
//! fn catalogue() -> Result<()> {
//!     let mpr = MprFile::open("cell.mpr")?;
//!     let summary = mpr.summary();
//!     println!("{} points, started {:?}", summary.point_count, summary.timestamp);
//!     summary.save_to_file("cell.summary.json")?;
//!     Ok(())
//! }
//! ```

use crate::{
    MprFile,
    blocks::{DataModuleLayout, HeaderLayout, Module},
    layout::Field,
    types::FlagType,
};
use chrono::{NaiveDate, NaiveDateTime};

/// Header information of one module.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleSummary {
    pub short_name: String,
    pub long_name: String,
    pub header_layout: HeaderLayout,
    pub version: u32,
    pub length: u64,
    pub data_offset: u64,
    /// Date field as stored, e.g. `02/23/17`.
    pub date: String,
}

impl From<&Module> for ModuleSummary {
    fn from(module: &Module) -> Self {
        Self {
            short_name: module.short_name().into_owned(),
            long_name: module.long_name().into_owned(),
            header_layout: module.header.layout,
            version: module.version(),
            length: module.length(),
            data_offset: module.data_offset,
            date: String::from_utf8_lossy(module.date()).into_owned(),
        }
    }
}

/// One entry of the flags map.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagSummary {
    pub name: String,
    pub mask: u8,
    pub flag_type: FlagType,
}

/// Everything known about an `.mpr` file apart from its records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MprSummary {
    pub version: u32,
    pub data_layout: DataModuleLayout,
    pub point_count: u32,
    pub column_codes: Vec<u16>,
    pub record_size: usize,
    pub fields: Vec<Field>,
    pub flags: Vec<FlagSummary>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub timestamp: Option<NaiveDateTime>,
    pub loop_index: Option<Vec<u32>>,
    pub modules: Vec<ModuleSummary>,
}

impl MprSummary {
    /// Pretty-printed JSON.
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the summary as JSON to `path`.
    #[cfg(feature = "serde")]
    pub fn save_to_file(&self, path: impl AsRef<std::path::Path>) -> crate::Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read back a summary written by [`MprSummary::save_to_file`].
    #[cfg(feature = "serde")]
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> crate::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

impl MprFile {
    /// Collect the file's metadata into an [`MprSummary`].
    pub fn summary(&self) -> MprSummary {
        MprSummary {
            version: self.version(),
            data_layout: self.data_layout(),
            point_count: self.point_count(),
            column_codes: self.column_codes().to_vec(),
            record_size: self.layout().record_size(),
            fields: self.layout().fields().to_vec(),
            flags: self
                .flags()
                .iter()
                .map(|(name, spec)| FlagSummary {
                    name: name.to_string(),
                    mask: spec.mask,
                    flag_type: spec.flag_type,
                })
                .collect(),
            start_date: self.start_date(),
            end_date: self.end_date(),
            timestamp: self.timestamp(),
            loop_index: self.loop_index().map(<[u32]>::to_vec),
            modules: self.modules().iter().map(ModuleSummary::from).collect(),
        }
    }
}
