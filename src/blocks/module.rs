// module.rs
use super::{
    DATA_SHORTNAME, HEADER_V1_SIZE, HEADER_V2_EXTRA, HEADER_V2_SENTINEL, LOG_SHORTNAME,
    LOOP_SHORTNAME, SETTINGS_SHORTNAME,
};
use crate::{
    Result,
    blocks::common::{read_array, read_u32, trim_padded, validate_buffer_size},
};
use std::borrow::Cow;

/// Which of the two on-disk header layouts a module used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderLayout {
    /// 51-byte header written by older EC-Lab releases.
    V1,
    /// 59-byte header with extra max-length and flag fields (EC-Lab >= 11.50).
    V2,
}

impl HeaderLayout {
    /// Total header size in bytes, not counting the `MODULE` tag.
    pub const fn size(&self) -> usize {
        match self {
            HeaderLayout::V1 => HEADER_V1_SIZE,
            HeaderLayout::V2 => HEADER_V1_SIZE + HEADER_V2_EXTRA,
        }
    }

    /// Select the layout from the first [`HEADER_V1_SIZE`] header bytes.
    ///
    /// Newer files put `0xFFFFFFFF` in the max-length field, which sits where
    /// the v1 layout keeps its length.
    pub fn detect(v1_bytes: &[u8]) -> Result<Self> {
        validate_buffer_size(v1_bytes, HEADER_V1_SIZE, "module header")?;
        if read_u32(v1_bytes, 35) == HEADER_V2_SENTINEL {
            Ok(HeaderLayout::V2)
        } else {
            Ok(HeaderLayout::V1)
        }
    }
}

/// Fixed header preceding every module payload.
///
/// # Structure (all little-endian)
/// | Field | v1 | v2 |
/// |---|---|---|
/// | short name | 10 | 10 |
/// | long name | 25 | 25 |
/// | max length | - | 4 |
/// | length | 4 | 4 |
/// | version | 4 | 4 |
/// | unknown flag | - | 4 |
/// | date | 8 | 8 |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHeader {
    pub layout: HeaderLayout,
    /// Space-padded short name, e.g. `b"VMP data  "`.
    pub shortname: [u8; 10],
    /// Space-padded long name.
    pub longname: [u8; 25],
    /// Only present in v2 headers; always `0xFFFFFFFF` in practice.
    pub max_length: Option<u32>,
    /// Payload length in bytes.
    pub length: u64,
    pub version: u32,
    /// Only present in v2 headers (10 for set, log and loop, 11 for data).
    pub unknown_flag: Option<u32>,
    /// ASCII date, e.g. `b"02/23/17"`.
    pub date: [u8; 8],
}

impl ModuleHeader {
    /// Parse a header from exactly `layout.size()` bytes.
    pub fn from_bytes(bytes: &[u8], layout: HeaderLayout) -> Result<Self> {
        validate_buffer_size(bytes, layout.size(), "module header")?;

        let shortname = read_array::<10>(bytes, 0);
        let longname = read_array::<25>(bytes, 10);

        Ok(match layout {
            HeaderLayout::V1 => Self {
                layout,
                shortname,
                longname,
                max_length: None,
                length: u64::from(read_u32(bytes, 35)),
                version: read_u32(bytes, 39),
                unknown_flag: None,
                date: read_array::<8>(bytes, 43),
            },
            HeaderLayout::V2 => Self {
                layout,
                shortname,
                longname,
                max_length: Some(read_u32(bytes, 35)),
                length: u64::from(read_u32(bytes, 39)),
                version: read_u32(bytes, 43),
                unknown_flag: Some(read_u32(bytes, 47)),
                date: read_array::<8>(bytes, 51),
            },
        })
    }
}

/// Classification of a module by its short name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModuleKind {
    Settings,
    Data,
    Log,
    Loop,
    Other,
}

impl ModuleKind {
    /// Match a padded short name byte-for-byte against the known modules.
    pub fn from_shortname(shortname: &[u8; 10]) -> Self {
        match shortname {
            s if s == SETTINGS_SHORTNAME => ModuleKind::Settings,
            s if s == DATA_SHORTNAME => ModuleKind::Data,
            s if s == LOG_SHORTNAME => ModuleKind::Log,
            s if s == LOOP_SHORTNAME => ModuleKind::Loop,
            _ => ModuleKind::Other,
        }
    }

    /// Human readable label used in error messages.
    pub const fn label(&self) -> &'static str {
        match self {
            ModuleKind::Settings => "VMP Set",
            ModuleKind::Data => "VMP data",
            ModuleKind::Log => "VMP LOG",
            ModuleKind::Loop => "VMP loop",
            ModuleKind::Other => "other",
        }
    }
}

/// One tagged, length-prefixed block of an `.mpr` file.
#[derive(Debug, Clone)]
pub struct Module {
    pub header: ModuleHeader,
    /// Stream offset of the first payload byte.
    pub data_offset: u64,
    /// Payload bytes; empty when the module was read headers-only.
    pub data: Vec<u8>,
}

impl Module {
    /// Short name without padding.
    pub fn short_name(&self) -> Cow<'_, str> {
        trim_padded(&self.header.shortname)
    }

    /// Long name without padding.
    pub fn long_name(&self) -> Cow<'_, str> {
        trim_padded(&self.header.longname)
    }

    pub fn kind(&self) -> ModuleKind {
        ModuleKind::from_shortname(&self.header.shortname)
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Declared payload length.
    pub fn length(&self) -> u64 {
        self.header.length
    }

    /// Raw date field.
    pub fn date(&self) -> &[u8; 8] {
        &self.header.date
    }
}
