// data_module.rs
use crate::{
    Error, Result,
    blocks::common::{first_nonzero, read_u8, read_u16, read_u32, validate_buffer_size},
};

/// Offset of the column code array inside the data module payload.
const COLUMN_CODES_OFFSET: usize = 5;

/// Layout of the fixed header at the start of a data module payload.
///
/// Each variant fixes where the column codes are, how wide each code is and
/// where the records start. The variant is chosen once per data module by
/// [`DataModuleLayout::detect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DataModuleLayout {
    /// Version 0 with one byte per column code; records at byte 100.
    V0Compact,
    /// Version 0 with each code stored as a zero byte followed by the code;
    /// records at byte 1007.
    V0Padded,
    /// Version 1: u16 codes, records at byte 195.
    V1,
    /// Version 2: u16 codes, records at byte 405.
    V2,
    /// Version 3: as version 2 plus one marker byte, records at byte 406.
    V3,
}

impl DataModuleLayout {
    /// Choose the layout for a data module from its version and payload.
    ///
    /// For version 0 the sub-variant is decided by byte 5: files that pad
    /// each code with a leading zero have a zero there. This is a
    /// reverse-engineered rule with no documented basis.
    pub fn detect(version: u32, payload: &[u8]) -> Result<Self> {
        match version {
            0 => {
                validate_buffer_size(payload, COLUMN_CODES_OFFSET + 1, "data module header")?;
                if read_u8(payload, COLUMN_CODES_OFFSET) != 0 {
                    Ok(DataModuleLayout::V0Compact)
                } else {
                    Ok(DataModuleLayout::V0Padded)
                }
            }
            1 => Ok(DataModuleLayout::V1),
            2 => Ok(DataModuleLayout::V2),
            3 => Ok(DataModuleLayout::V3),
            other => Err(Error::UnsupportedDataVersion(other)),
        }
    }

    /// Bytes occupied by each column code.
    pub const fn code_width(&self) -> usize {
        match self {
            DataModuleLayout::V0Compact => 1,
            _ => 2,
        }
    }

    /// End (exclusive) of the region that must be zero after the codes.
    pub const fn header_end(&self) -> usize {
        match self {
            DataModuleLayout::V0Compact => 100,
            DataModuleLayout::V0Padded => 1006,
            DataModuleLayout::V1 => 195,
            DataModuleLayout::V2 | DataModuleLayout::V3 => 405,
        }
    }

    /// Offset of the first record.
    pub const fn data_start(&self) -> usize {
        match self {
            DataModuleLayout::V0Compact => 100,
            DataModuleLayout::V0Padded => 1007,
            DataModuleLayout::V1 => 195,
            DataModuleLayout::V2 => 405,
            DataModuleLayout::V3 => 406,
        }
    }

    /// Start of the zero-checked region for `n_columns` codes.
    ///
    /// In padded files the byte straight after the code array is sometimes
    /// `1`, so checking starts one byte later.
    const fn zero_region_start(&self, n_columns: usize) -> usize {
        let codes_end = COLUMN_CODES_OFFSET + self.code_width() * n_columns;
        match self {
            DataModuleLayout::V0Padded => codes_end + 1,
            _ => codes_end,
        }
    }

    fn read_code(&self, payload: &[u8], index: usize) -> u16 {
        let offset = COLUMN_CODES_OFFSET + self.code_width() * index;
        match self {
            DataModuleLayout::V0Compact => u16::from(read_u8(payload, offset)),
            DataModuleLayout::V0Padded => u16::from(read_u8(payload, offset + 1)),
            _ => read_u16(payload, offset),
        }
    }
}

/// Decoded fixed header of the data module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataModuleHeader {
    pub layout: DataModuleLayout,
    /// Number of records the module declares.
    pub point_count: u32,
    /// Column codes in record order.
    pub column_codes: Vec<u16>,
}

impl DataModuleHeader {
    /// Parse the header of a data module payload.
    ///
    /// Fails if the version is unknown, the payload is shorter than the
    /// fixed header, or any reserved header byte is non-zero.
    pub fn from_bytes(payload: &[u8], version: u32) -> Result<Self> {
        validate_buffer_size(payload, COLUMN_CODES_OFFSET, "data module header")?;
        let point_count = read_u32(payload, 0);
        let n_columns = usize::from(read_u8(payload, 4));

        let layout = DataModuleLayout::detect(version, payload)?;
        let zero_start = layout.zero_region_start(n_columns);
        if zero_start > layout.header_end() {
            return Err(Error::ColumnArrayOverflow {
                columns: n_columns,
                header_len: layout.header_end(),
            });
        }
        validate_buffer_size(payload, layout.data_start(), "data module header")?;

        let column_codes = (0..n_columns)
            .map(|i| layout.read_code(payload, i))
            .collect();

        if let Some((offset, value)) = first_nonzero(payload, zero_start, layout.header_end()) {
            return Err(Error::NonZeroHeader { offset, value });
        }

        Ok(Self {
            layout,
            point_count,
            column_codes,
        })
    }

    /// The record bytes following the fixed header.
    pub fn records<'a>(&self, payload: &'a [u8]) -> &'a [u8] {
        payload.get(self.layout.data_start()..).unwrap_or(&[])
    }
}
