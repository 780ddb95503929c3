use crate::{
    Error, Result,
    blocks::{DataModuleHeader, Module, read_u8, read_u16, read_u32, read_u64},
    layout::{FLAGS_FIELD, Field, FlagSpec, FlagsMap, RecordLayout, build_layout},
    types::{ColumnValues, FlagType, ScalarType, Value},
};
use log::debug;

/// Decoded records of a data module.
///
/// Records are kept as the flat byte buffer they were stored in; values are
/// decoded on access using the field offsets of the [`RecordLayout`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    layout: RecordLayout,
    flags: FlagsMap,
    bytes: Vec<u8>,
    rows: usize,
}

impl DataTable {
    /// Wrap a buffer of densely packed records.
    ///
    /// # Arguments
    /// * `records` - Record bytes, starting at the first record.
    /// * `layout` - Layout of one record.
    /// * `flags` - Flags packed into the layout's `flags` field.
    ///
    /// # Returns
    /// The table, or [`Error::RecordAlignment`] if `records` is not a whole
    /// number of records.
    pub fn from_records(records: &[u8], layout: RecordLayout, flags: FlagsMap) -> Result<Self> {
        let record_size = layout.record_size();
        let aligned = if record_size == 0 {
            records.is_empty()
        } else {
            records.len() % record_size == 0
        };
        if !aligned {
            return Err(Error::RecordAlignment {
                payload_len: records.len(),
                record_size,
            });
        }
        let rows = records.len().checked_div(record_size).unwrap_or(0);
        Ok(Self {
            layout,
            flags,
            bytes: records.to_vec(),
            rows,
        })
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    pub fn flags(&self) -> &FlagsMap {
        &self.flags
    }

    /// Raw bytes of all records.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Row at `index`, if in range.
    pub fn row(&self, index: usize) -> Option<Record<'_>> {
        if index >= self.rows {
            return None;
        }
        let size = self.layout.record_size();
        Some(Record {
            table: self,
            index,
            bytes: &self.bytes[index * size..(index + 1) * size],
        })
    }

    /// Iterate over all rows in order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = Record<'_>> + '_ {
        let size = self.layout.record_size();
        (0..self.rows).map(move |index| Record {
            table: self,
            index,
            bytes: &self.bytes[index * size..(index + 1) * size],
        })
    }

    /// Decode one field for every row.
    ///
    /// Returns `None` if no field is called `name`. Flags are not fields;
    /// use [`DataTable::flag`] for those.
    pub fn column(&self, name: &str) -> Option<ColumnValues> {
        let field = self.layout.field(name)?;
        Some(self.decode_column(field))
    }

    /// Extract one flag for every row.
    ///
    /// `mode`-style flags yield the masked byte, boolean flags whether any
    /// masked bit is set.
    pub fn flag(&self, name: &str) -> Result<ColumnValues> {
        let spec = self
            .flags
            .get(name)
            .ok_or_else(|| Error::FlagNotPresent(name.to_string()))?;
        let field = self
            .layout
            .field(FLAGS_FIELD)
            .ok_or_else(|| Error::FieldNotPresent(FLAGS_FIELD.to_string()))?;
        let masked = self.rows().map(|r| read_u8(r.bytes, field.offset) & spec.mask);
        Ok(match spec.flag_type {
            FlagType::U8 => ColumnValues::U8(masked.collect()),
            FlagType::Bool => ColumnValues::Bool(masked.map(|b| b != 0).collect()),
        })
    }

    /// A field or a flag by name, fields first.
    pub fn values(&self, name: &str) -> Result<ColumnValues> {
        match self.column(name) {
            Some(values) => Ok(values),
            None if self.flags.get(name).is_some() => self.flag(name),
            None => Err(Error::FieldNotPresent(name.to_string())),
        }
    }

    /// Copy of this table limited to the first `n` rows.
    pub fn truncated(&self, n: usize) -> Self {
        let rows = n.min(self.rows);
        Self {
            layout: self.layout.clone(),
            flags: self.flags.clone(),
            bytes: self.bytes[..rows * self.layout.record_size()].to_vec(),
            rows,
        }
    }

    fn decode_column(&self, field: &Field) -> ColumnValues {
        let records = self.rows().map(|r| r.bytes);
        let offset = field.offset;
        match field.scalar_type {
            ScalarType::U8 => ColumnValues::U8(records.map(|b| read_u8(b, offset)).collect()),
            ScalarType::U16 => ColumnValues::U16(records.map(|b| read_u16(b, offset)).collect()),
            ScalarType::U32 => ColumnValues::U32(records.map(|b| read_u32(b, offset)).collect()),
            ScalarType::F32 => ColumnValues::F32(
                records
                    .map(|b| f32::from_bits(read_u32(b, offset)))
                    .collect(),
            ),
            ScalarType::F64 => ColumnValues::F64(
                records
                    .map(|b| f64::from_bits(read_u64(b, offset)))
                    .collect(),
            ),
        }
    }
}

/// One row of a [`DataTable`].
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    table: &'a DataTable,
    index: usize,
    bytes: &'a [u8],
}

impl<'a> Record<'a> {
    /// Row number within the table.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Raw record bytes.
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// A field or flag of this row.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(field) = self.table.layout.field(name) {
            return Some(decode_value(self.bytes, field));
        }
        let spec = self.table.flags.get(name)?;
        let flags_field = self.table.layout.field(FLAGS_FIELD)?;
        Some(flag_value(read_u8(self.bytes, flags_field.offset), spec))
    }

    /// Every field of this row in layout order.
    pub fn values(&self) -> impl Iterator<Item = (&'a str, Value)> + '_ {
        let (table, bytes) = (self.table, self.bytes);
        table
            .layout
            .fields()
            .iter()
            .map(move |f| (f.name.as_str(), decode_value(bytes, f)))
    }
}

fn decode_value(record: &[u8], field: &Field) -> Value {
    let offset = field.offset;
    match field.scalar_type {
        ScalarType::U8 => Value::U8(read_u8(record, offset)),
        ScalarType::U16 => Value::U16(read_u16(record, offset)),
        ScalarType::U32 => Value::U32(read_u32(record, offset)),
        ScalarType::F32 => Value::F32(f32::from_bits(read_u32(record, offset))),
        ScalarType::F64 => Value::F64(f64::from_bits(read_u64(record, offset))),
    }
}

fn flag_value(flags: u8, spec: FlagSpec) -> Value {
    let masked = flags & spec.mask;
    match spec.flag_type {
        FlagType::U8 => Value::U8(masked),
        FlagType::Bool => Value::Bool(masked != 0),
    }
}

/// Decode the `VMP data` module.
///
/// Parses the fixed header, builds the record layout from the column codes
/// and checks that the number of decoded records matches the declared point
/// count.
pub fn decode_data_module(module: &Module) -> Result<(DataModuleHeader, DataTable)> {
    let payload = &module.data;
    let header = DataModuleHeader::from_bytes(payload, module.version())?;
    debug!(
        "data module: {:?} layout, {} points, column codes {:?}",
        header.layout, header.point_count, header.column_codes
    );

    let (layout, flags) = build_layout(&header.column_codes)?;
    let table = DataTable::from_records(header.records(payload), layout, flags)?;

    if table.len() != header.point_count as usize {
        return Err(Error::PointCountMismatch {
            declared: header.point_count,
            decoded: table.len(),
        });
    }
    Ok((header, table))
}
