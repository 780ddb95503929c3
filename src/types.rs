//! Shared value types used across the library.
//!
//! [`ScalarType`] describes how one field of a data record is stored,
//! [`FlagType`] how a bit-packed flag is presented once extracted, and
//! [`Value`] / [`ColumnValues`] carry decoded data.

use core::fmt;

/// Binary representation of one field in a data record.
///
/// All multi-byte types are little-endian in `.mpr` files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScalarType {
    /// 1-byte unsigned integer
    U8,
    /// 2-byte unsigned integer
    U16,
    /// 4-byte unsigned integer
    U32,
    /// 4-byte IEEE float
    F32,
    /// 8-byte IEEE float
    F64,
}

impl ScalarType {
    /// Size in bytes of one value of this type.
    #[inline]
    pub const fn size(&self) -> usize {
        match self {
            ScalarType::U8 => 1,
            ScalarType::U16 => 2,
            ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::F64 => 8,
        }
    }

    /// Returns true for the floating point types.
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarType::U8 => write!(f, "u8"),
            ScalarType::U16 => write!(f, "u16 (LE)"),
            ScalarType::U32 => write!(f, "u32 (LE)"),
            ScalarType::F32 => write!(f, "f32 (LE)"),
            ScalarType::F64 => write!(f, "f64 (LE)"),
        }
    }
}

/// How a flag extracted from the shared flags byte is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlagType {
    /// The masked bits as a small integer (e.g. `mode`).
    U8,
    /// Whether any masked bit is set.
    Bool,
}

/// A single decoded value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    U8(u8),
    U16(u16),
    U32(u32),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl Value {
    /// Widen to f64, useful for numeric comparisons.
    pub fn as_f64(&self) -> f64 {
        match *self {
            Value::U8(v) => v as f64,
            Value::U16(v) => v as f64,
            Value::U32(v) => v as f64,
            Value::F32(v) => v as f64,
            Value::F64(v) => v,
            Value::Bool(v) => {
                if v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::U8(v) => write!(f, "{v}"),
            Value::U16(v) => write!(f, "{v}"),
            Value::U32(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{}", u8::from(*v)),
        }
    }
}

/// A whole decoded column.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValues {
    U8(Vec<u8>),
    U16(Vec<u16>),
    U32(Vec<u32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
}

impl ColumnValues {
    /// Number of values in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnValues::U8(v) => v.len(),
            ColumnValues::U16(v) => v.len(),
            ColumnValues::U32(v) => v.len(),
            ColumnValues::F32(v) => v.len(),
            ColumnValues::F64(v) => v.len(),
            ColumnValues::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<Value> {
        match self {
            ColumnValues::U8(v) => v.get(index).copied().map(Value::U8),
            ColumnValues::U16(v) => v.get(index).copied().map(Value::U16),
            ColumnValues::U32(v) => v.get(index).copied().map(Value::U32),
            ColumnValues::F32(v) => v.get(index).copied().map(Value::F32),
            ColumnValues::F64(v) => v.get(index).copied().map(Value::F64),
            ColumnValues::Bool(v) => v.get(index).copied().map(Value::Bool),
        }
    }

    /// Every value widened to f64.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        (0..self.len())
            .filter_map(|i| self.get(i))
            .map(|v| v.as_f64())
            .collect()
    }
}
