//! Record layouts built from column code sequences.
//!
//! The type of a data record is only known once the column codes have been
//! read, so the layout is a runtime list of named fields with computed byte
//! offsets rather than a Rust struct.

use crate::{
    Error, Result,
    columns::{ColumnKind, ColumnRegistry},
    types::{FlagType, ScalarType},
};
use log::debug;
use std::collections::HashMap;

/// Name of the shared byte holding every flag column.
pub const FLAGS_FIELD: &str = "flags";

/// One field of a data record.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    /// Unique name; repeats get a ` 2`, ` 3`, ... suffix.
    pub name: String,
    pub scalar_type: ScalarType,
    /// Byte offset within the record.
    pub offset: usize,
}

impl Field {
    pub fn size(&self) -> usize {
        self.scalar_type.size()
    }
}

/// Ordered fields of one data record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordLayout {
    fields: Vec<Field>,
    record_size: usize,
}

impl RecordLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field at the end of the record.
    pub fn push(&mut self, name: impl Into<String>, scalar_type: ScalarType) {
        self.fields.push(Field {
            name: name.into(),
            scalar_type,
            offset: self.record_size,
        });
        self.record_size += scalar_type.size();
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Field names in record order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Size in bytes of one record.
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Where a flag lives within the flags byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagSpec {
    pub mask: u8,
    pub flag_type: FlagType,
}

/// Flag name to bitmask, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FlagsMap {
    entries: Vec<(String, FlagSpec)>,
}

impl FlagsMap {
    /// Insert or overwrite a flag. An overwritten entry keeps its position.
    pub fn insert(&mut self, name: &str, spec: FlagSpec) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some(entry) => entry.1 = spec,
            None => self.entries.push((name.to_string(), spec)),
        }
    }

    pub fn get(&self, name: &str) -> Option<FlagSpec> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, spec)| spec)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, FlagSpec)> {
        self.entries.iter().map(|(n, s)| (n.as_str(), *s))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Build the record layout and flags map described by `codes`.
///
/// The first flag code places a single `flags` byte; later flag codes only
/// add map entries. A repeated flag code overwrites its entry rather than
/// allocating another byte. Repeated scalar names are suffixed with their
/// 1-based occurrence count.
pub fn build_layout(codes: &[u16]) -> Result<(RecordLayout, FlagsMap)> {
    let registry = ColumnRegistry::for_codes(codes);
    let mut layout = RecordLayout::new();
    let mut flags = FlagsMap::default();
    let mut name_counts: HashMap<&'static str, usize> = HashMap::new();
    let mut flags_placed = false;

    for &code in codes {
        match registry.lookup(code) {
            Some(ColumnKind::Flag {
                name,
                mask,
                flag_type,
            }) => {
                if !flags_placed {
                    layout.push(FLAGS_FIELD, ScalarType::U8);
                    flags_placed = true;
                }
                flags.insert(name, FlagSpec { mask, flag_type });
            }
            Some(ColumnKind::Scalar { name, scalar_type }) => {
                let count = name_counts.entry(name).or_insert(0);
                *count += 1;
                if *count > 1 {
                    layout.push(format!("{name} {count}"), scalar_type);
                } else {
                    layout.push(name, scalar_type);
                }
            }
            None => {
                return Err(Error::UnknownColumn {
                    code,
                    previous: layout.fields().last().map(|f| f.name.clone()),
                });
            }
        }
    }

    debug!(
        "built {}-byte record layout from {} codes{}",
        layout.record_size(),
        codes.len(),
        if registry.is_stack_mode() {
            " (stack mode)"
        } else {
            ""
        }
    );
    Ok((layout, flags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(codes: &[u16]) -> Vec<(String, ScalarType)> {
        let (layout, _) = build_layout(codes).unwrap();
        layout
            .fields()
            .iter()
            .map(|f| (f.name.clone(), f.scalar_type))
            .collect()
    }

    fn owned(v: &[(&str, ScalarType)]) -> Vec<(String, ScalarType)> {
        v.iter().map(|&(n, t)| (n.to_string(), t)).collect()
    }

    #[test]
    fn only_flags_gives_one_byte() {
        assert_eq!(fields(&[1, 2, 3]), owned(&[("flags", ScalarType::U8)]));
    }

    #[test]
    fn plain_scalars() {
        assert_eq!(
            fields(&[4, 6]),
            owned(&[("time/s", ScalarType::F64), ("Ewe/V", ScalarType::F32)])
        );
    }

    #[test]
    fn flags_byte_sits_at_first_flag_position() {
        assert_eq!(
            fields(&[1, 4, 21]),
            owned(&[("flags", ScalarType::U8), ("time/s", ScalarType::F64)])
        );
        let (layout, flags) = build_layout(&[4, 1, 6, 21]).unwrap();
        assert_eq!(layout.names().collect::<Vec<_>>(), ["time/s", "flags", "Ewe/V"]);
        assert_eq!(layout.field("flags").unwrap().offset, 8);
        assert_eq!(flags.names().collect::<Vec<_>>(), ["mode", "control changes"]);
    }

    #[test]
    fn repeated_names_are_suffixed() {
        assert_eq!(
            fields(&[4, 6, 4]),
            owned(&[
                ("time/s", ScalarType::F64),
                ("Ewe/V", ScalarType::F32),
                ("time/s 2", ScalarType::F64),
            ])
        );
        // different codes, same name
        assert_eq!(
            fields(&[11, 76, 11]),
            owned(&[
                ("<I>/mA", ScalarType::F64),
                ("<I>/mA 2", ScalarType::F32),
                ("<I>/mA 3", ScalarType::F64),
            ])
        );
    }

    #[test]
    fn repeated_flag_code_overwrites_entry() {
        // No second flags byte is allocated for a repeated flag code.
        let (layout, flags) = build_layout(&[1, 2, 4, 2]).unwrap();
        assert_eq!(layout.record_size(), 9);
        assert_eq!(flags.len(), 2);
        assert_eq!(flags.names().collect::<Vec<_>>(), ["mode", "ox/red"]);
        assert_eq!(flags.get("ox/red").unwrap().mask, 0x04);
    }

    #[test]
    fn offsets_accumulate() {
        let (layout, _) = build_layout(&[1, 4, 6, 39, 509]).unwrap();
        let offsets: Vec<usize> = layout.fields().iter().map(|f| f.offset).collect();
        assert_eq!(offsets, vec![0, 1, 9, 13, 15]);
        assert_eq!(layout.record_size(), 16);
    }

    #[test]
    fn unknown_code_reports_previous_column() {
        let err = build_layout(&[4, 9999]).unwrap_err();
        match err {
            Error::UnknownColumn { code, previous } => {
                assert_eq!(code, 9999);
                assert_eq!(previous.as_deref(), Some("time/s"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_first_code() {
        let err = build_layout(&[9999, 4]).unwrap_err();
        assert!(matches!(err, Error::UnknownColumn { previous: None, .. }));
    }

    #[test]
    fn per_cell_codes_decode_without_a_marker() {
        let (layout, _) = build_layout(&[4, 391, 242]).unwrap();
        assert_eq!(
            layout.names().collect::<Vec<_>>(),
            ["time/s", "<E1>/V", "|E2|/V"]
        );
        assert_eq!(layout.record_size(), 16);
    }

    #[test]
    fn stack_level_codes_need_a_marker() {
        assert!(build_layout(&[4, 163]).is_ok());
        let (layout, _) = build_layout(&[4, 391, 426]).unwrap();
        assert_eq!(
            layout.names().collect::<Vec<_>>(),
            ["time/s", "<E1>/V", "<Estack>/V"]
        );
    }

    #[test]
    fn empty_sequence_is_empty_layout() {
        let (layout, flags) = build_layout(&[]).unwrap();
        assert!(layout.is_empty());
        assert!(flags.is_empty());
        assert_eq!(layout.record_size(), 0);
    }
}
