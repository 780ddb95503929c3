mod common;

use chrono::{NaiveDate, Timelike};
use common::{FEB_23_2017_NOON, MprBuilder, record, sample};
use galvani_rs::{
    ColumnValues, Error, ErrorKind, MprFile, Result, ScalarType, Value, blocks::DataModuleLayout,
};

fn full_file() -> Vec<u8> {
    let s = sample();
    MprBuilder::new()
        .settings(b"02/23/17")
        .data(2, &s.codes, 3, &s.records)
        .log(b"02/24/17", 465, FEB_23_2017_NOON)
        .loop_index(&[0, 2])
        .build()
}

#[test]
fn reads_complete_file() -> Result<()> {
    let mpr = MprFile::from_bytes(&full_file())?;
    let s = sample();

    assert_eq!(mpr.version(), 2);
    assert_eq!(mpr.point_count(), 3);
    assert_eq!(mpr.column_codes(), s.codes.as_slice());
    assert_eq!(mpr.data_layout(), DataModuleLayout::V2);
    assert_eq!(mpr.modules().len(), 4);

    let names: Vec<&str> = mpr.layout().names().collect();
    assert_eq!(
        names,
        ["flags", "time/s", "Ewe/V", "I/mA", "cycle number", "I Range"]
    );
    assert_eq!(mpr.layout().record_size(), 1 + 8 + 4 + 4 + 8 + 2);

    assert_eq!(mpr.column("time/s"), Some(ColumnValues::F64(s.time)));
    assert_eq!(mpr.column("Ewe/V"), Some(ColumnValues::F32(s.ewe)));
    assert_eq!(mpr.column("I/mA"), Some(ColumnValues::F32(s.current)));
    assert_eq!(mpr.column("I Range"), Some(ColumnValues::U16(s.i_range)));
    assert_eq!(mpr.flag("mode")?, ColumnValues::U8(vec![1, 2, 3]));
    assert_eq!(
        mpr.flag("ox/red")?,
        ColumnValues::Bool(vec![true, false, false])
    );
    assert_eq!(
        mpr.flag("error")?,
        ColumnValues::Bool(vec![false, false, true])
    );
    assert_eq!(
        mpr.flag("control changes")?,
        ColumnValues::Bool(vec![false, true, false])
    );

    assert_eq!(mpr.start_date(), NaiveDate::from_ymd_opt(2017, 2, 23));
    assert_eq!(mpr.end_date(), NaiveDate::from_ymd_opt(2017, 2, 24));
    let timestamp = mpr.timestamp().unwrap();
    assert_eq!(timestamp.date(), NaiveDate::from_ymd_opt(2017, 2, 23).unwrap());
    assert_eq!(timestamp.hour(), 12);
    assert_eq!(mpr.loop_index(), Some(&[0u32, 2][..]));
    Ok(())
}

#[test]
fn record_access() -> Result<()> {
    let mpr = MprFile::from_bytes(&full_file())?;
    let row = mpr.data().row(2).unwrap();
    assert_eq!(row.get("time/s"), Some(Value::F64(2.5)));
    assert_eq!(row.get("mode"), Some(Value::U8(3)));
    assert_eq!(row.get("error"), Some(Value::Bool(true)));
    assert_eq!(row.get("Q charge/mA.h"), None);
    assert_eq!(mpr.data().rows().count(), 3);
    Ok(())
}

#[test]
fn optional_modules_may_be_absent() -> Result<()> {
    let s = sample();
    let bytes = MprBuilder::new().data(1, &s.codes, 3, &s.records).build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.data_layout(), DataModuleLayout::V1);
    assert_eq!(mpr.start_date(), None);
    assert_eq!(mpr.end_date(), None);
    assert_eq!(mpr.timestamp(), None);
    assert_eq!(mpr.loop_index(), None);
    Ok(())
}

#[test]
fn every_data_version() -> Result<()> {
    let rec = record(&[Value::F64(1.5), Value::F32(0.25)]);
    for (version, layout) in [
        (0, DataModuleLayout::V0Compact),
        (1, DataModuleLayout::V1),
        (2, DataModuleLayout::V2),
        (3, DataModuleLayout::V3),
    ] {
        let bytes = MprBuilder::new().data(version, &[4, 6], 1, &rec).build();
        let mpr = MprFile::from_bytes(&bytes)?;
        assert_eq!(mpr.data_layout(), layout);
        assert_eq!(mpr.column("time/s"), Some(ColumnValues::F64(vec![1.5])));
        assert_eq!(mpr.column("Ewe/V"), Some(ColumnValues::F32(vec![0.25])));
    }
    Ok(())
}

#[test]
fn padded_version_zero() -> Result<()> {
    let rec = record(&[Value::U8(1), Value::F64(7.0)]);
    let payload = common::data_payload_v0_padded(&[1, 4], 1, &rec);
    let bytes = MprBuilder::new()
        .module(b"VMP data  ", payload, |_| {})
        .build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.data_layout(), DataModuleLayout::V0Padded);
    assert_eq!(mpr.column_codes(), &[1, 4]);
    assert_eq!(mpr.column("time/s"), Some(ColumnValues::F64(vec![7.0])));
    Ok(())
}

#[test]
fn v2_headers() -> Result<()> {
    let s = sample();
    let bytes = MprBuilder::new()
        .v2_headers()
        .settings(b"02/23/17")
        .data(3, &s.codes, 3, &s.records)
        .log(b"02/23/17", 585, FEB_23_2017_NOON)
        .build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.point_count(), 3);
    assert!(
        mpr.modules()
            .iter()
            .all(|m| m.header.unknown_flag.is_some())
    );
    assert!(mpr.timestamp().is_some());
    Ok(())
}

#[test]
fn repeated_columns_are_suffixed() -> Result<()> {
    let rec = record(&[Value::F64(1.0), Value::F32(2.0), Value::F64(3.0)]);
    let bytes = MprBuilder::new().data(2, &[4, 6, 4], 1, &rec).build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.column("time/s 2"), Some(ColumnValues::F64(vec![3.0])));
    let field = mpr.layout().field("time/s 2").unwrap();
    assert_eq!(field.scalar_type, ScalarType::F64);
    assert_eq!(field.offset, 12);
    Ok(())
}

#[test]
fn stack_mode_columns() -> Result<()> {
    let rec = record(&[Value::F64(1.0), Value::F32(0.5), Value::F32(4.0)]);
    let bytes = MprBuilder::new().data(2, &[4, 391, 426], 1, &rec).build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.column("<E1>/V"), Some(ColumnValues::F32(vec![0.5])));
    assert_eq!(mpr.column("<Estack>/V"), Some(ColumnValues::F32(vec![4.0])));
    Ok(())
}

#[test]
fn many_points() -> Result<()> {
    let mut records = Vec::new();
    for i in 0..958 {
        records.extend(record(&[Value::F64(f64::from(i) * 0.5), Value::F32(3.0)]));
    }
    let bytes = MprBuilder::new().data(2, &[4, 6], 958, &records).build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.point_count(), 958);
    assert_eq!(mpr.data().len(), 958);
    assert_eq!(mpr.data().row(957).unwrap().get("time/s"), Some(Value::F64(478.5)));
    Ok(())
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn invalid_magic() {
    let mut bytes = full_file();
    bytes[0] = b'X';
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
    assert!(err.to_string().contains("XIO-LOGIC"));

    let err = MprFile::from_bytes(b"BIO").unwrap_err();
    assert!(matches!(err, Error::InvalidMagic { found } if found == b"BIO"));
}

#[test]
fn missing_and_duplicate_modules() {
    let err = MprFile::from_bytes(&MprBuilder::new().settings(b"02/23/17").build()).unwrap_err();
    assert!(matches!(err, Error::MissingModule(_)));

    let rec = record(&[Value::F64(1.0)]);
    let bytes = MprBuilder::new()
        .data(2, &[4], 1, &rec)
        .data(2, &[4], 1, &rec)
        .build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, Error::DuplicateModule("VMP data")));
    assert_eq!(err.kind(), ErrorKind::Format);

    let bytes = MprBuilder::new()
        .data(2, &[4], 1, &rec)
        .loop_index(&[0])
        .loop_index(&[0])
        .build();
    assert!(matches!(
        MprFile::from_bytes(&bytes),
        Err(Error::DuplicateModule("VMP loop"))
    ));
}

#[test]
fn truncated_module_reports_name_and_sizes() {
    let s = sample();
    let bytes = MprBuilder::new().data(2, &s.codes, 3, &s.records).build();
    let cut = &bytes[..bytes.len() - 10];
    let err = MprFile::from_bytes(cut).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncation);
    let msg = err.to_string();
    assert!(msg.contains("VMP data"), "{msg}");
    let payload_len = 405 + s.records.len();
    assert!(msg.contains(&payload_len.to_string()), "{msg}");
    assert!(msg.contains(&(payload_len - 10).to_string()), "{msg}");
}

#[test]
fn point_count_mismatch() {
    let s = sample();
    let bytes = MprBuilder::new().data(2, &s.codes, 4, &s.records).build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert!(matches!(
        err,
        Error::PointCountMismatch {
            declared: 4,
            decoded: 3
        }
    ));
    assert_eq!(err.kind(), ErrorKind::CountMismatch);
}

#[test]
fn unknown_column_code() {
    let bytes = MprBuilder::new().data(2, &[4, 9999], 0, &[]).build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownColumn);
    assert_eq!(
        err.to_string(),
        "Column ID 9999 after column time/s is unknown"
    );
}

#[test]
fn unsupported_versions() {
    let bytes = MprBuilder::new().data(2, &[4], 0, &[]).build();
    // patch the data module version field (v1 header: tag 6 + 39)
    let mut patched = bytes.clone();
    let version_at = 52 + 6 + 39;
    patched[version_at..version_at + 4].copy_from_slice(&5u32.to_le_bytes());
    assert!(matches!(
        MprFile::from_bytes(&patched),
        Err(Error::UnsupportedDataVersion(5))
    ));

    let bytes = MprBuilder::new()
        .data(2, &[4], 0, &[])
        .module(b"VMP loop  ", common::loop_payload(&[0, 1], 0), |m| {
            m.version = 1;
        })
        .build();
    assert!(matches!(
        MprFile::from_bytes(&bytes),
        Err(Error::UnsupportedLoopVersion(1))
    ));
}

#[test]
fn nonzero_header_byte() {
    let bytes = MprBuilder::new().data(2, &[4], 0, &[]).build();
    let mut patched = bytes.clone();
    // payload starts after magic, tag and v1 header; byte 300 of the payload
    patched[52 + 6 + 51 + 300] = 0x42;
    let err = MprFile::from_bytes(&patched).unwrap_err();
    assert!(matches!(
        err,
        Error::NonZeroHeader {
            offset: 300,
            value: 0x42
        }
    ));
}

#[test]
fn date_mismatch_is_detected() {
    let s = sample();
    let bytes = MprBuilder::new()
        .settings(b"02/22/17")
        .data(2, &s.codes, 3, &s.records)
        .log(b"02/24/17", 469, FEB_23_2017_NOON)
        .build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Consistency);
    let msg = err.to_string();
    assert!(msg.contains("2017-02-22"), "{msg}");
    assert!(msg.contains("2017-02-24"), "{msg}");
    assert!(msg.contains("2017-02-23 12:00:00"), "{msg}");
}

#[test]
fn date_check_can_be_disabled() -> Result<()> {
    let s = sample();
    let bytes = MprBuilder::new()
        .settings(b"02/22/17")
        .data(2, &s.codes, 3, &s.records)
        .log(b"02/24/17", 469, FEB_23_2017_NOON)
        .build();
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("mismatch.mpr");
    std::fs::write(&path, &bytes)?;

    assert!(MprFile::open(&path).is_err());
    let mpr = MprFile::open_with(&path, |opts| opts.check_dates = false)?;
    assert_eq!(mpr.start_date(), NaiveDate::from_ymd_opt(2017, 2, 22));
    Ok(())
}

#[test]
fn nul_padded_module_dates() -> Result<()> {
    let s = sample();
    let bytes = MprBuilder::new()
        .settings(b"2/3/17\0\0")
        .data(2, &s.codes, 3, &s.records)
        .log(b"2/3/17\0\0", 465, FEB_23_2017_NOON - 20.0)
        .build();
    let mpr = MprFile::from_bytes(&bytes)?;
    assert_eq!(mpr.start_date(), NaiveDate::from_ymd_opt(2017, 2, 3));
    assert_eq!(mpr.end_date(), NaiveDate::from_ymd_opt(2017, 2, 3));
    Ok(())
}

#[test]
fn bad_dates_and_timestamps() {
    let s = sample();
    let bytes = MprBuilder::new()
        .settings(b"13.08.07")
        .data(2, &s.codes, 3, &s.records)
        .build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DateParse);
    assert!(err.to_string().contains("13.08.07"));

    let bytes = MprBuilder::new()
        .data(2, &s.codes, 3, &s.records)
        .log(b"02/24/17", 465, 1.0)
        .build();
    let err = MprFile::from_bytes(&bytes).unwrap_err();
    assert!(matches!(err, Error::TimestampNotFound { .. }));
}

#[cfg(feature = "serde")]
#[test]
fn summary_json() -> Result<()> {
    let mpr = MprFile::from_bytes(&full_file())?;
    let summary = mpr.summary();
    assert_eq!(summary.point_count, 3);
    assert_eq!(summary.fields.len(), 6);
    assert_eq!(summary.flags.len(), 4);
    assert_eq!(summary.modules[1].short_name, "VMP data");

    let json = summary.to_json()?;
    assert!(json.contains("\"point_count\": 3"));
    assert!(json.contains("2017-02-23"));

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("summary.json");
    summary.save_to_file(&path)?;
    let loaded = galvani_rs::MprSummary::load_from_file(&path)?;
    assert_eq!(loaded, summary);
    Ok(())
}
