//! Builders for synthetic `.mpr` images and matching text files.
#![allow(dead_code)]

use galvani_rs::{Value, blocks::MPR_MAGIC};

/// 2017-02-23 12:00:00 as an OLE day count.
pub const FEB_23_2017_NOON: f64 = 42789.5;

/// Encode one record from its field values, in layout order.
pub fn record(values: &[Value]) -> Vec<u8> {
    let mut out = Vec::new();
    for value in values {
        match *value {
            Value::U8(v) => out.push(v),
            Value::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::F32(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::F64(v) => out.extend_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => out.push(u8::from(v)),
        }
    }
    out
}

/// Fixed header size of a data module for `version` (version 0 compact).
pub fn data_start(version: u32) -> usize {
    match version {
        0 => 100,
        1 => 195,
        2 => 405,
        3 => 406,
        other => panic!("no layout for data version {other}"),
    }
}

/// Payload of a data module in the given version.
///
/// Version 0 uses one byte per code; see [`data_payload_v0_padded`] for the
/// other version 0 variant.
pub fn data_payload(version: u32, codes: &[u16], point_count: u32, records: &[u8]) -> Vec<u8> {
    let mut p = vec![0u8; data_start(version)];
    p[0..4].copy_from_slice(&point_count.to_le_bytes());
    p[4] = codes.len() as u8;
    for (i, &code) in codes.iter().enumerate() {
        if version == 0 {
            p[5 + i] = code as u8;
        } else {
            p[5 + 2 * i..7 + 2 * i].copy_from_slice(&code.to_le_bytes());
        }
    }
    if version == 3 {
        p[405] = 1;
    }
    p.extend_from_slice(records);
    p
}

/// Version 0 payload with each code stored as a zero byte then the code.
pub fn data_payload_v0_padded(codes: &[u8], point_count: u32, records: &[u8]) -> Vec<u8> {
    let mut p = vec![0u8; 1007];
    p[0..4].copy_from_slice(&point_count.to_le_bytes());
    p[4] = codes.len() as u8;
    for (i, &code) in codes.iter().enumerate() {
        p[6 + 2 * i] = code;
    }
    p[5 + 2 * codes.len()] = 1;
    p[1006] = 1;
    p.extend_from_slice(records);
    p
}

/// Payload of a log module with an OLE timestamp at `offset`.
pub fn log_payload(offset: usize, days: f64) -> Vec<u8> {
    let mut p = vec![0u8; 600];
    p[offset..offset + 8].copy_from_slice(&days.to_le_bytes());
    p
}

/// Payload of a version 0 loop module.
pub fn loop_payload(indices: &[u32], padding: usize) -> Vec<u8> {
    let mut p = ((indices.len() + padding) as u32).to_le_bytes().to_vec();
    for v in indices {
        p.extend_from_slice(&v.to_le_bytes());
    }
    p.extend(std::iter::repeat_n(0u8, 4 * padding));
    p
}

/// One module to be written by [`MprBuilder`].
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    pub shortname: [u8; 10],
    pub longname: String,
    pub version: u32,
    pub date: [u8; 8],
    pub payload: Vec<u8>,
    pub v2_header: bool,
    /// Overrides the length written in the header.
    pub declared_length: Option<u32>,
}

impl ModuleSpec {
    pub fn new(shortname: &[u8; 10], payload: Vec<u8>) -> Self {
        Self {
            shortname: *shortname,
            longname: String::from_utf8_lossy(shortname).trim().to_string(),
            version: 0,
            date: *b"02/23/17",
            payload,
            v2_header: false,
            declared_length: None,
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut b = b"MODULE".to_vec();
        b.extend_from_slice(&self.shortname);
        let mut longname = self.longname.clone().into_bytes();
        longname.resize(25, b' ');
        b.extend_from_slice(&longname);
        let length = self
            .declared_length
            .unwrap_or(self.payload.len() as u32);
        if self.v2_header {
            b.extend_from_slice(&u32::MAX.to_le_bytes());
        }
        b.extend_from_slice(&length.to_le_bytes());
        b.extend_from_slice(&self.version.to_le_bytes());
        if self.v2_header {
            let flag: u32 = if &self.shortname == b"VMP data  " { 11 } else { 10 };
            b.extend_from_slice(&flag.to_le_bytes());
        }
        b.extend_from_slice(&self.date);
        b.extend_from_slice(&self.payload);
        b
    }
}

/// Builds a complete `.mpr` image module by module.
#[derive(Debug, Clone, Default)]
pub struct MprBuilder {
    modules: Vec<ModuleSpec>,
    v2_headers: bool,
}

impl MprBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every module with the v2 header layout.
    pub fn v2_headers(mut self) -> Self {
        self.v2_headers = true;
        self
    }

    /// Append a module, letting `configure` adjust it first.
    pub fn module<F>(mut self, shortname: &[u8; 10], payload: Vec<u8>, configure: F) -> Self
    where
        F: FnOnce(&mut ModuleSpec),
    {
        let mut spec = ModuleSpec::new(shortname, payload);
        spec.v2_header = self.v2_headers;
        configure(&mut spec);
        self.modules.push(spec);
        self
    }

    pub fn settings(self, date: &[u8; 8]) -> Self {
        self.module(b"VMP Set   ", vec![0u8; 64], |m| {
            m.longname = "VMP settings".into();
            m.date = *date;
        })
    }

    pub fn data(self, version: u32, codes: &[u16], point_count: u32, records: &[u8]) -> Self {
        let payload = data_payload(version, codes, point_count, records);
        self.module(b"VMP data  ", payload, |m| {
            m.longname = "VMP data".into();
            m.version = version;
        })
    }

    pub fn log(self, date: &[u8; 8], offset: usize, days: f64) -> Self {
        self.module(b"VMP LOG   ", log_payload(offset, days), |m| {
            m.longname = "VMP LOG".into();
            m.date = *date;
        })
    }

    pub fn loop_index(self, indices: &[u32]) -> Self {
        self.module(b"VMP loop  ", loop_payload(indices, 3), |m| {
            m.longname = "VMP loop".into();
        })
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = MPR_MAGIC.to_vec();
        for module in &self.modules {
            out.extend(module.to_bytes());
        }
        out
    }
}

/// Three records with flags, time, Ewe, I and cycle number
/// (codes 1, 2, 3, 21, 4, 6, 8, 24 and 39).
pub struct Sample {
    pub codes: Vec<u16>,
    pub records: Vec<u8>,
    pub time: Vec<f64>,
    pub ewe: Vec<f32>,
    pub current: Vec<f32>,
    pub cycle: Vec<f64>,
    pub i_range: Vec<u16>,
    pub flags: Vec<u8>,
}

pub fn sample() -> Sample {
    let time = vec![0.0, 1.25, 2.5];
    let ewe = vec![3.125f32, 3.25, 3.375];
    let current = vec![0.5f32, -0.25, 0.0];
    let cycle = vec![0.0, 0.0, 1.0];
    let i_range = vec![41u16, 41, 40];
    // mode | ox/red | error | control changes
    let flags = vec![0b0000_0101, 0b0001_0010, 0b0000_1011];
    let mut records = Vec::new();
    for i in 0..3 {
        records.extend(record(&[
            Value::U8(flags[i]),
            Value::F64(time[i]),
            Value::F32(ewe[i]),
            Value::F32(current[i]),
            Value::F64(cycle[i]),
            Value::U16(i_range[i]),
        ]));
    }
    Sample {
        codes: vec![1, 2, 3, 21, 4, 6, 8, 24, 39],
        records,
        time,
        ewe,
        current,
        cycle,
        i_range,
        flags,
    }
}
