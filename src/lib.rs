#![forbid(unsafe_code)]

//! # galvani-rs
//!
//! A Rust library for reading the data files written by Bio-Logic
//! potentiostats (EC-Lab / BT-Lab).
//!
//! An `.mpr` file is a magic signature followed by a stream of "modules":
//! tagged, length-prefixed blocks holding the experiment settings, the
//! measured data, the acquisition log and the loop boundaries. The layout of
//! a data record is not fixed; it is described at run time by a sequence of
//! column codes stored in the data module.
//!
//! ## Features
//!
//! - **Binary reading**: parse `.mpr` files with either module header
//!   layout and every known data-module version (0 to 3)
//! - **Typed columns**: decode fields as `u8`/`u16`/`u32`/`f32`/`f64` and
//!   extract the bit-packed flags (`mode`, `ox/red`, ...)
//! - **Metadata**: start and end dates, the acquisition timestamp and loop
//!   indices, including the side files EC-Lab writes for running experiments
//! - **Text exports**: read `.mpt` files with canonicalised column names
//! - **Summaries**: export file metadata as JSON (with the `serde` feature)
//!
//! ## Quick Start
//!
//! ### Reading an MPR file
//!
//! ```no_run
//! use galvani_rs::{MprFile, Result};
//!
//! fn main() -> Result<()> {
//!     let mpr = MprFile::open("experiment.mpr")?;
//!
//!     println!("{} points, started {:?}", mpr.point_count(), mpr.timestamp());
//!     for field in mpr.layout().fields() {
//!         println!("  {} ({})", field.name, field.scalar_type);
//!     }
//!
//!     if let Some(ewe) = mpr.column("Ewe/V") {
//!         println!("Ewe/V: {:?}", ewe.get(0));
//!     }
//!     let mode = mpr.flag("mode")?;
//!     println!("mode: {} values", mode.len());
//!     Ok(())
//! }
//! ```
//!
//! ### Reading an MPT export
//!
//! ```no_run
//! use galvani_rs::{MptEncoding, MptFile, Result};
//!
//! fn main() -> Result<()> {
//!     let mpt = MptFile::open_with_encoding("experiment.mpt", MptEncoding::Latin1)?;
//!     println!("{} rows, columns {:?}", mpt.len(), mpt.field_names().collect::<Vec<_>>());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`blocks`] | Low-level module and data-module structures |
//! | [`parsing`] | Module stream reader, record decoder and [`MprFile`] |
//! | [`columns`] | Registry of known column codes |
//! | [`layout`] | Record layouts built from column codes |
//! | [`dates`] | Date and timestamp parsing |
//! | [`running`] | Side files of running experiments |
//! | [`mpt`] | `.mpt` text export reader |
//! | [`summary`] | Serializable file summary |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], which is an alias for
//! `std::result::Result<T, Error>`. Use [`Error::kind`] to branch on the
//! class of failure ([`ErrorKind`]).
//!
//! ## Logging
//!
//! The library logs through the [`log`] facade: module headers, the chosen
//! data layout and side-file use at `debug`, timestamp probing at `trace`.

pub mod blocks;
pub mod columns;
pub mod dates;
pub mod error;
pub mod layout;
pub mod mpt;
pub mod parsing;
pub mod running;
pub mod summary;
pub mod types;

// Re-export commonly used types at the crate root
pub use blocks::{Module, ModuleKind};
pub use columns::{ColumnKind, ColumnRegistry};
pub use error::{Error, ErrorKind, Result};
pub use layout::{FLAGS_FIELD, Field, FlagSpec, FlagsMap, RecordLayout, build_layout};
pub use mpt::{MptEncoding, MptFile};
pub use parsing::{DataTable, ModuleReader, MprFile, ReadOptions, Record};
pub use summary::MprSummary;
pub use types::{ColumnValues, FlagType, ScalarType, Value};
