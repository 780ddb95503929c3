// src/blocks/mod.rs

// ============================================================================
// File Structure Constants
// ============================================================================
// An `.mpr` file is the magic signature followed by a stream of modules. Each
// module is the `MODULE` tag, a fixed header (two layouts exist) and a
// payload of `length` bytes.

/// File signature: product identifier padded to 48 bytes, then four zeros.
pub const MPR_MAGIC: &[u8; 52] =
    b"BIO-LOGIC MODULAR FILE\x1a                         \x00\x00\x00\x00";

/// Tag that starts every module.
pub const MODULE_TAG: &[u8; 6] = b"MODULE";

/// Size of the v1 module header (short name, long name, length, version, date).
pub const HEADER_V1_SIZE: usize = 51;

/// Additional bytes in a v2 header (max length and an unknown flag word).
pub const HEADER_V2_EXTRA: usize = 8;

/// Value of the v2 max-length field, found where v1 stores its length.
pub const HEADER_V2_SENTINEL: u32 = 0xFFFF_FFFF;

pub const SETTINGS_SHORTNAME: &[u8; 10] = b"VMP Set   ";
pub const DATA_SHORTNAME: &[u8; 10] = b"VMP data  ";
pub const LOG_SHORTNAME: &[u8; 10] = b"VMP LOG   ";
pub const LOOP_SHORTNAME: &[u8; 10] = b"VMP loop  ";

// ============================================================================
// Submodules
// ============================================================================

mod common;
mod data_module;
mod log_module;
mod loop_module;
mod module;

pub(crate) use common::{latin1_to_string, read_u8, read_u16, read_u32, read_u64, read_up_to};

pub use data_module::{DataModuleHeader, DataModuleLayout};
pub use log_module::{
    LogModule, TIMESTAMP_MAX_DAYS, TIMESTAMP_MIN_DAYS, TIMESTAMP_OFFSETS, find_ole_timestamp,
};
pub use loop_module::read_loop_index;
pub use module::{HeaderLayout, Module, ModuleHeader, ModuleKind};
