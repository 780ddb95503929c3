pub mod decoder;

mod module_reader;
mod mpr_file;

pub use decoder::{DataTable, Record, decode_data_module};
pub use module_reader::ModuleReader;
pub use mpr_file::{MprFile, ReadOptions};
