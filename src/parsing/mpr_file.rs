use super::{DataTable, ModuleReader, decode_data_module};
use crate::{
    Error, Result,
    blocks::{
        DataModuleLayout, LogModule, MPR_MAGIC, Module, ModuleKind, read_loop_index, read_up_to,
    },
    dates::parse_biologic_date,
    layout::{FlagsMap, RecordLayout},
    running,
    types::ColumnValues,
};
use chrono::{NaiveDate, NaiveDateTime};
use log::debug;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Options controlling how an `.mpr` file is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// Look for `_LOOP.txt` / `_LOG.txt` next to the file when the loop or
    /// log module is missing. Only applies when reading from a path.
    pub running_side_files: bool,
    /// Require the settings date to equal the date of the log timestamp.
    pub check_dates: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            running_side_files: true,
            check_dates: true,
        }
    }
}

/// A fully decoded Bio-Logic `.mpr` file.
///
/// Everything is read and checked when the file is opened; afterwards the
/// value is immutable.
#[derive(Debug, Clone)]
pub struct MprFile {
    modules: Vec<Module>,
    data: DataTable,
    version: u32,
    point_count: u32,
    column_codes: Vec<u16>,
    data_layout: DataModuleLayout,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    timestamp: Option<NaiveDateTime>,
    loop_index: Option<Vec<u32>>,
}

impl MprFile {
    /// Parse an `.mpr` file from a given file path.
    ///
    /// # Arguments
    /// * `path` - Path to the `.mpr` file on disk.
    ///
    /// # Returns
    /// An [`MprFile`] or an [`Error`] if the file could not be read or
    /// decoded.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, |_| {})
    }

    /// Parse an `.mpr` file with custom [`ReadOptions`].
    ///
    /// # Example
    /// ```no_run
    /// use galvani_rs::MprFile;
    ///
    /// let mpr = MprFile::open_with("cell.mpr", |opts| {
    ///     opts.running_side_files = false;
    /// })?;
    /// # Ok::<(), galvani_rs::Error>(())
    /// ```
    pub fn open_with<F>(path: impl AsRef<Path>, configure: F) -> Result<Self>
    where
        F: FnOnce(&mut ReadOptions),
    {
        let path = path.as_ref();
        let mut options = ReadOptions::default();
        configure(&mut options);

        let mut mpr = {
            let file = File::open(path)?;
            Self::parse(BufReader::new(file), &options)?
        };
        if options.running_side_files {
            mpr.apply_side_files(path)?;
        }
        Ok(mpr)
    }

    /// Parse an `.mpr` image from any reader with default options.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::parse(reader, &ReadOptions::default())
    }

    /// Parse an `.mpr` image held in memory.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_reader(bytes)
    }

    /// Parse an `.mpr` image from a reader with explicit options.
    ///
    /// Side files are never consulted, since a reader has no path.
    pub fn parse<R: Read>(mut reader: R, options: &ReadOptions) -> Result<Self> {
        let mut magic = [0u8; MPR_MAGIC.len()];
        let n = read_up_to(&mut reader, &mut magic)?;
        if n < magic.len() || &magic != MPR_MAGIC {
            return Err(Error::InvalidMagic {
                found: magic[..n].to_vec(),
            });
        }

        let modules = ModuleReader::new(reader, MPR_MAGIC.len() as u64)
            .collect::<Result<Vec<_>>>()?;
        debug!("read {} modules", modules.len());

        let data_module =
            find_unique(&modules, ModuleKind::Data)?.ok_or(Error::MissingModule("VMP data"))?;
        let version = data_module.version();
        let (header, data) = decode_data_module(data_module)?;

        let start_date = find_unique(&modules, ModuleKind::Settings)?
            .map(|m| parse_biologic_date(m.date()))
            .transpose()?;

        let log = find_unique(&modules, ModuleKind::Log)?
            .map(LogModule::from_module)
            .transpose()?;
        if let (Some(start), Some(log)) = (start_date, &log) {
            if options.check_dates && start != log.timestamp.date() {
                return Err(Error::DateMismatch {
                    start,
                    end: Some(log.end_date),
                    timestamp: log.timestamp,
                });
            }
        }

        let loop_index = find_unique(&modules, ModuleKind::Loop)?
            .map(read_loop_index)
            .transpose()?;

        Ok(Self {
            version,
            point_count: header.point_count,
            column_codes: header.column_codes,
            data_layout: header.layout,
            start_date,
            end_date: log.as_ref().map(|l| l.end_date),
            timestamp: log.as_ref().map(|l| l.timestamp),
            loop_index,
            data,
            modules,
        })
    }

    fn apply_side_files(&mut self, path: &Path) -> Result<()> {
        if self.loop_index.is_none() {
            self.loop_index = running::read_loop_file(path)?;
        }
        if self.timestamp.is_none() {
            self.timestamp = running::read_log_file(path)?;
        }
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Every module in file order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// The decoded records.
    pub fn data(&self) -> &DataTable {
        &self.data
    }

    /// Version of the data module.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Number of points declared (and decoded) by the data module.
    pub fn point_count(&self) -> u32 {
        self.point_count
    }

    /// Column codes in record order.
    pub fn column_codes(&self) -> &[u16] {
        &self.column_codes
    }

    /// Which data-module header layout the file used.
    pub fn data_layout(&self) -> DataModuleLayout {
        self.data_layout
    }

    pub fn layout(&self) -> &RecordLayout {
        self.data.layout()
    }

    pub fn flags(&self) -> &FlagsMap {
        self.data.flags()
    }

    /// Date of the settings module.
    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    /// Date of the log module.
    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    /// Acquisition start, from the log module or a `_LOG.txt` side file.
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.timestamp
    }

    /// Loop start indices, from the loop module or a `_LOOP.txt` side file.
    pub fn loop_index(&self) -> Option<&[u32]> {
        self.loop_index.as_deref()
    }

    /// Shortcut for [`DataTable::column`].
    pub fn column(&self, name: &str) -> Option<ColumnValues> {
        self.data.column(name)
    }

    /// Shortcut for [`DataTable::flag`].
    pub fn flag(&self, name: &str) -> Result<ColumnValues> {
        self.data.flag(name)
    }
}

/// The single module of `kind`, if any; several is an error.
fn find_unique(modules: &[Module], kind: ModuleKind) -> Result<Option<&Module>> {
    let mut found = modules.iter().filter(|m| m.kind() == kind);
    let first = found.next();
    if found.next().is_some() {
        return Err(Error::DuplicateModule(kind.label()));
    }
    Ok(first)
}
