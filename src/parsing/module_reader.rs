// module_reader.rs
use crate::{
    Error, Result,
    blocks::{
        HEADER_V1_SIZE, HEADER_V2_EXTRA, HeaderLayout, MODULE_TAG, Module, ModuleHeader,
        read_up_to,
    },
};
use log::debug;
use std::io::{self, Read};
use std::iter::FusedIterator;

/// Splits a byte stream into [`Module`]s.
///
/// The stream must already be positioned after the file magic. Each call to
/// `next` reads one `MODULE` tag, its header and its payload. A clean end of
/// stream before a tag ends the iteration; anything else that goes wrong is
/// returned once as an error, after which the iterator is exhausted.
///
/// # Example
/// ```no_run
/// use galvani_rs::{ModuleReader, blocks::MPR_MAGIC};
/// use std::io::Read;
///
/// let mut file = std::io::BufReader::new(std::fs::File::open("cell.mpr")?);
/// let mut magic = [0u8; 52];
/// file.read_exact(&mut magic)?;
/// assert_eq!(&magic, MPR_MAGIC);
/// for module in ModuleReader::headers_only(file, MPR_MAGIC.len() as u64) {
///     let module = module?;
///     println!("{} ({} bytes)", module.long_name(), module.length());
/// }
/// # Ok::<(), galvani_rs::Error>(())
/// ```
pub struct ModuleReader<R> {
    reader: R,
    position: u64,
    read_payloads: bool,
    finished: bool,
}

impl<R: Read> ModuleReader<R> {
    /// Read modules and their payloads.
    ///
    /// # Arguments
    /// * `reader` - Stream positioned at the first module tag.
    /// * `base_offset` - Stream offset of that position, used for
    ///   [`Module::data_offset`].
    pub fn new(reader: R, base_offset: u64) -> Self {
        Self {
            reader,
            position: base_offset,
            read_payloads: true,
            finished: false,
        }
    }

    /// Read module headers only; payloads are skipped and left empty.
    ///
    /// Skipped payloads are still drained, so truncation is reported the
    /// same way as by [`ModuleReader::new`].
    pub fn headers_only(reader: R, base_offset: u64) -> Self {
        Self {
            read_payloads: false,
            ..Self::new(reader, base_offset)
        }
    }

    /// Stream offset of the next unread byte.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_module(&mut self) -> Result<Option<Module>> {
        let mut tag = [0u8; 6];
        let n = read_up_to(&mut self.reader, &mut tag)?;
        self.position += n as u64;
        if n == 0 {
            return Ok(None);
        }
        if n != tag.len() || &tag != MODULE_TAG {
            return Err(Error::ModuleTagError {
                found: tag[..n].to_vec(),
            });
        }

        let header = self.read_header()?;
        let data_offset = self.position;
        let length = header.length;

        let mut payload = Read::by_ref(&mut self.reader).take(length);
        let (data, actual) = if self.read_payloads {
            let mut data = Vec::new();
            let n = payload.read_to_end(&mut data)?;
            (data, n as u64)
        } else {
            let skipped = io::copy(&mut payload, &mut io::sink())?;
            (Vec::new(), skipped)
        };
        self.position = data_offset + actual;

        let module = Module {
            header,
            data_offset,
            data,
        };
        if actual < length {
            return Err(Error::ModuleTruncated {
                name: module.long_name().into_owned(),
                expected: length,
                actual,
            });
        }

        debug!(
            "module {:?} ({:?} header, version {}, {} bytes at offset {})",
            module.short_name(),
            module.header.layout,
            module.version(),
            length,
            data_offset
        );
        Ok(Some(module))
    }

    fn read_header(&mut self) -> Result<ModuleHeader> {
        let mut buf = [0u8; HEADER_V1_SIZE + HEADER_V2_EXTRA];
        let n = read_up_to(&mut self.reader, &mut buf[..HEADER_V1_SIZE])?;
        self.position += n as u64;
        if n < HEADER_V1_SIZE {
            return Err(Error::TooShortBuffer {
                actual: n,
                expected: HEADER_V1_SIZE,
                context: "module header",
            });
        }

        let layout = HeaderLayout::detect(&buf[..HEADER_V1_SIZE])?;
        if layout == HeaderLayout::V2 {
            let extra = read_up_to(&mut self.reader, &mut buf[HEADER_V1_SIZE..])?;
            self.position += extra as u64;
            if extra < HEADER_V2_EXTRA {
                return Err(Error::TooShortBuffer {
                    actual: HEADER_V1_SIZE + extra,
                    expected: layout.size(),
                    context: "module header",
                });
            }
        }
        ModuleHeader::from_bytes(&buf[..layout.size()], layout)
    }
}

impl<R: Read> Iterator for ModuleReader<R> {
    type Item = Result<Module>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_module() {
            Ok(Some(module)) => Some(Ok(module)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for ModuleReader<R> {}
