// loop_module.rs
use super::Module;
use crate::{Error, Result, blocks::common::read_u32};

/// Bytes preceding the index array in a version 0 loop module.
const LOOP_INDEX_OFFSET: usize = 4;

/// Decode the loop boundaries stored in a `VMP loop` module.
///
/// The payload holds little-endian u32 indices after a 4-byte count; unused
/// trailing slots are zero and are trimmed.
///
/// # Errors
/// [`Error::UnsupportedLoopVersion`] for any version but 0 and
/// [`Error::LoopIndexAlignment`] when the array ends in a partial word.
pub fn read_loop_index(module: &Module) -> Result<Vec<u32>> {
    if module.version() != 0 {
        return Err(Error::UnsupportedLoopVersion(module.version()));
    }
    let body = module.data.get(LOOP_INDEX_OFFSET..).unwrap_or(&[]);
    if body.len() % 4 != 0 {
        return Err(Error::LoopIndexAlignment { len: body.len() });
    }
    let mut index: Vec<u32> = (0..body.len() / 4)
        .map(|i| read_u32(body, i * 4))
        .collect();
    let keep = index.iter().rposition(|&v| v != 0).map_or(0, |i| i + 1);
    index.truncate(keep);
    Ok(index)
}
