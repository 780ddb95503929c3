// blocks/common.rs
//! Byte-level helpers shared by the module and data-block parsers.
//!
//! Everything in an `.mpr` file is little-endian. The unchecked readers
//! index directly and are only used after a [`validate_buffer_size`] call;
//! the `*_at` variants return `None` when the slice is too short.

use crate::{Error, Result};
use std::borrow::Cow;
use std::io::{self, Read};

// ============================================================================
// Byte Parsing Helpers
// ============================================================================

/// Read a u32 from a byte slice at the given offset (little-endian).
///
/// # Panics
/// Panics if `offset + 4 > bytes.len()`.
#[inline]
pub fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

/// Read a u64 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_u64(bytes: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(read_array::<8>(bytes, offset))
}

/// Read a u16 from a byte slice at the given offset (little-endian).
#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

/// Read a u8 from a byte slice at the given offset.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> u8 {
    bytes[offset]
}

/// Read an f64 at `offset`, or `None` if fewer than 8 bytes remain.
#[inline]
pub fn read_f64_at(bytes: &[u8], offset: usize) -> Option<f64> {
    let end = offset.checked_add(8)?;
    let chunk: [u8; 8] = bytes.get(offset..end)?.try_into().ok()?;
    Some(f64::from_le_bytes(chunk))
}

/// Copy a fixed-size array out of `bytes` starting at `offset`.
///
/// # Panics
/// Panics if the range is out of bounds.
#[inline]
pub fn read_array<const N: usize>(bytes: &[u8], offset: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes[offset..offset + N]);
    out
}

// ============================================================================
// Validation Helpers
// ============================================================================

/// Validate that a buffer has at least `expected` bytes.
///
/// Returns `Err(TooShortBuffer)` if the buffer is too small.
#[inline]
pub fn validate_buffer_size(bytes: &[u8], expected: usize, context: &'static str) -> Result<()> {
    if bytes.len() < expected {
        return Err(Error::TooShortBuffer {
            actual: bytes.len(),
            expected,
            context,
        });
    }
    Ok(())
}

/// Return the first non-zero byte in `bytes[start..end]` as `(offset, value)`.
pub fn first_nonzero(bytes: &[u8], start: usize, end: usize) -> Option<(usize, u8)> {
    bytes
        .get(start..end)?
        .iter()
        .position(|&b| b != 0)
        .map(|i| (start + i, bytes[start + i]))
}

// ============================================================================
// Text Helpers
// ============================================================================

/// Decode a space- or NUL-padded ASCII field, trimming the padding.
pub fn trim_padded(bytes: &[u8]) -> Cow<'_, str> {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ' && b != 0)
        .map_or(0, |i| i + 1);
    String::from_utf8_lossy(&bytes[..end])
}

/// Decode Latin-1 bytes; each byte maps directly to a character.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

// ============================================================================
// Stream Helpers
// ============================================================================

/// Fill as much of `buf` as the stream allows.
///
/// Unlike [`Read::read_exact`], a short stream is not an error; the number
/// of bytes actually read is returned so callers can report truncation.
pub fn read_up_to<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
