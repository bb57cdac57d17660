//! Bounds-checked little-endian reads over an image buffer.

use crate::clr::{ImageError, ImageResult};

pub fn slice(data: &[u8], offset: usize, len: usize) -> ImageResult<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| ImageError::truncated(offset, len))
}

pub fn u8_at(data: &[u8], offset: usize) -> ImageResult<u8> {
    data.get(offset)
        .copied()
        .ok_or_else(|| ImageError::truncated(offset, 1))
}

pub fn u16_at(data: &[u8], offset: usize) -> ImageResult<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub fn u32_at(data: &[u8], offset: usize) -> ImageResult<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn u64_at(data: &[u8], offset: usize) -> ImageResult<u64> {
    let lo = u32_at(data, offset)?;
    let hi = u32_at(data, offset + 4)?;
    Ok((u64::from(hi) << 32) | u64::from(lo))
}

/// Reads a little-endian index column of 2 or 4 bytes.
pub fn index_at(data: &[u8], offset: usize, width: usize) -> ImageResult<u32> {
    match width {
        2 => u16_at(data, offset).map(u32::from),
        _ => u32_at(data, offset),
    }
}

/// ECMA-335 II.23.2 compressed unsigned integer.
///
/// Returns the value and the number of bytes it occupied.
pub fn compressed_u32(data: &[u8], offset: usize) -> ImageResult<(u32, usize)> {
    let first = u8_at(data, offset)?;
    if first & 0x80 == 0 {
        return Ok((u32::from(first), 1));
    }
    if first & 0xC0 == 0x80 {
        let second = u8_at(data, offset + 1)?;
        return Ok(((u32::from(first & 0x3F) << 8) | u32::from(second), 2));
    }
    if first & 0xE0 == 0xC0 {
        let b = slice(data, offset + 1, 3)?;
        let value = (u32::from(first & 0x1F) << 24)
            | (u32::from(b[0]) << 16)
            | (u32::from(b[1]) << 8)
            | u32::from(b[2]);
        return Ok((value, 4));
    }
    Err(ImageError::new(format!(
        "invalid compressed integer at offset {offset:#x}"
    )))
}
