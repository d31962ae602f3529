//! Big-endian byte helpers.
//!
//! Reads are bounds-checked and fail with [`FontError::Format`] on truncated
//! input. Writes only ever target buffers the subsetter allocated itself, so
//! they index directly.

use crate::error::{FontError, Result};

pub(crate) fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| {
            FontError::format(format!(
                "read of {} bytes at offset {} past end of {}-byte buffer",
                len,
                offset,
                data.len()
            ))
        })
}

pub(crate) fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(slice(data, offset, 1)?[0])
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Result<u16> {
    let b = slice(data, offset, 2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

pub(crate) fn read_i16(data: &[u8], offset: usize) -> Result<i16> {
    read_u16(data, offset).map(|v| v as i16)
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Result<u32> {
    let b = slice(data, offset, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

pub(crate) fn read_i32(data: &[u8], offset: usize) -> Result<i32> {
    read_u32(data, offset).map(|v| v as i32)
}

pub(crate) fn write_u16(data: &mut [u8], offset: usize, val: u16) {
    data[offset..offset + 2].copy_from_slice(&val.to_be_bytes());
}

pub(crate) fn write_u32(data: &mut [u8], offset: usize, val: u32) {
    data[offset..offset + 4].copy_from_slice(&val.to_be_bytes());
}

pub(crate) fn push_u16(out: &mut Vec<u8>, val: u16) {
    out.extend_from_slice(&val.to_be_bytes());
}

pub(crate) fn push_i16(out: &mut Vec<u8>, val: i16) {
    out.extend_from_slice(&val.to_be_bytes());
}

pub(crate) fn push_u32(out: &mut Vec<u8>, val: u32) {
    out.extend_from_slice(&val.to_be_bytes());
}
