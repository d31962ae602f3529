//! # sfnt Writer
//!
//! Reassembles trimmed tables into a standalone TrueType file: offset table,
//! tag-sorted directory, 4-byte aligned table data, per-table checksums and
//! finally the `head.checkSumAdjustment` that makes the whole file sum to
//! `0xB1B0AFBA`.

use super::reader::{push_u16, push_u32, write_u32};
use super::sfnt::Tag;
use crate::error::{FontError, Result};

/// Whole-file checksum target for a valid sfnt.
pub const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

/// Write `tables` as an sfnt. Table data keeps the given order; directory
/// records are sorted by tag.
pub fn write_sfnt(tables: Vec<(Tag, Vec<u8>)>) -> Result<Vec<u8>> {
    let num_tables = tables.len() as u16;
    if num_tables == 0 {
        return Err(FontError::format("cannot write a font with no tables"));
    }
    let entry_selector = 15 - num_tables.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;

    let mut output: Vec<u8> = Vec::new();
    push_u32(&mut output, 0x0001_0000);
    push_u16(&mut output, num_tables);
    push_u16(&mut output, search_range);
    push_u16(&mut output, entry_selector);
    push_u16(&mut output, range_shift);

    // (tag, checksum, offset, unpadded length)
    let mut records: Vec<(Tag, u32, u32, u32)> = Vec::with_capacity(tables.len());
    let mut table_offset = 12 + tables.len() * 16;
    let mut head_offset = None;
    let mut body: Vec<u8> = Vec::new();

    for (tag, mut data) in tables {
        let length = data.len() as u32;
        while data.len() % 4 != 0 {
            data.push(0);
        }
        if tag == Tag::HEAD {
            if data.len() < 12 {
                return Err(FontError::format("'head' table too short"));
            }
            // checkSumAdjustment must be zero while checksums are computed.
            write_u32(&mut data, 8, 0);
            head_offset = Some(table_offset);
        }
        records.push((tag, calc_table_checksum(&data), table_offset as u32, length));
        table_offset += data.len();
        body.extend_from_slice(&data);
    }

    // Readers binary-search the directory, so records go in tag order even
    // though the table data above stays in the order it was given.
    records.sort_by_key(|r| r.0);
    for (tag, checksum, offset, length) in &records {
        output.extend_from_slice(&tag.0);
        push_u32(&mut output, *checksum);
        push_u32(&mut output, *offset);
        push_u32(&mut output, *length);
    }
    output.extend_from_slice(&body);

    let head_offset = head_offset
        .ok_or_else(|| FontError::format("no 'head' table recorded during reassembly"))?;
    let adjustment = CHECKSUM_MAGIC.wrapping_sub(calc_table_checksum(&output));
    write_u32(&mut output, head_offset + 8, adjustment);

    Ok(output)
}

/// Sum of big-endian u32 words, zero-padding a trailing partial word.
pub fn calc_table_checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::reader::{read_u16, read_u32};

    fn head_bytes() -> Vec<u8> {
        let mut head = vec![0u8; 54];
        head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
        head[8..12].copy_from_slice(&0xDEAD_BEEFu32.to_be_bytes());
        head
    }

    #[test]
    fn test_calc_table_checksum() {
        assert_eq!(calc_table_checksum(b"ABCD"), 0x41424344);
        // Partial trailing word is zero padded.
        assert_eq!(calc_table_checksum(b"ABCDE"), 0x41424344 + 0x45000000);
        assert_eq!(calc_table_checksum(&[0xFF; 8]), 0xFFFF_FFFE);
    }

    #[test]
    fn test_directory_header_fields() {
        let tables = vec![
            (Tag::HEAD, head_bytes()),
            (Tag::HHEA, vec![1; 36]),
            (Tag::MAXP, vec![2; 6]),
            (Tag::HMTX, vec![3; 5]),
            (Tag::LOCA, vec![4; 8]),
        ];
        let out = write_sfnt(tables).unwrap();
        assert_eq!(read_u16(&out, 4).unwrap(), 5);
        assert_eq!(read_u16(&out, 6).unwrap(), 64);
        assert_eq!(read_u16(&out, 8).unwrap(), 2);
        assert_eq!(read_u16(&out, 10).unwrap(), 16);
    }

    #[test]
    fn test_padding_and_unpadded_lengths() {
        let out = write_sfnt(vec![(Tag::HEAD, head_bytes()), (Tag::HMTX, vec![7; 5])]).unwrap();
        assert_eq!(out.len() % 4, 0);
        // Records sorted: head, hmtx
        assert_eq!(&out[12..16], b"head");
        assert_eq!(&out[28..32], b"hmtx");
        assert_eq!(read_u32(&out, 28 + 12).unwrap(), 5);
        let hmtx_offset = read_u32(&out, 28 + 8).unwrap() as usize;
        assert_eq!(hmtx_offset % 4, 0);
        assert_eq!(&out[hmtx_offset..hmtx_offset + 8], &[7, 7, 7, 7, 7, 0, 0, 0]);
    }

    #[test]
    fn test_whole_file_checksum_is_magic() {
        let out = write_sfnt(vec![(Tag::HEAD, head_bytes()), (Tag::HMTX, vec![9; 13])]).unwrap();
        assert_eq!(calc_table_checksum(&out), CHECKSUM_MAGIC);
        // The stale adjustment in the input head was discarded.
        let head_offset = read_u32(&out, 12 + 8).unwrap() as usize;
        assert_ne!(read_u32(&out, head_offset + 8).unwrap(), 0xDEAD_BEEF);
    }

    #[test]
    fn test_missing_head_is_error() {
        let err = write_sfnt(vec![(Tag::HMTX, vec![0; 4])]).unwrap_err();
        assert!(matches!(err, FontError::Format(_)));
    }
}
