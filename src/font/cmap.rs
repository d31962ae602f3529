//! # Character-to-Glyph Map
//!
//! Reads at most one subtable for each of the three encodings PDF embedding
//! cares about: Windows Unicode BMP (3,1), Windows Symbol (3,0) and
//! Mac Roman (1,0). Lookups try them in that order.
//!
//! Only formats 0, 4 and 6 are decoded. Anything else is treated as if the
//! subtable were absent.

use std::collections::BTreeMap;

use super::encoding::mac_roman_byte;
use super::reader::{read_u16, read_u32, read_u8};
use crate::error::Result;

type CodeMap = BTreeMap<u16, u16>;

#[derive(Debug, Clone, Default)]
pub struct CharMap {
    windows: Option<CodeMap>,
    symbol: Option<CodeMap>,
    mac: Option<CodeMap>,
}

impl CharMap {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let num_tables = read_u16(data, 2)? as usize;

        let mut windows_offset = None;
        let mut symbol_offset = None;
        let mut mac_offset = None;
        for i in 0..num_tables {
            let rec = 4 + i * 8;
            let platform_id = read_u16(data, rec)?;
            let encoding_id = read_u16(data, rec + 2)?;
            let offset = read_u32(data, rec + 4)? as usize;
            let slot = match (platform_id, encoding_id) {
                (3, 1) => &mut windows_offset,
                (3, 0) => &mut symbol_offset,
                (1, 0) => &mut mac_offset,
                _ => continue,
            };
            slot.get_or_insert(offset);
        }

        let load = |offset: Option<usize>| -> Result<Option<CodeMap>> {
            match offset {
                Some(o) => parse_subtable(data, o),
                None => Ok(None),
            }
        };

        Ok(Self {
            windows: load(windows_offset)?,
            symbol: load(symbol_offset)?,
            mac: load(mac_offset)?,
        })
    }

    /// Whether the font carries a (3,0) Symbol subtable.
    pub fn has_symbol(&self) -> bool {
        self.symbol.is_some()
    }

    /// Glyph for `ch`, or `None` if no subtable maps it to a real glyph.
    pub fn lookup(&self, ch: char) -> Option<u16> {
        let code = ch as u32;
        let bmp = u16::try_from(code).ok();

        if let (Some(map), Some(code)) = (&self.windows, bmp) {
            if let Some(&gid) = map.get(&code) {
                return Some(gid);
            }
        }
        if let (Some(map), Some(code)) = (&self.symbol, bmp) {
            let direct = map.get(&code);
            // Symbol fonts conventionally place their glyphs at U+F0xx.
            let private_use = (code < 0x100).then(|| map.get(&(0xF000 | code))).flatten();
            if let Some(&gid) = direct.or(private_use) {
                return Some(gid);
            }
        }
        if let (Some(map), Some(byte)) = (&self.mac, mac_roman_byte(ch)) {
            if let Some(&gid) = map.get(&(byte as u16)) {
                return Some(gid);
            }
        }
        None
    }
}

fn parse_subtable(data: &[u8], offset: usize) -> Result<Option<CodeMap>> {
    let format = read_u16(data, offset)?;
    let map = match format {
        0 => parse_format0(data, offset)?,
        4 => parse_format4(data, offset)?,
        6 => parse_format6(data, offset)?,
        other => {
            log::debug!("ignoring cmap subtable format {}", other);
            return Ok(None);
        }
    };
    Ok(Some(map))
}

fn parse_format0(data: &[u8], offset: usize) -> Result<CodeMap> {
    let mut map = CodeMap::new();
    for code in 0..256usize {
        let gid = read_u8(data, offset + 6 + code)? as u16;
        if gid != 0 {
            map.insert(code as u16, gid);
        }
    }
    Ok(map)
}

fn parse_format4(data: &[u8], offset: usize) -> Result<CodeMap> {
    let seg_count_x2 = read_u16(data, offset + 6)? as usize;
    let end_codes = offset + 14;
    let start_codes = end_codes + seg_count_x2 + 2;
    let id_deltas = start_codes + seg_count_x2;
    let id_range_offsets = id_deltas + seg_count_x2;

    let mut map = CodeMap::new();
    for seg in 0..seg_count_x2 / 2 {
        let end = read_u16(data, end_codes + seg * 2)?;
        let start = read_u16(data, start_codes + seg * 2)?;
        let delta = read_u16(data, id_deltas + seg * 2)?;
        let range_offset_pos = id_range_offsets + seg * 2;
        let range_offset = read_u16(data, range_offset_pos)? as usize;
        if start > end {
            continue;
        }

        for code in start..=end {
            // 0xFFFF only ever appears as the terminating segment.
            if code == 0xFFFF {
                break;
            }
            let gid = if range_offset == 0 {
                code.wrapping_add(delta)
            } else {
                let addr = range_offset_pos + range_offset + (code - start) as usize * 2;
                match read_u16(data, addr) {
                    Ok(0) => 0,
                    Ok(raw) => raw.wrapping_add(delta),
                    Err(_) => {
                        log::debug!("cmap glyphIdArray index out of range for U+{:04X}", code);
                        0
                    }
                }
            };
            if gid != 0 {
                map.insert(code, gid);
            }
        }
    }
    Ok(map)
}

fn parse_format6(data: &[u8], offset: usize) -> Result<CodeMap> {
    let first_code = read_u16(data, offset + 6)?;
    let entry_count = read_u16(data, offset + 8)?;
    let mut map = CodeMap::new();
    for i in 0..entry_count {
        let gid = read_u16(data, offset + 10 + i as usize * 2)?;
        if gid != 0 {
            map.insert(first_code.wrapping_add(i), gid);
        }
    }
    Ok(map)
}
