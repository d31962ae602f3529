//! # Glyph Closure
//!
//! A composite glyph is drawn from other glyphs, so subsetting must keep
//! every glyph a retained composite refers to, transitively. The
//! [`UsedGlyphMap`] doubles as the worklist: it is walked by index while
//! newly discovered components are appended to its tail.

use std::collections::BTreeMap;
use std::ops::Range;

use super::reader::{read_i16, read_u16, read_u32};
use crate::error::{FontError, Result};

const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

/// Size of the numberOfContours + bbox header of a `glyf` record.
const GLYPH_HEADER_LEN: usize = 10;

/// `head.indexToLocFormat`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaFormat {
    /// u16 entries holding offset / 2
    Short,
    /// u32 entries
    Long,
}

/// Parsed `loca` table: `num_glyphs + 1` offsets into `glyf`.
#[derive(Debug, Clone)]
pub struct Loca {
    offsets: Vec<u32>,
}

impl Loca {
    pub fn parse(data: &[u8], format: LocaFormat, num_glyphs: u16) -> Result<Self> {
        let count = num_glyphs as usize + 1;
        let offsets = (0..count)
            .map(|i| match format {
                LocaFormat::Short => read_u16(data, i * 2).map(|o| o as u32 * 2),
                LocaFormat::Long => read_u32(data, i * 4),
            })
            .collect::<Result<Vec<u32>>>()?;
        Ok(Self { offsets })
    }

    pub fn num_glyphs(&self) -> u16 {
        (self.offsets.len() - 1) as u16
    }

    /// Byte range of `gid`'s record in a `glyf` table of `glyf_len` bytes.
    pub fn glyph_range(&self, gid: u16, glyf_len: usize) -> Result<Range<usize>> {
        let idx = gid as usize;
        if idx + 1 >= self.offsets.len() {
            return Err(FontError::format(format!(
                "glyph {} out of range (font has {} glyphs)",
                gid,
                self.num_glyphs()
            )));
        }
        let start = self.offsets[idx] as usize;
        let end = self.offsets[idx + 1] as usize;
        if start > end || end > glyf_len {
            return Err(FontError::format(format!(
                "loca entry for glyph {} is invalid ({}..{} in {}-byte glyf)",
                gid, start, end, glyf_len
            )));
        }
        Ok(start..end)
    }
}

/// One component reference inside a composite glyph record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Offset of the glyphIndex field within the glyph record.
    pub index_offset: usize,
    pub glyph_id: u16,
}

pub fn is_composite(glyph: &[u8]) -> bool {
    glyph.len() >= GLYPH_HEADER_LEN && matches!(read_i16(glyph, 0), Ok(-1))
}

/// Component references of a glyph record; empty for simple and empty glyphs.
pub fn components(glyph: &[u8]) -> Result<Vec<Component>> {
    let mut found = Vec::new();
    if !is_composite(glyph) {
        return Ok(found);
    }

    let mut pos = GLYPH_HEADER_LEN;
    loop {
        let flags = read_u16(glyph, pos)?;
        let glyph_id = read_u16(glyph, pos + 2)?;
        found.push(Component {
            index_offset: pos + 2,
            glyph_id,
        });
        pos += 4;

        pos += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            pos += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            pos += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            pos += 8;
        }

        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    if pos > glyph.len() {
        return Err(FontError::format("composite glyph record is truncated"));
    }
    Ok(found)
}

/// Append-only bijection from original glyph ids to dense subset ids.
///
/// Glyph 0 (.notdef) is always id 0. Ids are handed out in discovery order
/// and never change once assigned, so text can be encoded with subset ids
/// before the subset itself is built.
#[derive(Debug, Clone)]
pub struct UsedGlyphMap {
    order: Vec<u16>,
    index: BTreeMap<u16, u16>,
}

impl Default for UsedGlyphMap {
    fn default() -> Self {
        Self::new()
    }
}

impl UsedGlyphMap {
    pub fn new() -> Self {
        let mut map = Self {
            order: Vec::new(),
            index: BTreeMap::new(),
        };
        map.insert(0);
        map
    }

    /// Subset id of `gid`, assigning the next dense id if it is new.
    pub fn insert(&mut self, gid: u16) -> u16 {
        if let Some(&new_id) = self.index.get(&gid) {
            return new_id;
        }
        let new_id = self.order.len() as u16;
        self.order.push(gid);
        self.index.insert(gid, new_id);
        new_id
    }

    pub fn get(&self, gid: u16) -> Option<u16> {
        self.index.get(&gid).copied()
    }

    pub fn contains(&self, gid: u16) -> bool {
        self.index.contains_key(&gid)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Original glyph ids, indexed by subset id.
    pub fn original_ids(&self) -> &[u16] {
        &self.order
    }

    /// Add every glyph referenced, directly or not, by a composite already
    /// in the map.
    pub fn close_over_composites(&mut self, glyf: &[u8], loca: &Loca) -> Result<()> {
        let num_glyphs = loca.num_glyphs();
        let mut cursor = 0;
        while cursor < self.order.len() {
            let gid = self.order[cursor];
            cursor += 1;
            if gid >= num_glyphs {
                return Err(FontError::format(format!(
                    "glyph {} out of range (font has {} glyphs)",
                    gid, num_glyphs
                )));
            }

            let range = loca.glyph_range(gid, glyf.len())?;
            for component in components(&glyf[range])? {
                if !self.contains(component.glyph_id) {
                    self.insert(component.glyph_id);
                }
            }
        }
        Ok(())
    }
}
