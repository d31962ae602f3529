//! # sfnt Table Directory
//!
//! Every TrueType file starts with an offset table followed by one 16-byte
//! record per table (tag, checksum, offset, length). A TrueType Collection
//! (`ttcf`) instead starts with a list of offsets, each pointing at such an
//! offset table; the table offsets inside are still relative to the start of
//! the whole file.

use std::collections::BTreeMap;
use std::fmt;

use super::reader::{read_u16, read_u32, slice};
use crate::error::{FontError, Result};

/// A four-byte table tag such as `glyf` or `OS/2`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(pub [u8; 4]);

impl Tag {
    pub const HEAD: Tag = Tag(*b"head");
    pub const HHEA: Tag = Tag(*b"hhea");
    pub const MAXP: Tag = Tag(*b"maxp");
    pub const HMTX: Tag = Tag(*b"hmtx");
    pub const CMAP: Tag = Tag(*b"cmap");
    pub const FPGM: Tag = Tag(*b"fpgm");
    pub const PREP: Tag = Tag(*b"prep");
    pub const CVT: Tag = Tag(*b"cvt ");
    pub const LOCA: Tag = Tag(*b"loca");
    pub const GLYF: Tag = Tag(*b"glyf");
    pub const NAME: Tag = Tag(*b"name");
    pub const OS2: Tag = Tag(*b"OS/2");
    pub const POST: Tag = Tag(*b"post");
    pub const KERN: Tag = Tag(*b"kern");

    pub fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            let c = if b.is_ascii_graphic() || b == b' ' { b as char } else { '?' };
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}

const TTC_TAG: u32 = 0x7474_6366; // 'ttcf'
const SFNT_TRUETYPE: u32 = 0x0001_0000;
const SFNT_APPLE_TRUE: u32 = 0x7472_7565; // 'true'
const SFNT_CFF: u32 = 0x4F54_544F; // 'OTTO'

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRecord {
    pub tag: Tag,
    pub checksum: u32,
    pub offset: u32,
    pub length: u32,
}

/// The tag→record map for one font.
#[derive(Debug, Clone)]
pub struct TableDirectory {
    tables: BTreeMap<Tag, TableRecord>,
}

impl TableDirectory {
    /// Parse the offset table starting at `offset` in `data`.
    pub fn parse(data: &[u8], offset: usize) -> Result<Self> {
        let version = read_u32(data, offset)?;
        match version {
            SFNT_TRUETYPE | SFNT_APPLE_TRUE => {}
            SFNT_CFF => {
                return Err(FontError::format(
                    "CFF-flavoured OpenType fonts are not supported",
                ))
            }
            other => {
                return Err(FontError::format(format!(
                    "unknown sfnt version 0x{:08X}",
                    other
                )))
            }
        }

        let num_tables = read_u16(data, offset + 4)? as usize;
        let mut tables = BTreeMap::new();
        for i in 0..num_tables {
            let rec = offset + 12 + i * 16;
            let raw_tag = slice(data, rec, 4)?;
            let tag = Tag([raw_tag[0], raw_tag[1], raw_tag[2], raw_tag[3]]);
            let record = TableRecord {
                tag,
                checksum: read_u32(data, rec + 4)?,
                offset: read_u32(data, rec + 8)?,
                length: read_u32(data, rec + 12)?,
            };
            // Validate the range up front so lookups can't fail later.
            slice(data, record.offset as usize, record.length as usize).map_err(|_| {
                FontError::format(format!("table '{}' extends past end of file", tag))
            })?;
            tables.insert(tag, record);
        }

        Ok(Self { tables })
    }

    pub fn record(&self, tag: Tag) -> Option<&TableRecord> {
        self.tables.get(&tag)
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.tables.contains_key(&tag)
    }

    /// Slice of a required table.
    pub fn table<'a>(&self, data: &'a [u8], tag: Tag) -> Result<&'a [u8]> {
        self.optional_table(data, tag)
            .ok_or_else(|| FontError::format(format!("missing required '{}' table", tag)))
    }

    pub fn optional_table<'a>(&self, data: &'a [u8], tag: Tag) -> Option<&'a [u8]> {
        let rec = self.tables.get(&tag)?;
        let start = rec.offset as usize;
        data.get(start..start + rec.length as usize)
    }

    pub fn tags(&self) -> impl Iterator<Item = Tag> + '_ {
        self.tables.keys().copied()
    }
}

/// Offsets of every font in the buffer: one entry at 0 for a plain sfnt,
/// or the per-font offsets listed in a `ttcf` header.
pub fn font_offsets(data: &[u8]) -> Result<Vec<usize>> {
    if read_u32(data, 0)? != TTC_TAG {
        return Ok(vec![0]);
    }
    let num_fonts = read_u32(data, 8)? as usize;
    if num_fonts == 0 {
        return Err(FontError::format("font collection contains no fonts"));
    }
    // Guard against absurd counts before allocating.
    slice(data, 12, num_fonts.saturating_mul(4))?;
    (0..num_fonts)
        .map(|i| read_u32(data, 12 + i * 4).map(|o| o as usize))
        .collect()
}

pub fn is_collection(data: &[u8]) -> bool {
    matches!(read_u32(data, 0), Ok(TTC_TAG))
}
