//! # Font Metrics
//!
//! Scalar metrics from `head`, `hhea`, `OS/2` and `post`, plus the per-glyph
//! horizontal metrics from `hmtx`. Values are kept in font units; callers
//! scale them to the PDF's 1000-units-per-em space with
//! [`FontMetrics::to_pdf_units`].

use serde::Serialize;

use super::closure::LocaFormat;
use super::name::FontNames;
use super::reader::{read_i16, read_i32, read_u16, read_u32, read_u8};
use crate::error::{FontError, Result};

/// PDF FontDescriptor `/Flags` bitset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FontFlags(u32);

impl FontFlags {
    pub const FIXED_PITCH: u32 = 1;
    pub const SERIF: u32 = 1 << 1;
    pub const SYMBOLIC: u32 = 1 << 2;
    pub const SCRIPT: u32 = 1 << 3;
    pub const NON_SYMBOLIC: u32 = 1 << 5;
    pub const ITALIC: u32 = 1 << 6;
    pub const FORCE_BOLD: u32 = 1 << 18;

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }

    pub fn insert(&mut self, flag: u32) {
        self.0 |= flag;
    }
}

/// Fields read from the `head` table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Head {
    pub units_per_em: u16,
    pub bbox: [i16; 4],
    pub mac_style: u16,
    pub loca_format: LocaFormat,
}

pub(crate) fn parse_head(head: &[u8]) -> Result<Head> {
    if read_u32(head, 12)? != 0x5F0F_3CF5 {
        return Err(FontError::format("bad magic number in 'head' table"));
    }
    let units_per_em = read_u16(head, 18)?;
    if units_per_em == 0 {
        return Err(FontError::format("unitsPerEm is zero"));
    }
    let loca_format = match read_i16(head, 50)? {
        0 => LocaFormat::Short,
        1 => LocaFormat::Long,
        other => {
            return Err(FontError::format(format!(
                "unknown indexToLocFormat {}",
                other
            )))
        }
    };
    Ok(Head {
        units_per_em,
        bbox: [
            read_i16(head, 36)?,
            read_i16(head, 38)?,
            read_i16(head, 40)?,
            read_i16(head, 42)?,
        ],
        mac_style: read_u16(head, 44)?,
        loca_format,
    })
}

/// Fields read from the `hhea` table.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Hhea {
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub number_of_h_metrics: u16,
}

pub(crate) fn parse_hhea(hhea: &[u8]) -> Result<Hhea> {
    let number_of_h_metrics = read_u16(hhea, 34)?;
    if number_of_h_metrics == 0 {
        return Err(FontError::format("numberOfHMetrics is zero"));
    }
    Ok(Hhea {
        ascent: read_i16(hhea, 4)?,
        descent: read_i16(hhea, 6)?,
        line_gap: read_i16(hhea, 8)?,
        number_of_h_metrics,
    })
}

pub(crate) fn parse_num_glyphs(maxp: &[u8]) -> Result<u16> {
    let n = read_u16(maxp, 4)?;
    if n == 0 {
        return Err(FontError::format("font has no glyphs"));
    }
    Ok(n)
}

/// Scalar font metrics, in font units.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FontMetrics {
    pub units_per_em: u16,
    /// xMin, yMin, xMax, yMax
    pub bbox: [i16; 4],
    pub ascent: i16,
    pub descent: i16,
    pub line_gap: i16,
    pub cap_height: i16,
    /// Degrees counter-clockwise from vertical.
    pub italic_angle: f64,
    pub underline_position: i16,
    pub underline_thickness: i16,
    pub flags: FontFlags,
    pub names: FontNames,
}

impl FontMetrics {
    pub(crate) fn from_tables(
        head: &Head,
        hhea: &Hhea,
        os2: Option<&[u8]>,
        post: Option<&[u8]>,
        names: FontNames,
        symbolic: bool,
    ) -> Result<Self> {
        let mut flags = FontFlags::default();
        flags.insert(if symbolic {
            FontFlags::SYMBOLIC
        } else {
            FontFlags::NON_SYMBOLIC
        });
        if head.mac_style & 0x01 != 0 {
            flags.insert(FontFlags::FORCE_BOLD);
        }
        if head.mac_style & 0x02 != 0 {
            flags.insert(FontFlags::ITALIC);
        }

        let mut ascent = hhea.ascent;
        let mut descent = hhea.descent;
        let mut line_gap = hhea.line_gap;
        let mut cap_height = None;

        if let Some(os2) = os2 {
            let version = read_u16(os2, 0)?;
            if read_u16(os2, 4)? >= 600 {
                flags.insert(FontFlags::FORCE_BOLD);
            }
            match read_u8(os2, 30)? {
                1..=5 | 7 => flags.insert(FontFlags::SERIF),
                10 => flags.insert(FontFlags::SCRIPT),
                12 => flags.insert(FontFlags::SYMBOLIC),
                _ => {}
            }

            let typo_ascender = read_i16(os2, 68)?;
            let typo_descender = read_i16(os2, 70)?;
            let typo_line_gap = read_i16(os2, 72)?;
            if typo_ascender > 0 {
                ascent = typo_ascender;
            }
            // Test the freshly read descender, not the hhea value.
            if typo_descender != 0 {
                descent = typo_descender;
            }
            if typo_line_gap > 0 {
                line_gap = typo_line_gap;
            }
            if version > 1 {
                cap_height = Some(read_i16(os2, 88)?);
            }
        }

        let mut italic_angle = 0.0;
        let mut underline_position = 0;
        let mut underline_thickness = 0;
        if let Some(post) = post {
            italic_angle = read_i32(post, 4)? as f64 / 65536.0;
            underline_position = read_i16(post, 8)?;
            underline_thickness = read_i16(post, 10)?;
            if read_u32(post, 12)? != 0 {
                flags.insert(FontFlags::FIXED_PITCH);
            }
            if italic_angle != 0.0 {
                flags.insert(FontFlags::ITALIC);
            }
        }

        Ok(Self {
            units_per_em: head.units_per_em,
            bbox: head.bbox,
            ascent,
            descent,
            line_gap,
            cap_height: cap_height.unwrap_or(ascent),
            italic_angle,
            underline_position,
            underline_thickness,
            flags,
            names,
        })
    }

    /// Scale a value in font units to 1000 units per em.
    pub fn to_pdf_units(&self, value: f64) -> f64 {
        value * 1000.0 / self.units_per_em as f64
    }
}

/// Per-glyph horizontal metrics from `hmtx`.
#[derive(Debug, Clone)]
pub struct HMetrics {
    /// (advanceWidth, lsb) for the first `numberOfHMetrics` glyphs.
    long: Vec<(u16, i16)>,
    /// lsb for each remaining glyph.
    trailing_lsb: Vec<i16>,
}

impl HMetrics {
    pub(crate) fn parse(hmtx: &[u8], number_of_h_metrics: u16, num_glyphs: u16) -> Result<Self> {
        let long_count = number_of_h_metrics as usize;
        let mut long = Vec::with_capacity(long_count);
        for i in 0..long_count {
            long.push((read_u16(hmtx, i * 4)?, read_i16(hmtx, i * 4 + 2)?));
        }

        // Fonts in the wild sometimes omit the trailing lsb array; treat
        // missing entries as 0 rather than rejecting the font.
        let trailing = (num_glyphs as usize).saturating_sub(long_count);
        let base = long_count * 4;
        let trailing_lsb = (0..trailing)
            .map(|i| read_i16(hmtx, base + i * 2).unwrap_or(0))
            .collect();

        Ok(Self { long, trailing_lsb })
    }

    pub fn number_of_h_metrics(&self) -> usize {
        self.long.len()
    }

    /// Advance width; glyphs past the last slot reuse its advance.
    pub fn advance(&self, gid: u16) -> u16 {
        let idx = (gid as usize).min(self.long.len() - 1);
        self.long[idx].0
    }

    pub fn lsb(&self, gid: u16) -> i16 {
        let idx = gid as usize;
        match self.long.get(idx) {
            Some(&(_, lsb)) => lsb,
            None => self
                .trailing_lsb
                .get(idx - self.long.len())
                .copied()
                .unwrap_or(0),
        }
    }
}
