//! # TrueType Font Subsetter
//!
//! Strips a TrueType font to only the glyphs a document actually uses. A
//! typical font is 50-200KB; a subset with ~100 glyphs is usually 5-15KB.
//!
//! Glyph ids are remapped to the dense ids already handed out by the
//! [`UsedGlyphMap`], so text written with those ids before subsetting stays
//! valid. Only the tables a PDF viewer needs to render embedded TrueType
//! outlines are kept:
//!
//! ```text
//! head hhea maxp hmtx cmap fpgm prep cvt loca glyf
//! ```
//!
//! Everything else (name, OS/2, post, kern, GSUB, ...) is dropped; the PDF
//! FontDescriptor carries the metrics instead.

use std::collections::BTreeMap;

use super::closure::{components, is_composite, UsedGlyphMap};
use super::encoding::winansi_byte;
use super::reader::{push_i16, push_u16, push_u32, slice, write_u16};
use super::sfnt::Tag;
use super::writer::write_sfnt;
use super::TrueTypeFont;
use crate::error::{FontError, Result};

/// Build the subset of `font` covering `used` and everything its composite
/// glyphs reference. `used` is closed over composites in place.
///
/// `chars` maps each used character to its original glyph id; the rebuilt
/// `cmap` covers those that are WinAnsi-representable.
pub fn subset_font(
    font: &TrueTypeFont,
    used: &mut UsedGlyphMap,
    chars: &BTreeMap<char, u16>,
) -> Result<Vec<u8>> {
    let glyf = font.table(Tag::GLYF)?;
    let loca = font.loca()?;
    used.close_over_composites(glyf, loca)?;

    let (new_glyf, new_loca) = rebuild_glyf(font, used)?;
    let (new_hmtx, num_h_metrics) = rebuild_hmtx(font, used);

    let mut tables: Vec<(Tag, Vec<u8>)> = vec![
        (Tag::HEAD, rebuild_head(font.table(Tag::HEAD)?)?),
        (Tag::HHEA, rebuild_hhea(font.table(Tag::HHEA)?, num_h_metrics)?),
        (Tag::MAXP, rebuild_maxp(font.table(Tag::MAXP)?, used.len() as u16)?),
        (Tag::HMTX, new_hmtx),
        (Tag::CMAP, rebuild_cmap(font.has_symbol_cmap(), used, chars)?),
    ];

    // Hinting programs don't reference glyph ids; copy them through.
    for tag in [Tag::FPGM, Tag::PREP, Tag::CVT] {
        if let Some(data) = font.optional_table(tag) {
            tables.push((tag, data.to_vec()));
        }
    }
    tables.push((Tag::LOCA, new_loca));
    tables.push((Tag::GLYF, new_glyf));

    let output = write_sfnt(tables)?;
    log::debug!(
        "subset '{}': {} of {} glyphs, {} bytes",
        font.metrics().names.postscript_name,
        used.len(),
        font.num_glyphs(),
        output.len()
    );
    Ok(output)
}

// ─── Glyph Outlines ─────────────────────────────────────────────

/// Copy each used glyph record in subset order, remapping composite
/// component ids. Returns the new `glyf` and long-format `loca`.
fn rebuild_glyf(font: &TrueTypeFont, used: &UsedGlyphMap) -> Result<(Vec<u8>, Vec<u8>)> {
    let glyf = font.table(Tag::GLYF)?;
    let loca = font.loca()?;

    let mut new_glyf: Vec<u8> = Vec::new();
    let mut new_loca: Vec<u8> = Vec::with_capacity((used.len() + 1) * 4);

    for &old_gid in used.original_ids() {
        push_u32(&mut new_loca, new_glyf.len() as u32);

        let mut record = glyf[loca.glyph_range(old_gid, glyf.len())?].to_vec();
        if is_composite(&record) {
            for component in components(&record)? {
                let new_gid = used.get(component.glyph_id).ok_or_else(|| {
                    FontError::format(format!(
                        "component glyph {} of glyph {} missing from closure",
                        component.glyph_id, old_gid
                    ))
                })?;
                write_u16(&mut record, component.index_offset, new_gid);
            }
        }
        new_glyf.extend_from_slice(&record);
    }
    push_u32(&mut new_loca, new_glyf.len() as u32);

    Ok((new_glyf, new_loca))
}

// ─── Horizontal Metrics ─────────────────────────────────────────

/// Rebuild `hmtx`, trimming the trailing run of equal advances down to
/// lsb-only entries. Returns the table and its numberOfHMetrics.
fn rebuild_hmtx(font: &TrueTypeFont, used: &UsedGlyphMap) -> (Vec<u8>, u16) {
    let hm = font.hmetrics();
    let ids = used.original_ids();
    let advances: Vec<u16> = ids.iter().map(|&gid| hm.advance(gid)).collect();

    let last = advances[advances.len() - 1];
    let mut num_h_metrics = advances.len();
    while num_h_metrics > 1 && advances[num_h_metrics - 2] == last {
        num_h_metrics -= 1;
    }

    let mut data = Vec::with_capacity(num_h_metrics * 4 + (ids.len() - num_h_metrics) * 2);
    for (i, &gid) in ids.iter().enumerate() {
        if i < num_h_metrics {
            push_u16(&mut data, advances[i]);
        }
        push_i16(&mut data, hm.lsb(gid));
    }

    (data, num_h_metrics as u16)
}

// ─── Fixed Tables ───────────────────────────────────────────────

fn rebuild_head(head: &[u8]) -> Result<Vec<u8>> {
    let head = slice(head, 0, 54)?;
    let mut new_head = vec![0u8; 54];
    new_head[0..8].copy_from_slice(&head[0..8]);
    // checkSumAdjustment (8..12) stays zero until the file is assembled
    new_head[12..50].copy_from_slice(&head[12..50]);
    // indexToLocFormat: loca is always rewritten in the long format
    write_u16(&mut new_head, 50, 1);
    new_head[52..54].copy_from_slice(&head[52..54]);
    Ok(new_head)
}

fn rebuild_hhea(hhea: &[u8], num_h_metrics: u16) -> Result<Vec<u8>> {
    let mut new_hhea = slice(hhea, 0, 34)?.to_vec();
    push_u16(&mut new_hhea, num_h_metrics);
    Ok(new_hhea)
}

fn rebuild_maxp(maxp: &[u8], num_glyphs: u16) -> Result<Vec<u8>> {
    let mut new_maxp = maxp.to_vec();
    slice(&new_maxp, 0, 6)?;
    write_u16(&mut new_maxp, 4, num_glyphs);
    Ok(new_maxp)
}

// ─── Character Map ──────────────────────────────────────────────

/// Build a one-subtable `cmap` for the used WinAnsi characters.
///
/// Fonts that had a Symbol cmap get a (3,0) subtable at 0xF000 + WinAnsi
/// byte; all others get (3,1) keyed by Unicode.
fn rebuild_cmap(
    symbol: bool,
    used: &UsedGlyphMap,
    chars: &BTreeMap<char, u16>,
) -> Result<Vec<u8>> {
    let mut entries: BTreeMap<u16, u16> = BTreeMap::new();
    for (&ch, &old_gid) in chars {
        let Some(new_gid) = used.get(old_gid) else {
            continue;
        };
        let code = match winansi_byte(ch) {
            // Symbol-area code points were looked up as-is and keep their code.
            _ if symbol && matches!(ch as u32, 0xF020..=0xF0FF) => ch as u16,
            Some(byte) if symbol => 0xF000 | byte as u16,
            Some(_) => ch as u16,
            None => continue,
        };
        entries.insert(code, new_gid);
    }
    build_cmap_format4(&entries, if symbol { 0 } else { 1 })
}

/// Format 4 with at most two segments: one covering the used code range
/// through the glyph id array, then the mandatory 0xFFFF terminator.
fn build_cmap_format4(entries: &BTreeMap<u16, u16>, encoding_id: u16) -> Result<Vec<u8>> {
    let range = entries
        .first_key_value()
        .zip(entries.last_key_value())
        .map(|((&first, _), (&last, _))| (first, last));

    // (start, end, idDelta, idRangeOffset)
    let mut segments: Vec<(u16, u16, u16, u16)> = Vec::new();
    let mut glyph_id_array: Vec<u16> = Vec::new();
    if let Some((first, last)) = range {
        // idRangeOffset of segment 0 skips the remaining 2 offset entries.
        segments.push((first, last, 0, 4));
        glyph_id_array = (first..=last)
            .map(|code| entries.get(&code).copied().unwrap_or(0))
            .collect();
    }
    segments.push((0xFFFF, 0xFFFF, 1, 0));

    let seg_count = segments.len() as u16;
    let seg_count_x2 = seg_count * 2;
    let entry_selector = 15 - seg_count.leading_zeros() as u16;
    let search_range = (1u16 << entry_selector) * 2;
    let range_shift = seg_count_x2 - search_range;

    let subtable_len = 16 + segments.len() * 8 + glyph_id_array.len() * 2;
    let subtable_len = u16::try_from(subtable_len)
        .map_err(|_| FontError::format("rebuilt cmap subtable exceeds 64KB"))?;

    let mut cmap: Vec<u8> = Vec::with_capacity(12 + subtable_len as usize);
    push_u16(&mut cmap, 0); // version
    push_u16(&mut cmap, 1); // numTables
    push_u16(&mut cmap, 3); // platformID = Windows
    push_u16(&mut cmap, encoding_id);
    push_u32(&mut cmap, 12); // offset to subtable

    push_u16(&mut cmap, 4); // format
    push_u16(&mut cmap, subtable_len);
    push_u16(&mut cmap, 0); // language
    push_u16(&mut cmap, seg_count_x2);
    push_u16(&mut cmap, search_range);
    push_u16(&mut cmap, entry_selector);
    push_u16(&mut cmap, range_shift);
    for s in &segments {
        push_u16(&mut cmap, s.1);
    }
    push_u16(&mut cmap, 0); // reservedPad
    for s in &segments {
        push_u16(&mut cmap, s.0);
    }
    for s in &segments {
        push_u16(&mut cmap, s.2);
    }
    for s in &segments {
        push_u16(&mut cmap, s.3);
    }
    for &g in &glyph_id_array {
        push_u16(&mut cmap, g);
    }

    debug_assert_eq!(cmap.len(), 12 + subtable_len as usize);
    Ok(cmap)
}
