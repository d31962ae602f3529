//! # PDF Font Objects
//!
//! Serializes an [`EmbeddedFont`] into the PDF objects that embed it:
//!
//! ```text
//! Type0 font ──> CIDFontType2 ──> FontDescriptor ──> FontFile2 (subset, zlib)
//!     └──> ToUnicode CMap
//! ```
//!
//! Glyphs are addressed with `/Identity-H`, so the two-byte codes in content
//! streams are subset glyph ids and `/W` is keyed by subset glyph id too.
//!
//! Object ids are handed out by the caller's document writer. A font's
//! Type0 id is usually needed (for page `/Resources`) long before the font
//! itself can be written, which is what [`ObjectSlot`] tracks.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::{FontError, Result};
use crate::font::{EmbeddedFont, FontFlags, FontMetrics};

/// A serialized indirect object body, without the `obj`/`endobj` wrapper.
#[derive(Debug, Clone)]
pub struct PdfObject {
    pub id: usize,
    pub data: Vec<u8>,
}

/// Lifecycle of one indirect object id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ObjectSlot {
    #[default]
    Unallocated,
    Allocated(usize),
    Written(usize),
}

impl ObjectSlot {
    /// The slot's id, taking the next free id on first use.
    pub fn allocate(&mut self, next_id: &mut usize) -> usize {
        match *self {
            ObjectSlot::Allocated(id) | ObjectSlot::Written(id) => id,
            ObjectSlot::Unallocated => {
                let id = *next_id;
                *next_id += 1;
                *self = ObjectSlot::Allocated(id);
                id
            }
        }
    }

    /// Record that the object body has been emitted. Writing twice, or
    /// writing an object that never got an id, is an error.
    pub fn mark_written(&mut self) -> Result<usize> {
        match *self {
            ObjectSlot::Allocated(id) => {
                *self = ObjectSlot::Written(id);
                Ok(id)
            }
            ObjectSlot::Written(id) => Err(FontError::format(format!(
                "PDF object {} written twice",
                id
            ))),
            ObjectSlot::Unallocated => Err(FontError::format(
                "PDF object written before an id was allocated",
            )),
        }
    }

    pub fn id(&self) -> Option<usize> {
        match *self {
            ObjectSlot::Allocated(id) | ObjectSlot::Written(id) => Some(id),
            ObjectSlot::Unallocated => None,
        }
    }

    pub fn is_written(&self) -> bool {
        matches!(self, ObjectSlot::Written(_))
    }
}

/// Object ids for every object one embedded font produces.
#[derive(Debug, Clone, Default)]
pub struct FontObjectSlots {
    pub type0: ObjectSlot,
    pub cid_font: ObjectSlot,
    pub descriptor: ObjectSlot,
    pub font_file: ObjectSlot,
    pub to_unicode: ObjectSlot,
}

/// Write all objects for `font`. The Type0 dictionary keeps whatever id it
/// was allocated earlier; the rest are allocated from `next_id`.
pub fn write_font_objects(
    font: &mut EmbeddedFont,
    slots: &mut FontObjectSlots,
    next_id: &mut usize,
) -> Result<Vec<PdfObject>> {
    let type0_id = slots.type0.allocate(next_id);
    let cid_font_id = slots.cid_font.allocate(next_id);
    let descriptor_id = slots.descriptor.allocate(next_id);
    let font_file_id = slots.font_file.allocate(next_id);
    let to_unicode_id = slots.to_unicode.allocate(next_id);

    let subset = font.subset_font_data()?.to_vec();
    // Read after subsetting so composite components are included.
    let widths = font.subset_widths();
    let names = font.font().names();
    let base_font = format!(
        "{}+{}",
        subset_tag(font.used_glyphs().original_ids()),
        sanitize_font_name(&names.postscript_name, &names.family)
    );
    let used_chars = font.used_chars();
    let metrics = font.font().metrics();

    let mut objects = Vec::with_capacity(5);

    slots.font_file.mark_written()?;
    objects.push(PdfObject {
        id: font_file_id,
        data: font_file2_stream(&subset),
    });

    slots.descriptor.mark_written()?;
    objects.push(PdfObject {
        id: descriptor_id,
        data: font_descriptor(&base_font, metrics, font_file_id).into_bytes(),
    });

    let default_width = widths.first().map(|&(_, w)| w.round() as i64).unwrap_or(1000);
    slots.cid_font.mark_written()?;
    objects.push(PdfObject {
        id: cid_font_id,
        data: format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            base_font,
            descriptor_id,
            default_width,
            width_array(&widths),
        )
        .into_bytes(),
    });

    let cmap = to_unicode_cmap(&used_chars, &base_font);
    let compressed_cmap = compress_to_vec_zlib(cmap.as_bytes(), 6);
    let mut to_unicode: Vec<u8> = Vec::new();
    let _ = write!(
        to_unicode,
        "<< /Length {} /Filter /FlateDecode >>\nstream\n",
        compressed_cmap.len()
    );
    to_unicode.extend_from_slice(&compressed_cmap);
    to_unicode.extend_from_slice(b"\nendstream");
    slots.to_unicode.mark_written()?;
    objects.push(PdfObject {
        id: to_unicode_id,
        data: to_unicode,
    });

    slots.type0.mark_written()?;
    objects.push(PdfObject {
        id: type0_id,
        data: format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            base_font, cid_font_id, to_unicode_id
        )
        .into_bytes(),
    });

    log::debug!(
        "embedded font /{} as object {} ({} glyphs, {} bytes)",
        base_font,
        type0_id,
        widths.len(),
        subset.len()
    );

    Ok(objects)
}

/// FontFile2 stream body: zlib-compressed font bytes with the uncompressed
/// size in `/Length1`.
pub fn font_file2_stream(font_data: &[u8]) -> Vec<u8> {
    let compressed = compress_to_vec_zlib(font_data, 6);
    let mut data: Vec<u8> = Vec::with_capacity(compressed.len() + 64);
    let _ = write!(
        data,
        "<< /Length {} /Length1 {} /Filter /FlateDecode >>\nstream\n",
        compressed.len(),
        font_data.len()
    );
    data.extend_from_slice(&compressed);
    data.extend_from_slice(b"\nendstream");
    data
}

/// FontDescriptor dictionary, metrics scaled to 1000 units/em.
pub fn font_descriptor(font_name: &str, metrics: &FontMetrics, font_file_id: usize) -> String {
    let scale = |v: i16| metrics.to_pdf_units(v as f64).round() as i64;
    let [x_min, y_min, x_max, y_max] = metrics.bbox;
    let stem_v = if metrics.flags.contains(FontFlags::FORCE_BOLD) {
        120
    } else {
        80
    };
    format!(
        "<< /Type /FontDescriptor /FontName /{} /Flags {} \
         /FontBBox [{} {} {} {}] /ItalicAngle {} \
         /Ascent {} /Descent {} /CapHeight {} /StemV {} \
         /FontFile2 {} 0 R >>",
        font_name,
        metrics.flags.bits(),
        scale(x_min),
        scale(y_min),
        scale(x_max),
        scale(y_max),
        format_number(metrics.italic_angle),
        scale(metrics.ascent),
        scale(metrics.descent),
        scale(metrics.cap_height),
        stem_v,
        font_file_id,
    )
}

/// `/W` array with one `gid [width]` entry per subset glyph.
pub fn width_array(widths: &[(u16, f64)]) -> String {
    let mut result = String::from("[");
    for (gid, width) in widths {
        let _ = write!(result, " {} [{}]", gid, width.round() as i64);
    }
    result.push_str(" ]");
    result
}

/// ToUnicode CMap mapping subset glyph ids back to the characters that
/// produced them.
pub fn to_unicode_cmap(used_chars: &[(char, u16)], font_name: &str) -> String {
    let mut gid_to_unicode: Vec<(u16, char)> =
        used_chars.iter().map(|&(ch, gid)| (gid, ch)).collect();
    gid_to_unicode.sort();
    // One source per glyph: the lowest code point wins.
    gid_to_unicode.dedup_by_key(|(gid, _)| *gid);

    let mut cmap = String::new();
    cmap.push_str("/CIDInit /ProcSet findresource begin\n");
    cmap.push_str("12 dict begin\n");
    cmap.push_str("begincmap\n");
    cmap.push_str("/CIDSystemInfo\n");
    cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
    cmap.push_str("/CMapType 2 def\n");
    cmap.push_str("1 begincodespacerange\n");
    cmap.push_str("<0000> <FFFF>\n");
    cmap.push_str("endcodespacerange\n");

    // At most 100 entries per bfchar block.
    for chunk in gid_to_unicode.chunks(100) {
        let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
        for &(gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{:04X}", u))
                .collect();
            let _ = writeln!(cmap, "<{:04X}> <{}>", gid, hex);
        }
        cmap.push_str("endbfchar\n");
    }

    cmap.push_str("endcmap\n");
    cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
    cmap.push_str("end\n");
    cmap.push_str("end\n");
    cmap
}

/// Six uppercase letters derived from the subset's glyph list. The same
/// glyphs always give the same tag.
pub fn subset_tag(original_ids: &[u16]) -> String {
    // FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for gid in original_ids {
        for byte in gid.to_be_bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    (0..6)
        .map(|_| {
            let letter = (b'A' + (hash % 26) as u8) as char;
            hash /= 26;
            letter
        })
        .collect()
}

/// A PDF name for the font: the PostScript name when present, otherwise the
/// family, with anything outside `[A-Za-z0-9_-]` removed.
pub fn sanitize_font_name(postscript_name: &str, family: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect()
    };
    let name = clean(postscript_name);
    if !name.is_empty() {
        return name;
    }
    let name = clean(family);
    if name.is_empty() {
        "CustomFont".to_string()
    } else {
        name
    }
}

fn format_number(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}
