//! # Font Management
//!
//! Parsing, measuring and subsetting TrueType fonts for PDF embedding.
//!
//! Two types split the work by lifetime:
//!
//! - [`TrueTypeFont`] is parsed once from the raw bytes and never mutated.
//!   Share it behind an `Arc` between as many documents as you like.
//! - [`EmbeddedFont`] belongs to one document-writing pass. It records which
//!   characters the document uses, hands out subset glyph ids as it goes and
//!   finally produces the subset font bytes.

pub mod closure;
pub mod cmap;
pub mod encoding;
pub mod kern;
pub mod measure;
pub mod metrics;
pub mod name;
pub(crate) mod reader;
pub mod sfnt;
pub mod source;
pub mod subset;
pub mod writer;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

pub use closure::{Loca, UsedGlyphMap};
pub use measure::{KernRuns, KernedRun};
pub use metrics::{FontFlags, FontMetrics, HMetrics};
pub use name::FontNames;

use crate::config::FontOptions;
use crate::error::{FontError, GlyphNotFound, Result};
use cmap::CharMap;
use kern::KerningTable;
use sfnt::{Tag, TableDirectory};

/// A parsed TrueType font.
pub struct TrueTypeFont {
    data: Arc<[u8]>,
    directory: TableDirectory,
    metrics: FontMetrics,
    hmetrics: HMetrics,
    cmap: CharMap,
    kerning: KerningTable,
    /// `None` for fonts without TrueType outlines; such fonts can be
    /// measured but not subset.
    loca: Option<Loca>,
    num_glyphs: u16,
}

impl TrueTypeFont {
    /// Parse a font file. For a collection, the first font is used.
    pub fn parse(data: impl Into<Arc<[u8]>>) -> Result<Self> {
        Self::parse_index(data, 0)
    }

    /// Parse the `index`-th font of a collection (0 for plain fonts).
    pub fn parse_index(data: impl Into<Arc<[u8]>>, index: usize) -> Result<Self> {
        let data = data.into();
        let offsets = sfnt::font_offsets(&data)?;
        let offset = *offsets.get(index).ok_or_else(|| {
            FontError::format(format!(
                "font index {} out of range (file has {} fonts)",
                index,
                offsets.len()
            ))
        })?;
        Self::parse_at(data, offset)
    }

    /// Parse the font named `family`. In a collection, the first sub-font
    /// whose family or full name matches wins; a plain font is taken as is.
    pub fn parse_family(data: impl Into<Arc<[u8]>>, family: &str) -> Result<Self> {
        let data = data.into();
        if !sfnt::is_collection(&data) {
            return Self::parse_at(data, 0);
        }
        for offset in sfnt::font_offsets(&data)? {
            let directory = TableDirectory::parse(&data, offset)?;
            let names = match directory.optional_table(&data, Tag::NAME) {
                Some(table) => FontNames::parse(table)?,
                None => FontNames::default(),
            };
            if names.matches(family) {
                return Self::parse_at(data, offset);
            }
        }
        Err(FontError::format(format!(
            "font collection has no font named '{}'",
            family
        )))
    }

    fn parse_at(data: Arc<[u8]>, offset: usize) -> Result<Self> {
        let directory = TableDirectory::parse(&data, offset)?;

        let head = metrics::parse_head(directory.table(&data, Tag::HEAD)?)?;
        let hhea = metrics::parse_hhea(directory.table(&data, Tag::HHEA)?)?;
        let num_glyphs = metrics::parse_num_glyphs(directory.table(&data, Tag::MAXP)?)?;
        let hmetrics = HMetrics::parse(
            directory.table(&data, Tag::HMTX)?,
            hhea.number_of_h_metrics,
            num_glyphs,
        )?;
        let cmap = CharMap::parse(directory.table(&data, Tag::CMAP)?)?;
        let names = match directory.optional_table(&data, Tag::NAME) {
            Some(table) => FontNames::parse(table)?,
            None => FontNames::default(),
        };
        let metrics = FontMetrics::from_tables(
            &head,
            &hhea,
            directory.optional_table(&data, Tag::OS2),
            directory.optional_table(&data, Tag::POST),
            names,
            cmap.has_symbol(),
        )?;
        let kerning = match directory.optional_table(&data, Tag::KERN) {
            Some(table) => KerningTable::parse(table)?,
            None => KerningTable::default(),
        };
        log::debug!(
            "parsed '{}': {} glyphs, {} kerning pairs",
            metrics.names.family,
            num_glyphs,
            kerning.len()
        );
        let loca = match directory.optional_table(&data, Tag::LOCA) {
            Some(table) if directory.contains(Tag::GLYF) => {
                Some(Loca::parse(table, head.loca_format, num_glyphs)?)
            }
            _ => None,
        };

        Ok(Self {
            data,
            directory,
            metrics,
            hmetrics,
            cmap,
            kerning,
            loca,
            num_glyphs,
        })
    }

    pub fn table(&self, tag: Tag) -> Result<&[u8]> {
        self.directory.table(&self.data, tag)
    }

    pub fn optional_table(&self, tag: Tag) -> Option<&[u8]> {
        self.directory.optional_table(&self.data, tag)
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn names(&self) -> &FontNames {
        &self.metrics.names
    }

    pub fn hmetrics(&self) -> &HMetrics {
        &self.hmetrics
    }

    pub fn num_glyphs(&self) -> u16 {
        self.num_glyphs
    }

    pub fn has_symbol_cmap(&self) -> bool {
        self.cmap.has_symbol()
    }

    pub fn loca(&self) -> Result<&Loca> {
        self.loca
            .as_ref()
            .ok_or_else(|| FontError::format("font has no TrueType outlines (glyf/loca)"))
    }

    /// Glyph for `ch`, or `None` if the font doesn't cover it.
    pub fn glyph_index(&self, ch: char) -> Option<u16> {
        self.cmap.lookup(ch)
    }

    /// Advance width in font units.
    pub fn advance_width(&self, gid: u16) -> u16 {
        self.hmetrics.advance(gid)
    }

    /// Advance width in 1000 units/em.
    pub fn glyph_width(&self, gid: u16) -> f64 {
        self.metrics.to_pdf_units(self.hmetrics.advance(gid) as f64)
    }

    /// Pair adjustment in font units.
    pub fn kern_value(&self, left: u16, right: u16) -> i16 {
        self.kerning.kern_value(left, right)
    }

    pub fn ascent(&self) -> f64 {
        self.metrics.to_pdf_units(self.metrics.ascent as f64)
    }

    pub fn descent(&self) -> f64 {
        self.metrics.to_pdf_units(self.metrics.descent as f64)
    }

    pub fn line_gap(&self) -> f64 {
        self.metrics.to_pdf_units(self.metrics.line_gap as f64)
    }

    pub fn underline_position(&self) -> f64 {
        self.metrics.to_pdf_units(self.metrics.underline_position as f64)
    }
}

impl fmt::Debug for TrueTypeFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrueTypeFont")
            .field("family", &self.metrics.names.family)
            .field("num_glyphs", &self.num_glyphs)
            .field("bytes", &self.data.len())
            .finish_non_exhaustive()
    }
}

/// Per-document usage tracking and subsetting for one font.
#[derive(Debug)]
pub struct EmbeddedFont {
    font: Arc<TrueTypeFont>,
    options: FontOptions,
    used_glyphs: UsedGlyphMap,
    /// Used characters → original glyph id.
    used_chars: BTreeMap<char, u16>,
    reported_missing: BTreeSet<char>,
    warnings: Vec<GlyphNotFound>,
    subset: Option<Vec<u8>>,
}

impl EmbeddedFont {
    pub fn new(font: Arc<TrueTypeFont>, options: FontOptions) -> Self {
        Self {
            font,
            options,
            used_glyphs: UsedGlyphMap::new(),
            used_chars: BTreeMap::new(),
            reported_missing: BTreeSet::new(),
            warnings: Vec::new(),
            subset: None,
        }
    }

    pub fn font(&self) -> &TrueTypeFont {
        &self.font
    }

    pub fn options(&self) -> &FontOptions {
        &self.options
    }

    /// Original glyph for `ch`, or 0 if the font lacks it. With
    /// `log_missing`, the first miss per character is reported.
    pub fn glyph(&mut self, ch: char, log_missing: bool) -> u16 {
        match self.font.glyph_index(ch) {
            Some(gid) => gid,
            None => {
                if log_missing && self.reported_missing.insert(ch) {
                    let warning = GlyphNotFound {
                        code_point: ch,
                        font: self.font.names().family.clone(),
                    };
                    log::warn!("{}", warning);
                    self.warnings.push(warning);
                }
                0
            }
        }
    }

    /// Record that the document uses `ch`. Returns `false` when this font
    /// has no glyph for it, or the glyph missed an already built subset, and
    /// a fallback font has to render it.
    pub fn add_char(&mut self, ch: char) -> bool {
        let gid = self.glyph(ch, self.options.log_missing_glyphs);
        if gid == 0 {
            return false;
        }
        // The built subset is final; a glyph missing from it goes to a fallback.
        if self.subset.is_some() && !self.used_glyphs.contains(gid) {
            log::warn!(
                "'{}' used after the subset of '{}' was built; it will not be embedded",
                ch,
                self.font.names().family
            );
            return false;
        }
        self.used_glyphs.insert(gid);
        self.used_chars.insert(ch, gid);
        true
    }

    /// [`add_char`](Self::add_char) for every character; `true` if the font
    /// covers all of them.
    pub fn add_string(&mut self, text: &str) -> bool {
        text.chars().fold(true, |all, ch| self.add_char(ch) && all)
    }

    /// Subset glyph id for a character previously passed to `add_char`.
    pub fn new_glyph_id(&self, ch: char) -> Option<u16> {
        self.used_chars
            .get(&ch)
            .and_then(|&gid| self.used_glyphs.get(gid))
    }

    pub fn used_glyphs(&self) -> &UsedGlyphMap {
        &self.used_glyphs
    }

    /// Used characters with their subset glyph ids, in character order.
    pub fn used_chars(&self) -> Vec<(char, u16)> {
        self.used_chars
            .keys()
            .filter_map(|&ch| self.new_glyph_id(ch).map(|gid| (ch, gid)))
            .collect()
    }

    /// Width in 1000 units/em of every glyph in the subset, by subset id.
    pub fn subset_widths(&self) -> Vec<(u16, f64)> {
        self.used_glyphs
            .original_ids()
            .iter()
            .enumerate()
            .map(|(new_gid, &gid)| (new_gid as u16, self.font.glyph_width(gid)))
            .collect()
    }

    pub fn warnings(&self) -> &[GlyphNotFound] {
        &self.warnings
    }

    pub fn measure_string(&self, text: &str) -> f64 {
        self.font.measure_string(text, self.options.kerning)
    }

    pub fn kern_string<'a>(&'a self, text: &'a str) -> KernRuns<'a> {
        self.font.kern_string(text, self.options.kerning)
    }

    pub fn ascent(&self) -> f64 {
        self.font.ascent()
    }

    pub fn descent(&self) -> f64 {
        self.font.descent()
    }

    pub fn line_gap(&self) -> f64 {
        self.font.line_gap()
    }

    pub fn underline_position(&self) -> f64 {
        self.font.underline_position()
    }

    /// The subset font file. Built on the first call; later calls return the
    /// same bytes.
    pub fn subset_font_data(&mut self) -> Result<&[u8]> {
        if self.subset.is_none() {
            let bytes = subset::subset_font(&self.font, &mut self.used_glyphs, &self.used_chars)?;
            self.subset = Some(bytes);
        }
        Ok(self.subset.as_deref().unwrap_or_default())
    }
}
