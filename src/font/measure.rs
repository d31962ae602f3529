//! # Text Measurement
//!
//! String widths and kerned runs in 1000-units-per-em space. Characters the
//! font has no glyph for are skipped: a fallback font renders (and measures)
//! them, and kerning applies between the glyphs on either side.

use super::TrueTypeFont;

impl TrueTypeFont {
    /// Advance width of `ch` in 1000 units/em, or 0 if the font lacks it.
    pub fn char_width(&self, ch: char) -> f64 {
        self.glyph_index(ch)
            .map(|gid| self.glyph_width(gid))
            .unwrap_or(0.0)
    }

    /// Width of `text` in 1000 units/em.
    pub fn measure_string(&self, text: &str, kerning: bool) -> f64 {
        let kerning = kerning && !self.kerning.is_empty();
        let mut total: i64 = 0;
        let mut prev: Option<u16> = None;
        for ch in text.chars() {
            let Some(gid) = self.glyph_index(ch) else {
                continue;
            };
            total += self.hmetrics.advance(gid) as i64;
            if kerning {
                if let Some(p) = prev {
                    total += self.kern_value(p, gid) as i64;
                }
            }
            prev = Some(gid);
        }
        self.metrics.to_pdf_units(total as f64)
    }

    /// Split `text` into runs separated by non-zero kerning adjustments.
    ///
    /// The iterator is pure and `Clone`, so it can be restarted freely.
    pub fn kern_string<'a>(&'a self, text: &'a str, kerning: bool) -> KernRuns<'a> {
        KernRuns {
            font: self,
            text,
            pos: 0,
            pending: 0.0,
            prev: None,
            kerning: kerning && !self.kerning.is_empty(),
        }
    }
}

/// A piece of text and the kerning adjustment (1000 units/em) between it
/// and the previous run. Negative values pull the run closer; a PDF `TJ`
/// array carries the negated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KernedRun<'a> {
    pub text: &'a str,
    pub adjustment: f64,
}

#[derive(Debug, Clone)]
pub struct KernRuns<'a> {
    font: &'a TrueTypeFont,
    text: &'a str,
    pos: usize,
    pending: f64,
    prev: Option<u16>,
    kerning: bool,
}

impl<'a> Iterator for KernRuns<'a> {
    type Item = KernedRun<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.text.len() {
            return None;
        }
        let start = self.pos;
        let adjustment = std::mem::take(&mut self.pending);

        for (i, ch) in self.text[start..].char_indices() {
            let Some(gid) = self.font.glyph_index(ch) else {
                continue;
            };
            // The first glyph of a run was already kerned against its predecessor.
            if i > 0 && self.kerning {
                if let Some(p) = self.prev {
                    let kern = self.font.kern_value(p, gid);
                    if kern != 0 {
                        self.pos = start + i;
                        self.pending = self.font.metrics.to_pdf_units(kern as f64);
                        return Some(KernedRun {
                            text: &self.text[start..start + i],
                            adjustment,
                        });
                    }
                }
            }
            self.prev = Some(gid);
        }

        self.pos = self.text.len();
        Some(KernedRun {
            text: &self.text[start..],
            adjustment,
        })
    }
}
