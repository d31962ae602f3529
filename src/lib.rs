//! # Forme Font
//!
//! TrueType parsing, measurement and subsetting for PDF embedding.
//!
//! A document that embeds a whole CJK font to print a dozen characters ships
//! megabytes it never uses. This crate keeps only the glyphs a document
//! actually draws (plus whatever composite glyphs pull in), rebuilds the
//! tables a PDF viewer needs and hands back a small standalone TrueType file.
//!
//! ## Architecture
//!
//! ```text
//! Font bytes (file / data URI / callback)
//!       ↓
//!   [resolve]: family + style → parsed font, cached
//!       ↓
//!   [font]: tables, metrics, cmap, kerning, measurement
//!       ↓
//!   EmbeddedFont: records used characters, assigns subset glyph ids
//!       ↓
//!   [font::subset]: glyph closure, table rebuild, sfnt writer
//!       ↓
//!   [pdf]: FontFile2 / FontDescriptor / CIDFont / ToUnicode objects
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod pdf;
pub mod resolve;

use std::sync::Arc;

pub use config::{EngineConfig, FontOptions};
pub use error::{FontError, GlyphNotFound, Result};
pub use font::{EmbeddedFont, FontMetrics, TrueTypeFont};
pub use resolve::{FontRequest, ResolveContext};

/// Subset `font_data` down to the glyphs needed to draw `text`.
///
/// Characters the font doesn't cover are left out and logged.
pub fn subset_for_text(font_data: Vec<u8>, text: &str) -> Result<Vec<u8>> {
    let font = Arc::new(TrueTypeFont::parse(font_data)?);
    let mut embedded = EmbeddedFont::new(font, FontOptions::default());
    embedded.add_string(text);
    Ok(embedded.subset_font_data()?.to_vec())
}
