//! # Engine Configuration
//!
//! Font behaviour and font sources, deserialized from the same camelCase
//! JSON the rest of the document pipeline uses. Every field has a default,
//! so `{}` is a valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Per-font behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontOptions {
    /// Apply `kern` table adjustments when measuring and splitting text.
    #[serde(default = "default_true")]
    pub kerning: bool,
    /// Report characters the font has no glyph for.
    #[serde(default = "default_true")]
    pub log_missing_glyphs: bool,
}

fn default_true() -> bool {
    true
}

impl Default for FontOptions {
    fn default() -> Self {
        Self {
            kerning: true,
            log_missing_glyphs: true,
        }
    }
}

/// A font supplied inline rather than found on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontEntry {
    /// Font family name (e.g. "Inter", "Roboto").
    pub family: String,
    /// Base64-encoded font data, a data URI (e.g. "data:font/ttf;base64,...")
    /// or an explicit file path.
    pub src: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

/// Top-level font engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Folders searched for font files, in order.
    #[serde(default)]
    pub font_folders: Vec<PathBuf>,
    /// Fonts registered up front; these win over folder lookups.
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    #[serde(default)]
    pub options: FontOptions,
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
