//! Structured error types for the font engine.
//!
//! Two variants cover the fatal font error sources: the font bytes could not
//! be obtained, or they do not describe a usable TrueType font. A third covers
//! engine configuration that failed to parse. Missing glyphs are not errors;
//! they are reported as [`GlyphNotFound`] warnings.

use std::fmt;

/// The unified error type returned by all public font engine functions.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    /// The font's source bytes could not be located or read.
    #[error("Font '{family}' not found: {reason}")]
    NotFound { family: String, reason: String },
    /// A required table is missing, a structure is truncated or invalid, or
    /// a collection does not contain the requested family.
    #[error("Invalid font data: {0}")]
    Format(String),
    /// Engine configuration JSON failed to parse.
    #[error("Failed to parse font configuration: {source}{}", hint_suffix(.hint))]
    Config {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for FontError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the font configuration schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        FontError::Config { source: e, hint }
    }
}

impl FontError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        FontError::Format(msg.into())
    }

    pub(crate) fn not_found(family: &str, reason: impl Into<String>) -> Self {
        FontError::NotFound {
            family: family.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FontError>;

/// Non-fatal: no glyph exists for a requested code point.
///
/// Glyph 0 is substituted. Each (code point, font) pair is reported once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphNotFound {
    pub code_point: char,
    pub font: String,
}

impl fmt::Display for GlyphNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No glyph for U+{:04X} in font '{}'",
            self.code_point as u32, self.font
        )
    }
}
