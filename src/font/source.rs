//! Font source strings: data URIs, explicit file paths or raw base64.

use crate::error::{FontError, Result};

/// Load the raw bytes behind a configured font `src`.
pub fn load_font_source(family: &str, src: &str) -> Result<Vec<u8>> {
    // data:font/ttf;base64,AAEAAA...
    if src.starts_with("data:") {
        let comma_pos = src
            .find(',')
            .ok_or_else(|| FontError::not_found(family, "invalid data URI: missing comma"))?;
        if !src[..comma_pos].ends_with(";base64") {
            return Err(FontError::not_found(
                family,
                "only base64 data URIs are supported",
            ));
        }
        return base64_decode(family, &src[comma_pos + 1..]);
    }

    // Only explicit path prefixes count; base64 text can contain '/'.
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return std::fs::read(src).map_err(|e| {
            FontError::not_found(family, format!("failed to read font file '{}': {}", src, e))
        });
    }

    base64_decode(family, src)
}

fn base64_decode(family: &str, input: &str) -> Result<Vec<u8>> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| FontError::not_found(family, format!("base64 decode error: {}", e)))
}
