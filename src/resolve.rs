//! # Font Resolution
//!
//! Maps a requested family + style to a parsed [`TrueTypeFont`].
//!
//! Sources are tried in order:
//!
//! 1. fonts registered on the context (from config or [`ResolveContext::register`]),
//! 2. the byte-data callback, if one is installed,
//! 3. the configured font folders, by file name.
//!
//! Parsed fonts are cached per request, so resolving the same family twice
//! hands out the same `Arc`.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{FontError, Result};
use crate::font::source::load_font_source;
use crate::font::TrueTypeFont;

/// Requested family and style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FontRequest {
    pub family: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl FontRequest {
    pub fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_string(),
            bold,
            italic,
        }
    }

    pub fn regular(family: &str) -> Self {
        Self::new(family, false, false)
    }

    fn key(&self) -> FontKey {
        FontKey {
            family: self.family.to_lowercase(),
            bold: self.bold,
            italic: self.italic,
        }
    }

    fn style_suffix(&self) -> &'static str {
        match (self.bold, self.italic) {
            (false, false) => "Regular",
            (true, false) => "Bold",
            (false, true) => "Italic",
            (true, true) => "BoldItalic",
        }
    }

    /// File stems that satisfy this request, most specific first.
    fn file_stems(&self) -> Vec<String> {
        let mut bases = vec![self.family.clone()];
        let compact: String = self.family.chars().filter(|c| !c.is_whitespace()).collect();
        if compact != self.family {
            bases.push(compact);
        }

        let suffixes: &[&str] = match (self.bold, self.italic) {
            (false, false) => &["", "-Regular"],
            (true, false) => &["-Bold"],
            (false, true) => &["-Italic", "-Oblique"],
            (true, true) => &["-BoldItalic", "-BoldOblique"],
        };

        let mut stems = Vec::new();
        for base in &bases {
            for suffix in suffixes {
                stems.push(format!("{}{}", base, suffix).to_lowercase());
            }
        }
        stems
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

type FontCallback = Box<dyn Fn(&FontRequest) -> Option<Vec<u8>> + Send + Sync>;

/// Font lookup state for one engine instance.
#[derive(Default)]
pub struct ResolveContext {
    folders: Vec<PathBuf>,
    registered: HashMap<FontKey, Vec<u8>>,
    callback: Option<FontCallback>,
    cache: HashMap<FontKey, Arc<TrueTypeFont>>,
    /// Folders whose listing was refused; they are not tried again.
    failed_folders: BTreeSet<PathBuf>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from engine configuration, loading every configured
    /// font source up front.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let mut ctx = Self::new();
        for folder in &config.font_folders {
            ctx.folders.push(folder.clone());
        }
        for entry in &config.fonts {
            let data = load_font_source(&entry.family, &entry.src)?;
            ctx.register(&entry.family, entry.bold, entry.italic, data);
        }
        Ok(ctx)
    }

    pub fn with_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.folders.push(folder.into());
        self
    }

    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&FontRequest) -> Option<Vec<u8>> + Send + Sync + 'static,
    {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Register font bytes for a family and style. Replaces any earlier
    /// registration and drops a cached parse of it.
    pub fn register(&mut self, family: &str, bold: bool, italic: bool, data: Vec<u8>) {
        let key = FontRequest::new(family, bold, italic).key();
        self.cache.remove(&key);
        self.registered.insert(key, data);
    }

    pub fn folders(&self) -> &[PathBuf] {
        &self.folders
    }

    /// Whether listing `folder` failed with a permission error.
    pub fn folder_access_failed(&self, folder: &Path) -> bool {
        self.failed_folders.contains(folder)
    }

    pub fn resolve(&mut self, request: &FontRequest) -> Result<Arc<TrueTypeFont>> {
        let key = request.key();
        if let Some(font) = self.cache.get(&key) {
            return Ok(Arc::clone(font));
        }

        let font = Arc::new(self.load(request)?);
        log::debug!(
            "resolved font '{}' ({}) to '{}'",
            request.family,
            request.style_suffix(),
            font.names().postscript_name
        );
        self.cache.insert(key, Arc::clone(&font));
        Ok(font)
    }

    fn load(&mut self, request: &FontRequest) -> Result<TrueTypeFont> {
        if let Some(data) = self.registered.get(&request.key()) {
            return TrueTypeFont::parse_family(data.clone(), &request.family);
        }

        if let Some(callback) = &self.callback {
            if let Some(data) = callback(request) {
                return TrueTypeFont::parse_family(data, &request.family);
            }
        }

        if let Some(path) = self.find_in_folders(request) {
            let data = std::fs::read(&path).map_err(|e| {
                FontError::not_found(
                    &request.family,
                    format!("failed to read '{}': {}", path.display(), e),
                )
            })?;
            return self.parse_file(data, request);
        }

        // A registered regular face stands in for a missing style.
        if request.bold || request.italic {
            let regular = FontRequest::regular(&request.family).key();
            if let Some(data) = self.registered.get(&regular) {
                log::warn!(
                    "no {} face for '{}'; using the regular face",
                    request.style_suffix(),
                    request.family
                );
                return TrueTypeFont::parse_family(data.clone(), &request.family);
            }
        }

        Err(FontError::not_found(
            &request.family,
            format!(
                "no registered font, callback result or matching file in {} folder(s)",
                self.folders.len()
            ),
        ))
    }

    fn parse_file(&self, data: Vec<u8>, request: &FontRequest) -> Result<TrueTypeFont> {
        // Collections usually bundle every style; prefer the styled full name.
        if (request.bold || request.italic) && crate::font::sfnt::is_collection(&data) {
            let styled = format!("{} {}", request.family, request.style_suffix());
            let data: Arc<[u8]> = data.into();
            return TrueTypeFont::parse_family(Arc::clone(&data), &styled)
                .or_else(|_| TrueTypeFont::parse_family(data, &request.family));
        }
        TrueTypeFont::parse_family(data, &request.family)
    }

    fn find_in_folders(&mut self, request: &FontRequest) -> Option<PathBuf> {
        let stems = request.file_stems();
        let folders: Vec<PathBuf> = self
            .folders
            .iter()
            .filter(|f| !self.failed_folders.contains(*f))
            .cloned()
            .collect();

        for folder in folders {
            let mut candidates = match list_font_files(&folder) {
                Ok(files) => files,
                Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                    log::warn!("cannot list font folder '{}': {}", folder.display(), e);
                    self.failed_folders.insert(folder);
                    continue;
                }
                Err(e) => {
                    log::debug!("skipping font folder '{}': {}", folder.display(), e);
                    continue;
                }
            };
            candidates.sort();

            for stem in &stems {
                let found = candidates.iter().find(|path| {
                    path.file_stem()
                        .and_then(|s| s.to_str())
                        .is_some_and(|s| s.to_lowercase() == *stem)
                });
                if let Some(path) = found {
                    return Some(path.clone());
                }
            }
        }
        None
    }
}

impl fmt::Debug for ResolveContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveContext")
            .field("folders", &self.folders)
            .field("registered", &self.registered.len())
            .field("callback", &self.callback.is_some())
            .field("cached", &self.cache.len())
            .field("failed_folders", &self.failed_folders)
            .finish()
    }
}

/// `.ttf` and `.ttc` files directly inside `folder`.
fn list_font_files(folder: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(folder)? {
        let path = entry?.path();
        let is_font = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf") || e.eq_ignore_ascii_case("ttc"));
        if is_font && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_stems_regular() {
        let stems = FontRequest::regular("Open Sans").file_stems();
        assert_eq!(
            stems,
            vec!["open sans", "open sans-regular", "opensans", "opensans-regular"]
        );
    }

    #[test]
    fn test_file_stems_bold_italic() {
        let stems = FontRequest::new("Inter", true, true).file_stems();
        assert_eq!(stems, vec!["inter-bolditalic", "inter-boldoblique"]);
    }

    #[test]
    fn test_unknown_family_not_found() {
        let mut ctx = ResolveContext::new();
        let err = ctx.resolve(&FontRequest::regular("Nope")).unwrap_err();
        assert!(matches!(err, FontError::NotFound { ref family, .. } if family == "Nope"));
    }

    #[test]
    fn test_missing_folder_is_skipped_not_failed() {
        let folder = PathBuf::from("/nonexistent/forme/fonts");
        let mut ctx = ResolveContext::new().with_folder(&folder);
        assert!(ctx.resolve(&FontRequest::regular("Nope")).is_err());
        assert!(!ctx.folder_access_failed(&folder));
    }

    #[test]
    fn test_callback_consulted_with_request() {
        let mut ctx = ResolveContext::new().with_callback(|req| {
            assert_eq!(req.family, "Inter");
            assert!(req.bold);
            // Not a font: the parse error must surface, not NotFound.
            Some(vec![0u8; 4])
        });
        let err = ctx.resolve(&FontRequest::new("Inter", true, false)).unwrap_err();
        assert!(matches!(err, FontError::Format(_)));
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let req: FontRequest = serde_json::from_str(r#"{ "family": "Inter" }"#).unwrap();
        assert_eq!(req, FontRequest::regular("Inter"));
    }
}
