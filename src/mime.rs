//! Extension to MIME type lookup.
//!
//! An immutable table built once at startup and passed by reference to
//! whatever needs it. Nothing here touches process-wide registries, so
//! lookups stay deterministic in tests.

use std::collections::HashMap;
use std::path::Path;

/// Fallback for unrecognized extensions.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Immutable extension → MIME type table.
#[derive(Debug, Clone)]
pub struct MimeTypes {
    map: HashMap<&'static str, &'static str>,
}

impl Default for MimeTypes {
    fn default() -> Self {
        Self::new()
    }
}

impl MimeTypes {
    /// Build the table with every type the server knows about.
    pub fn new() -> Self {
        let map = HashMap::from([
            // Book containers
            ("epub", "application/epub+zip"),
            ("fb2", "application/x-fictionbook+xml"),
            ("cbz", "application/vnd.comicbook+zip"),
            ("cbr", "application/vnd.comicbook-rar"),
            ("cb7", "application/x-cb7"),
            ("pdf", "application/pdf"),
            ("mobi", "application/x-mobipocket-ebook"),
            ("azw", "application/vnd.amazon.ebook"),
            ("azw3", "application/vnd.amazon.ebook"),
            ("djvu", "image/vnd.djvu"),
            ("txt", "text/plain"),
            ("rtf", "text/rtf"),
            ("html", "text/html"),
            ("htm", "text/html"),
            ("zip", "application/zip"),
            // Images (cover payloads)
            ("jpg", "image/jpeg"),
            ("jpeg", "image/jpeg"),
            ("png", "image/png"),
            ("gif", "image/gif"),
            ("webp", "image/webp"),
            ("svg", "image/svg+xml"),
        ]);

        Self { map }
    }

    /// Look up a MIME type by bare extension (case-insensitive).
    pub fn by_extension(&self, ext: &str) -> Option<&'static str> {
        self.map.get(ext.to_lowercase().as_str()).copied()
    }

    /// MIME type for a path or archive entry name, with octet-stream fallback.
    ///
    /// `.fb2.zip` is recognized as a compound suffix and reported as a zip,
    /// matching what e-readers expect when downloading the outer file.
    pub fn for_name(&self, name: &str) -> &'static str {
        let lower = name.to_lowercase();
        if lower.ends_with(".fb2.zip") {
            return "application/zip";
        }

        Path::new(&lower)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| self.by_extension(e))
            .unwrap_or(OCTET_STREAM)
    }
}
