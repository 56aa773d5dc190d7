//! FB2 (FictionBook) cover extraction.
//!
//! FB2 is a single XML document with images embedded as base64 `<binary>`
//! elements. The whole file is read into memory before parsing: FB2 files
//! are text and fit comfortably, and this extractor intentionally does not
//! stream (very large files cost proportional memory).
//!
//! Cover resolution follows a strict precedence order:
//!
//! a. the `coverpage/image` href, minus any leading `#`;
//! b. if empty, the literal default candidate `cover.jpg`;
//! c. the first binary whose id equals the candidate — or, only for the
//!    default candidate, whose id contains `cover`;
//! d. failing that, the first binary whose content-type starts with
//!    `image/`;
//! e. failing that, no cover.
//!
//! Reordering these branches silently changes which real-world files
//! resolve, so they stay exactly as written.

use crate::cover::archive::BookArchive;
use crate::cover::{Cover, CoverError};
use crate::mime;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use roxmltree::Document;
use std::path::Path;

/// Candidate id assumed when the document carries no coverpage reference.
const DEFAULT_COVER_ID: &str = "cover.jpg";

/// Extract the cover image from a plain `.fb2` file.
pub fn extract(path: &Path) -> Result<Cover, CoverError> {
    let data = std::fs::read(path)?;
    extract_from_bytes(&data)
}

/// Extract the cover image from a `.fb2.zip` file.
///
/// Unzips the outer archive and feeds the first `.fb2` member to the XML
/// path, rather than the raw zip bytes.
pub fn extract_zipped(path: &Path) -> Result<Cover, CoverError> {
    let mut archive = BookArchive::open(path)?;

    let inner = archive
        .entry_names()
        .find(|n| !n.ends_with('/') && n.to_lowercase().ends_with(".fb2"))
        .map(String::from)
        .ok_or_else(|| CoverError::Format("no .fb2 member inside .fb2.zip archive".into()))?;

    let data = archive
        .read_entry(&inner)?
        .ok_or_else(|| CoverError::Format(format!("unreadable archive entry: {inner}")))?;

    extract_from_bytes(&data)
}

/// Run cover resolution over raw FB2 document bytes.
fn extract_from_bytes(data: &[u8]) -> Result<Cover, CoverError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| CoverError::Format("FB2 document is not UTF-8".into()))?;
    let doc = Document::parse(text)?;

    // Rules a + b: coverpage href, stripped of '#', or the default.
    let href = doc
        .descendants()
        .find(|n| n.has_tag_name("coverpage"))
        .and_then(|cp| cp.descendants().find(|n| n.has_tag_name("image")))
        .and_then(|img| {
            // The href is usually namespaced (l:href / xlink:href); match
            // the local attribute name and ignore the prefix.
            img.attributes().find(|a| a.name() == "href")
        })
        .map(|a| a.value())
        .unwrap_or("");

    let candidate = href.strip_prefix('#').unwrap_or(href);
    let candidate = if candidate.is_empty() {
        DEFAULT_COVER_ID
    } else {
        candidate
    };
    let is_default = candidate == DEFAULT_COVER_ID;

    let binaries: Vec<_> = doc
        .descendants()
        .filter(|n| n.has_tag_name("binary"))
        .collect();

    // Rule c: exact id match, or the loose "contains cover" heuristic when
    // we are guessing with the default candidate. First in document order.
    let matched = binaries
        .iter()
        .find(|b| {
            b.attribute("id")
                .is_some_and(|id| id == candidate || (is_default && id.contains("cover")))
        })
        // Rule d: first binary that declares itself an image.
        .or_else(|| {
            binaries.iter().find(|b| {
                b.attribute("content-type")
                    .is_some_and(|ct| ct.starts_with("image/"))
            })
        })
        // Rule e.
        .ok_or(CoverError::NotFound)?;

    let data = BASE64
        .decode(matched.text().unwrap_or("").trim())
        .map_err(|e| CoverError::Format(format!("invalid base64 in binary element: {e}")))?;

    if data.is_empty() {
        return Err(CoverError::Format("binary element has no payload".into()));
    }

    let mime_type = matched
        .attribute("content-type")
        .unwrap_or(mime::OCTET_STREAM)
        .to_string();

    Ok(Cover { data, mime_type })
}
