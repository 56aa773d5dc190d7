//! EPUB cover extraction.
//!
//! Walks the standard indirection chain: `META-INF/container.xml` names
//! the OPF package document, whose manifest names the cover image. Two
//! resolution methods are tried in order, first match wins:
//!
//! 1. Method A: `<meta name="cover" content="ID"/>` in the metadata,
//!    pointing at a manifest item by id.
//! 2. Method B: a manifest item whose `properties` carries the
//!    `cover-image` token (EPUB 3).
//!
//! The order matters: real books exist where both are present and only
//! the `meta` pair points at the intended image.

use crate::cover::archive::BookArchive;
use crate::cover::{Cover, CoverError};
use crate::mime::MimeTypes;
use roxmltree::Document;
use std::path::Path;

/// Location of the container descriptor inside every EPUB.
const CONTAINER_PATH: &str = "META-INF/container.xml";

/// Extract the cover image from an EPUB file.
pub fn extract(path: &Path, mime: &MimeTypes) -> Result<Cover, CoverError> {
    let mut archive = BookArchive::open(path)?;

    let opf_path = find_opf_path(&mut archive)?;

    let opf_content = archive
        .read_entry(&opf_path)?
        .ok_or_else(|| CoverError::Format(format!("missing OPF document: {opf_path}")))?;
    let opf_content = String::from_utf8(opf_content)
        .map_err(|_| CoverError::Format(format!("OPF document is not UTF-8: {opf_path}")))?;

    let (href, media_type) = find_cover_href(&opf_content)?;

    // Hrefs are relative to the directory containing the OPF document.
    // Plain path join, no URL decoding.
    let opf_dir = opf_path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    let cover_path = if opf_dir.is_empty() {
        href.clone()
    } else {
        format!("{opf_dir}/{href}")
    };

    let data = archive.read_entry(&cover_path)?.ok_or_else(|| {
        CoverError::Format(format!("cover image not found in archive: {cover_path}"))
    })?;

    if data.is_empty() {
        return Err(CoverError::Format(format!(
            "cover image entry is empty: {cover_path}"
        )));
    }

    let mime_type = media_type.unwrap_or_else(|| mime.for_name(&href).to_string());

    Ok(Cover { data, mime_type })
}

/// Read `META-INF/container.xml` and return the first rootfile's full-path.
fn find_opf_path(archive: &mut BookArchive) -> Result<String, CoverError> {
    let content = archive
        .read_entry(CONTAINER_PATH)?
        .ok_or_else(|| CoverError::Format(format!("missing {CONTAINER_PATH}")))?;
    let content = String::from_utf8(content)
        .map_err(|_| CoverError::Format(format!("{CONTAINER_PATH} is not UTF-8")))?;

    let doc = Document::parse(&content)?;

    doc.descendants()
        .find(|n| n.has_tag_name("rootfile"))
        .and_then(|n| n.attribute("full-path"))
        .map(String::from)
        .ok_or_else(|| CoverError::Format("no rootfile in container.xml".into()))
}

/// Resolve the cover href (and declared media-type) from the OPF document.
fn find_cover_href(opf: &str) -> Result<(String, Option<String>), CoverError> {
    let doc = Document::parse(opf)?;

    // Method A: meta name="cover" content="ID" -> manifest item with that id.
    let cover_id = doc
        .descendants()
        .find(|n| n.has_tag_name("meta") && n.attribute("name") == Some("cover"))
        .and_then(|n| n.attribute("content"));

    if let Some(id) = cover_id
        && let Some(item) = doc
            .descendants()
            .find(|n| n.has_tag_name("item") && n.attribute("id") == Some(id))
        && let Some(href) = item.attribute("href")
    {
        let media_type = item.attribute("media-type").map(String::from);
        return Ok((href.to_string(), media_type));
    }

    // Method B: manifest item carrying the cover-image property (EPUB 3).
    if let Some(item) = doc.descendants().find(|n| {
        n.has_tag_name("item")
            && n.attribute("properties")
                .is_some_and(|p| p.split_whitespace().any(|t| t == "cover-image"))
    }) && let Some(href) = item.attribute("href")
    {
        let media_type = item.attribute("media-type").map(String::from);
        return Ok((href.to_string(), media_type));
    }

    Err(CoverError::NotFound)
}
