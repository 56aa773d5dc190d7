//! CBZ (Comic Book ZIP) cover extraction.

use crate::cover::archive::BookArchive;
use crate::cover::{Cover, CoverError};
use crate::mime::MimeTypes;
use std::path::Path;

/// Check whether an archive entry name looks like a page image.
fn is_image_entry(name: &str) -> bool {
    if name.ends_with('/') {
        return false;
    }

    let lower = name.to_lowercase();
    lower.ends_with(".jpg")
        || lower.ends_with(".jpeg")
        || lower.ends_with(".png")
        || lower.ends_with(".webp")
}

/// Extract the cover image from a CBZ archive.
///
/// Selects the bytewise-lexicographically first image entry. This is a
/// heuristic: page-numbered naming conventions usually place the cover
/// first, but nothing guarantees it for arbitrarily named archives.
pub fn extract(path: &Path, mime: &MimeTypes) -> Result<Cover, CoverError> {
    let mut archive = BookArchive::open(path)?;

    let mut images: Vec<String> = archive
        .entry_names()
        .filter(|name| is_image_entry(name))
        .map(String::from)
        .collect();

    if images.is_empty() {
        return Err(CoverError::NotFound);
    }

    images.sort();
    let first = &images[0];

    let data = archive
        .read_entry(first)?
        .ok_or_else(|| CoverError::Format(format!("unreadable archive entry: {first}")))?;

    if data.is_empty() {
        return Err(CoverError::Format(format!("image entry is empty: {first}")));
    }

    Ok(Cover {
        data,
        mime_type: mime.for_name(first).to_string(),
    })
}
