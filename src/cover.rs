//! Cover extraction from e-book containers.
//!
//! The single entry point is [`extract_cover`]: given a path to an EPUB,
//! CBZ or FB2 file it returns the embedded cover image bytes together with
//! a MIME type. Each format has its own ordered fallback heuristics; the
//! order of those fallbacks is load-bearing and documented in the
//! respective submodules.
//!
//! Extraction is synchronous, stateless and read-only. Every call opens its
//! own handles and drops them on return, so concurrent calls — including
//! calls against the same file — need no coordination.

mod archive;
mod cbz;
mod epub;
mod fb2;

use crate::mime::MimeTypes;
use std::path::Path;
use thiserror::Error;

/// An extracted cover image.
///
/// Both fields are non-empty on every success path; when a MIME type
/// cannot be resolved the extractors fall back to
/// `application/octet-stream`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    /// Raw image bytes as stored in the container.
    pub data: Vec<u8>,
    /// MIME type of the image.
    pub mime_type: String,
}

/// Why a cover could not be extracted.
///
/// All variants are terminal for a given call: extraction over static file
/// content is deterministic, so retrying with the same input reproduces
/// the same outcome.
#[derive(Error, Debug)]
pub enum CoverError {
    /// File extension not in the recognized set.
    #[error("unsupported file type: {0}")]
    NotSupported(String),

    /// The file or archive could not be opened or read.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Content present but structurally invalid: bad XML, bad base64, or a
    /// reference to a missing archive member. The message names what failed.
    #[error("invalid container: {0}")]
    Format(String),

    /// Well-formed container with no cover resolvable under any fallback.
    #[error("no cover found")]
    NotFound,
}

impl From<roxmltree::Error> for CoverError {
    fn from(err: roxmltree::Error) -> Self {
        CoverError::Format(format!("XML parse error: {err}"))
    }
}

/// The formats the extractor recognizes.
///
/// Closed set: dispatch happens in exactly one place and there is no open
/// extension mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Epub,
    Cbz,
    Fb2,
    /// An FB2 document wrapped in a zip archive (`.fb2.zip`).
    Fb2Zip,
}

impl ContainerKind {
    /// Detect the container kind from the file name.
    ///
    /// `.fb2.zip` is a compound suffix and must be checked before the bare
    /// last-extension lookup would classify the file as a plain zip.
    fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();

        if name.ends_with(".fb2.zip") {
            return Some(ContainerKind::Fb2Zip);
        }

        match name.rsplit_once('.')?.1 {
            "epub" => Some(ContainerKind::Epub),
            "cbz" => Some(ContainerKind::Cbz),
            "fb2" => Some(ContainerKind::Fb2),
            _ => None,
        }
    }
}

/// Extract the cover image from a book file.
///
/// The path must already point at a real, sanitized file; no traversal
/// protection happens here. Routing is by lower-cased extension:
/// `.epub`, `.cbz`, `.fb2` and `.fb2.zip`. Anything else fails with
/// [`CoverError::NotSupported`] without touching the filesystem.
pub fn extract_cover(path: &Path, mime: &MimeTypes) -> Result<Cover, CoverError> {
    let kind = ContainerKind::from_path(path).ok_or_else(|| {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)");
        CoverError::NotSupported(ext.to_lowercase())
    })?;

    match kind {
        ContainerKind::Epub => epub::extract(path, mime),
        ContainerKind::Cbz => cbz::extract(path, mime),
        ContainerKind::Fb2 => fb2::extract(path),
        ContainerKind::Fb2Zip => fb2::extract_zipped(path),
    }
}
