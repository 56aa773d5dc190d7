//! Application state shared across handlers.

use crate::config::Config;
use crate::error::Result;
use crate::library::{self, Book, SortMode};
use crate::mime::MimeTypes;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Shared application state.
///
/// Nothing here is mutable: the library is listed from disk on demand and
/// the MIME table is built once at startup.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Immutable extension → MIME lookup table.
    pub mime: Arc<MimeTypes>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            mime: Arc::new(MimeTypes::new()),
        }
    }

    /// Get the base URL for generating links.
    ///
    /// Empty means relative links, which work both directly and behind a
    /// path-preserving reverse proxy.
    pub fn base_url(&self) -> String {
        self.config
            .server
            .base_url
            .clone()
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// The configured books directory.
    pub fn books_dir(&self) -> &Path {
        &self.config.library.path
    }

    /// List the library, sorted.
    pub fn list_books(&self, sort: Option<SortMode>) -> Result<Vec<Book>> {
        let mut books = library::scan_books(self.books_dir(), &self.mime)?;
        library::sort_books(&mut books, sort.unwrap_or(self.config.library.sort));
        Ok(books)
    }

    /// Resolve a client-supplied relative filename inside the books
    /// directory.
    ///
    /// Rejects absolute paths and any `..` component; the cover extractor
    /// and file handlers trust the paths they receive, so this is the one
    /// place traversal is stopped.
    pub fn resolve_book_path(&self, filename: &str) -> Result<PathBuf> {
        let rel = Path::new(filename);

        let safe = !filename.is_empty()
            && rel.components().all(|c| {
                matches!(c, std::path::Component::Normal(part) if part.to_str().is_some_and(|s| !s.contains('\\')))
            });

        if !safe {
            return Err(crate::error::AppError::BadRequest(format!(
                "invalid filename: {filename}"
            )));
        }

        Ok(self.books_dir().join(rel))
    }
}
