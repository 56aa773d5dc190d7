//! bookshelf-rs: a small personal OPDS server.
//!
//! Serves a directory of e-books as an OPDS 1.2 acquisition feed and a
//! minimal HTML admin page, with upload/rename/delete management and
//! on-the-fly cover extraction from EPUB, CBZ and FB2 containers.
//!
//! # Features
//!
//! - OPDS acquisition feed over a plain directory (no database)
//! - Cover extraction with per-format fallback heuristics
//! - HTML admin page with upload, rename and delete
//! - Direct book downloads
//! - Sortable listings (name/date, ascending/descending)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Configuration and CLI.
pub mod config;
/// Cover extraction from e-book containers.
pub mod cover;
/// Error types.
pub mod error;
/// Library directory scanning and book models.
pub mod library;
/// Extension to MIME type lookup.
pub mod mime;
/// OPDS feed generation.
pub mod opds;
/// HTTP server.
pub mod server;

#[cfg(test)]
mod tests;

pub use config::{Cli, Command, Config};
pub use cover::{Cover, CoverError, extract_cover};
pub use error::{AppError, Result};
pub use mime::MimeTypes;
pub use server::AppState;
