//! Library directory scanning and book models.

use crate::error::Result;
use crate::mime::MimeTypes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;
use walkdir::WalkDir;

/// File extensions served from the library directory.
const SUPPORTED_EXTENSIONS: &[&str] = &[
    "epub", "pdf", "fb2", "mobi", "azw", "azw3", "azw4", "txt", "rtf", "html", "htm", "djvu",
    "cbz", "cbr", "cb7",
];

/// A book in the library, as listed from disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    /// Stable identifier derived from the relative path.
    pub id: String,

    /// Path relative to the books directory, with forward slashes.
    pub filename: String,

    /// Display title derived from the file name.
    pub title: String,

    /// MIME type of the book file.
    pub mime_type: String,

    /// File size in bytes.
    pub size: u64,

    /// Last modified time.
    pub modified: DateTime<Utc>,
}

impl Book {
    /// Short human-readable format label for templates.
    pub fn format_label(&self) -> &'static str {
        match self.mime_type.as_str() {
            "application/epub+zip" => "EPUB",
            "application/pdf" => "PDF",
            "application/x-fictionbook+xml" => "FB2",
            "application/zip" => "ZIP",
            "application/vnd.comicbook+zip" => "CBZ",
            "application/vnd.comicbook-rar" => "CBR",
            "application/x-cb7" => "CB7",
            "application/x-mobipocket-ebook" => "MOBI",
            "application/vnd.amazon.ebook" => "AZW",
            "image/vnd.djvu" => "DJVU",
            "text/plain" => "TXT",
            "text/rtf" => "RTF",
            "text/html" => "HTML",
            _ => "FILE",
        }
    }
}

/// Check whether a file name is a supported book type.
///
/// The compound `.fb2.zip` suffix is accepted even though bare `.zip`
/// is not.
pub fn is_supported(name: &str) -> bool {
    let lower = name.to_lowercase();
    if lower.ends_with(".fb2.zip") {
        return true;
    }

    lower
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SUPPORTED_EXTENSIONS.contains(&ext))
}

/// Clean up a file name into a readable title.
pub fn cleanup_title(filename: &str) -> String {
    let base = filename.rsplit('/').next().unwrap_or(filename);

    // The compound suffix is stripped whole, any case; file_stem alone
    // would leave a trailing ".fb2".
    let stem = match base.len().checked_sub(8).and_then(|i| base.get(i..)) {
        Some(tail) if tail.eq_ignore_ascii_case(".fb2.zip") => &base[..base.len() - 8],
        _ => base,
    };
    let stem = Path::new(stem)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(stem);

    stem.replace(['-', '_'], " ").trim().to_string()
}

/// Scan the books directory recursively and list every supported file.
///
/// Unreadable entries are logged and skipped rather than failing the whole
/// listing.
pub fn scan_books(books_dir: &Path, mime: &MimeTypes) -> Result<Vec<Book>> {
    let mut books = Vec::new();

    for entry in WalkDir::new(books_dir) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "Skipping unreadable entry during scan");
                continue;
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if !is_supported(&name) {
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %entry.path().display(), error = %e, "Skipping file without metadata");
                continue;
            }
        };

        let relative = entry
            .path()
            .strip_prefix(books_dir)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        books.push(Book {
            id: Uuid::new_v5(&Uuid::NAMESPACE_URL, relative.as_bytes()).to_string(),
            title: cleanup_title(&relative),
            mime_type: mime.for_name(&relative).to_string(),
            size: metadata.len(),
            modified: metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now()),
            filename: relative,
        });
    }

    Ok(books)
}

/// How a book listing is ordered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Title ascending, case-insensitive.
    NameAsc,
    /// Title descending, case-insensitive.
    NameDesc,
    /// Oldest first.
    DateAsc,
    /// Newest first (default).
    #[default]
    DateDesc,
}

impl SortMode {
    /// Query parameter value for this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::NameAsc => "name-asc",
            SortMode::NameDesc => "name-desc",
            SortMode::DateAsc => "date-asc",
            SortMode::DateDesc => "date-desc",
        }
    }
}

/// Sort a book listing in place.
pub fn sort_books(books: &mut [Book], mode: SortMode) {
    match mode {
        SortMode::NameAsc => {
            books.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()));
        }
        SortMode::NameDesc => {
            books.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()));
        }
        SortMode::DateAsc => books.sort_by_key(|b| b.modified),
        SortMode::DateDesc => {
            books.sort_by_key(|b| std::cmp::Reverse(b.modified));
        }
    }
}

/// Human-readable file size.
pub fn format_size(size: u64) -> String {
    const UNIT: u64 = 1024;
    if size < UNIT {
        return format!("{size} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = size / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", size as f64 / div as f64, b"KMGTPE"[exp] as char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn book(title: &str, ts: i64) -> Book {
        Book {
            id: String::new(),
            filename: format!("{title}.epub"),
            title: title.to_string(),
            mime_type: "application/epub+zip".to_string(),
            size: 0,
            modified: Utc.timestamp_opt(ts, 0).unwrap(),
        }
    }

    #[test]
    fn supported_extensions() {
        assert!(is_supported("book.epub"));
        assert!(is_supported("Book.EPUB"));
        assert!(is_supported("comic.cbz"));
        assert!(is_supported("book.fb2"));
        assert!(is_supported("book.fb2.zip"));
        assert!(!is_supported("archive.zip"));
        assert!(!is_supported("cover.jpg"));
        assert!(!is_supported("noextension"));
    }

    #[test]
    fn title_cleanup() {
        assert_eq!(cleanup_title("war_and_peace.epub"), "war and peace");
        assert_eq!(cleanup_title("some-comic.cbz"), "some comic");
        assert_eq!(cleanup_title("sub/dir/my_book.fb2"), "my book");
        assert_eq!(cleanup_title("book.fb2.zip"), "book");
        assert_eq!(cleanup_title("Book.FB2.ZIP"), "Book");
        assert_eq!(cleanup_title("sub/dir/Other.Fb2.Zip"), "Other");
    }

    #[test]
    fn sorting_modes() {
        let mut books = vec![book("Beta", 200), book("alpha", 100), book("Gamma", 300)];

        sort_books(&mut books, SortMode::NameAsc);
        assert_eq!(books[0].title, "alpha");
        assert_eq!(books[2].title, "Gamma");

        sort_books(&mut books, SortMode::NameDesc);
        assert_eq!(books[0].title, "Gamma");

        sort_books(&mut books, SortMode::DateAsc);
        assert_eq!(books[0].title, "alpha");

        sort_books(&mut books, SortMode::DateDesc);
        assert_eq!(books[0].title, "Gamma");
    }

    #[test]
    fn size_formatting() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
