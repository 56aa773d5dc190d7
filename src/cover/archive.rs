//! Zip archive access for EPUB and CBZ containers.

use crate::cover::CoverError;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;
use zip::result::ZipError;

/// A zip-formatted book container, open for the duration of one
/// extraction call.
///
/// The handle is dropped on every exit path, success or error, so no
/// cleanup is ever left to the caller.
#[derive(Debug)]
pub struct BookArchive {
    inner: ZipArchive<File>,
}

impl BookArchive {
    /// Open a zip container for reading.
    ///
    /// A missing or corrupt file fails with [`CoverError::Io`].
    pub fn open(path: &Path) -> Result<Self, CoverError> {
        let file = File::open(path)?;
        let inner = ZipArchive::new(file).map_err(|e| match e {
            ZipError::Io(io) => CoverError::Io(io),
            other => CoverError::Io(std::io::Error::other(other)),
        })?;

        Ok(Self { inner })
    }

    /// Read a member by exact name, fully decompressed.
    ///
    /// Returns `Ok(None)` when no member has that name, which is distinct
    /// from a read failure; callers decide whether an absent member is a
    /// format defect or just the end of a fallback chain.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, CoverError> {
        let mut entry = match self.inner.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(ZipError::Io(io)) => return Err(CoverError::Io(io)),
            Err(other) => {
                return Err(CoverError::Format(format!(
                    "unreadable archive entry {name}: {other}"
                )));
            }
        };

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        Ok(Some(data))
    }

    /// Iterate over all member names, directories included.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.inner.file_names()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::ZipWriter;
    use zip::write::SimpleFileOptions;

    fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
        let file = File::create(path).unwrap();
        let mut writer = ZipWriter::new(file);
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);

        for (name, data) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn read_existing_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.zip");
        write_archive(&path, &[("a.txt", b"hello")]);

        let mut archive = BookArchive::open(&path).unwrap();
        assert_eq!(archive.read_entry("a.txt").unwrap(), Some(b"hello".to_vec()));
    }

    #[test]
    fn absent_entry_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.zip");
        write_archive(&path, &[("a.txt", b"hello")]);

        let mut archive = BookArchive::open(&path).unwrap();
        assert!(archive.read_entry("missing.txt").unwrap().is_none());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BookArchive::open(Path::new("/nonexistent/book.epub")).unwrap_err();
        assert!(matches!(err, CoverError::Io(_)));
    }

    #[test]
    fn corrupt_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zip");
        std::fs::write(&path, b"this is not a zip archive").unwrap();

        let err = BookArchive::open(&path).unwrap_err();
        assert!(matches!(err, CoverError::Io(_)));
    }
}
