use crate::config::Config;
use crate::cover::{CoverError, extract_cover};
use crate::library::{self, SortMode};
use crate::mime::MimeTypes;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const JPEG_BYTES: &[u8] = &[0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap();
}

fn container_xml(opf_path: &str) -> String {
    format!(
        r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="{opf_path}" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#
    )
}

fn epub_with_meta_cover(dir: &Path) -> PathBuf {
    let path = dir.join("meta-cover.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="2.0">
  <metadata><meta name="cover" content="c1"/></metadata>
  <manifest>
    <item id="c1" href="images/front.jpg" media-type="image/jpeg"/>
    <item id="page1" href="page1.xhtml" media-type="application/xhtml+xml"/>
  </manifest>
</package>"#;

    write_zip(
        &path,
        &[
            ("META-INF/container.xml", container_xml("OEBPS/content.opf").as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
            ("OEBPS/images/front.jpg", JPEG_BYTES),
            ("OEBPS/page1.xhtml", b"<html/>"),
        ],
    );
    path
}

fn epub_with_properties_cover(dir: &Path) -> PathBuf {
    let path = dir.join("props-cover.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" version="3.0">
  <metadata/>
  <manifest>
    <item id="cov" href="cover.png" media-type="image/png" properties="cover-image"/>
  </manifest>
</package>"#;

    write_zip(
        &path,
        &[
            ("META-INF/container.xml", container_xml("content.opf").as_bytes()),
            ("content.opf", opf.as_bytes()),
            ("cover.png", PNG_BYTES),
        ],
    );
    path
}

fn fb2_doc(coverpage: &str, binaries: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<FictionBook xmlns="http://www.gribuser.ru/xml/fictionbook/2.0"
             xmlns:l="http://www.w3.org/1999/xlink">
  <description><title-info><book-title>Test</book-title>{coverpage}</title-info></description>
  <body><section><p>text</p></section></body>
  {binaries}
</FictionBook>"#
    )
}

// ============================================================================
// EPUB
// ============================================================================

#[test]
fn epub_cover_via_meta_name_cover() {
    let dir = TempDir::new().unwrap();
    let path = epub_with_meta_cover(dir.path());
    let mime = MimeTypes::new();

    let cover = extract_cover(&path, &mime).unwrap();
    assert_eq!(cover.data, JPEG_BYTES);
    assert_eq!(cover.mime_type, "image/jpeg");
}

#[test]
fn epub_cover_via_cover_image_property() {
    let dir = TempDir::new().unwrap();
    let path = epub_with_properties_cover(dir.path());
    let mime = MimeTypes::new();

    let cover = extract_cover(&path, &mime).unwrap();
    assert_eq!(cover.data, PNG_BYTES);
    assert_eq!(cover.mime_type, "image/png");
}

#[test]
fn epub_mime_inferred_from_href_when_undeclared() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("no-media-type.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata><meta name="cover" content="c1"/></metadata>
  <manifest><item id="c1" href="front.webp"/></manifest>
</package>"#;

    write_zip(
        &path,
        &[
            ("META-INF/container.xml", container_xml("content.opf").as_bytes()),
            ("content.opf", opf.as_bytes()),
            ("front.webp", b"RIFF....WEBP"),
        ],
    );

    let cover = extract_cover(&path, &MimeTypes::new()).unwrap();
    assert_eq!(cover.mime_type, "image/webp");
}

#[test]
fn epub_missing_cover_entry_names_attempted_path() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dangling.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata><meta name="cover" content="c1"/></metadata>
  <manifest><item id="c1" href="images/gone.jpg" media-type="image/jpeg"/></manifest>
</package>"#;

    write_zip(
        &path,
        &[
            ("META-INF/container.xml", container_xml("OEBPS/content.opf").as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
        ],
    );

    match extract_cover(&path, &MimeTypes::new()) {
        Err(CoverError::Format(msg)) => assert!(msg.contains("OEBPS/images/gone.jpg")),
        other => panic!("expected Format error, got {other:?}"),
    }
}

#[test]
fn epub_zero_byte_cover_entry_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hollow.epub");
    let opf = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf">
  <metadata><meta name="cover" content="c1"/></metadata>
  <manifest><item id="c1" href="images/front.jpg" media-type="image/jpeg"/></manifest>
</package>"#;

    write_zip(
        &path,
        &[
            ("META-INF/container.xml", container_xml("OEBPS/content.opf").as_bytes()),
            ("OEBPS/content.opf", opf.as_bytes()),
            ("OEBPS/images/front.jpg", b""),
        ],
    );

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::Format(_))
    ));
}

#[test]
fn epub_without_container_xml_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.epub");
    write_zip(&path, &[("mimetype", b"application/epub+zip")]);

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::Format(_))
    ));
}

// ============================================================================
// CBZ
// ============================================================================

#[test]
fn cbz_picks_lexicographically_first_image() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("comic.cbz");
    write_zip(
        &path,
        &[
            ("b.png", PNG_BYTES),
            ("a.jpg", JPEG_BYTES),
            ("c.webp", b"RIFF....WEBP"),
        ],
    );

    let cover = extract_cover(&path, &MimeTypes::new()).unwrap();
    assert_eq!(cover.data, JPEG_BYTES);
    assert_eq!(cover.mime_type, "image/jpeg");
}

#[test]
fn cbz_without_images_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("noimages.cbz");
    write_zip(&path, &[("ComicInfo.xml", b"<ComicInfo/>"), ("notes.txt", b"x")]);

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::NotFound)
    ));
}

#[test]
fn cbz_ignores_non_image_entries_when_sorting() {
    // "0001.txt" sorts before the images but must not be selected.
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.cbz");
    write_zip(
        &path,
        &[("0001.txt", b"not an image"), ("0002.jpg", JPEG_BYTES)],
    );

    let cover = extract_cover(&path, &MimeTypes::new()).unwrap();
    assert_eq!(cover.data, JPEG_BYTES);
}

#[test]
fn cbz_zero_byte_image_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hollow.cbz");
    write_zip(&path, &[("0001.jpg", b""), ("0002.jpg", JPEG_BYTES)]);

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::Format(_))
    ));
}

// ============================================================================
// FB2
// ============================================================================

#[test]
fn fb2_cover_via_coverpage_href() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.fb2");
    let doc = fb2_doc(
        r##"<coverpage><image l:href="#img1"/></coverpage>"##,
        &format!(
            r#"<binary id="img1" content-type="image/jpeg">{}</binary>"#,
            BASE64.encode(JPEG_BYTES)
        ),
    );
    std::fs::write(&path, doc).unwrap();

    let cover = extract_cover(&path, &MimeTypes::new()).unwrap();
    assert_eq!(cover.data, JPEG_BYTES);
    assert_eq!(cover.mime_type, "image/jpeg");
}

#[test]
fn fb2_zip_extracts_inner_member() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("book.fb2.zip");
    let doc = fb2_doc(
        r##"<coverpage><image l:href="#img1"/></coverpage>"##,
        &format!(
            r#"<binary id="img1" content-type="image/png">{}</binary>"#,
            BASE64.encode(PNG_BYTES)
        ),
    );
    write_zip(&path, &[("book.fb2", doc.as_bytes())]);

    let cover = extract_cover(&path, &MimeTypes::new()).unwrap();
    assert_eq!(cover.data, PNG_BYTES);
    assert_eq!(cover.mime_type, "image/png");
}

#[test]
fn fb2_zip_without_inner_fb2_is_format_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("odd.fb2.zip");
    write_zip(&path, &[("readme.txt", b"nothing here")]);

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::Format(_))
    ));
}

#[test]
fn fb2_with_no_binaries_is_not_found() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bare.fb2");
    std::fs::write(&path, fb2_doc("", "")).unwrap();

    assert!(matches!(
        extract_cover(&path, &MimeTypes::new()),
        Err(CoverError::NotFound)
    ));
}

// ============================================================================
// DISPATCH AND GENERAL PROPERTIES
// ============================================================================

#[test]
fn repeated_extraction_is_byte_identical() {
    let dir = TempDir::new().unwrap();
    let path = epub_with_meta_cover(dir.path());
    let mime = MimeTypes::new();

    let first = extract_cover(&path, &mime).unwrap();
    let second = extract_cover(&path, &mime).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_epub_is_io_error() {
    let mime = MimeTypes::new();
    let err = extract_cover(Path::new("/nonexistent/book.epub"), &mime).unwrap_err();
    assert!(matches!(err, CoverError::Io(_)));
}

#[test]
fn success_always_yields_nonempty_fields() {
    let dir = TempDir::new().unwrap();
    let mime = MimeTypes::new();

    for path in [
        epub_with_meta_cover(dir.path()),
        epub_with_properties_cover(dir.path()),
    ] {
        let cover = extract_cover(&path, &mime).unwrap();
        assert!(!cover.data.is_empty());
        assert!(!cover.mime_type.is_empty());
    }
}

// ============================================================================
// LIBRARY SCAN
// ============================================================================

#[test]
fn scan_lists_supported_files_recursively() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("one.epub"), b"x").unwrap();
    std::fs::write(dir.path().join("sub").join("two.cbz"), b"y").unwrap();
    std::fs::write(dir.path().join("ignore.jpg"), b"z").unwrap();
    std::fs::write(dir.path().join("wrapped.fb2.zip"), b"w").unwrap();

    let mime = MimeTypes::new();
    let mut books = library::scan_books(dir.path(), &mime).unwrap();
    library::sort_books(&mut books, SortMode::NameAsc);

    let names: Vec<_> = books.iter().map(|b| b.filename.as_str()).collect();
    assert_eq!(names, ["one.epub", "sub/two.cbz", "wrapped.fb2.zip"]);
    assert_eq!(books[0].mime_type, "application/epub+zip");
    assert_eq!(books[1].mime_type, "application/vnd.comicbook+zip");
}

#[test]
fn scan_ids_are_stable_across_scans() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("one.epub"), b"x").unwrap();

    let mime = MimeTypes::new();
    let first = library::scan_books(dir.path(), &mime).unwrap();
    let second = library::scan_books(dir.path(), &mime).unwrap();
    assert_eq!(first[0].id, second[0].id);
}

// ============================================================================
// CONFIG
// ============================================================================

#[test]
fn config_parse_toml() {
    let toml = r#"
[server]
bind = "127.0.0.1:9090"
title = "Test Shelf"
base_url = "https://books.example.org"

[library]
path = "/srv/books"
sort = "name-asc"
"#;
    let config: Config = toml::from_str(toml).unwrap();
    assert_eq!(config.server.bind.port(), 9090);
    assert_eq!(config.server.title, "Test Shelf");
    assert_eq!(
        config.server.base_url.as_deref(),
        Some("https://books.example.org")
    );
    assert_eq!(config.library.path, PathBuf::from("/srv/books"));
    assert_eq!(config.library.sort, SortMode::NameAsc);
}

#[test]
fn config_default_values() {
    let config = Config::default();
    assert_eq!(config.server.bind.port(), 3000);
    assert_eq!(config.server.title, "My Bookshelf");
    assert!(config.server.base_url.is_none());
    assert_eq!(config.library.sort, SortMode::DateDesc);
}

#[test]
fn generated_default_config_parses() {
    let config: Config = toml::from_str(&Config::generate_default()).unwrap();
    assert_eq!(config.server.bind.port(), 3000);
}
