//! HTTP request handlers.

use crate::cover::extract_cover;
use crate::error::{AppError, Result};
use crate::library::{SortMode, format_size};
use crate::opds::{FeedBuilder, OPDS_MIME};
use crate::server::AppState;
use axum::{
    body::Body,
    extract::{Form, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

/// Build a response, returning 500 on error (which shouldn't happen).
fn build_response(status: StatusCode, content_type: &str, body: impl Into<Body>) -> Response<Body> {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap_or_else(|_| {
            Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .body(Body::from("Internal error"))
                .unwrap_or_default()
        })
}

/// Minimal HTML escaping for values interpolated into inline templates.
fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Listing order.
    sort: Option<SortMode>,
}

// ============================================================================
// CATALOG
// ============================================================================

/// OPDS acquisition feed of the whole library.
pub async fn opds_index(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Response<Body>> {
    let books = state.list_books(params.sort)?;
    let base_url = state.base_url();

    let mut feed = FeedBuilder::new(
        format!("urn:bookshelf:{}", state.config.server.title),
        &state.config.server.title,
    )
    .author("bookshelf-rs")
    .self_link(format!("{}/", base_url))
    .start_link(format!("{}/", base_url));

    for book in &books {
        feed = feed.book_entry(book, &base_url);
    }

    Ok(build_response(StatusCode::OK, OPDS_MIME, feed.build()))
}

/// Minimal HTML book list.
pub async fn simple_page(State(state): State<AppState>) -> Result<Html<String>> {
    let books = state.list_books(None)?;

    let mut html = String::from(
        "<html><head><title>Simple Book List</title></head><body>\n<h1>Book List</h1>\n",
    );

    if books.is_empty() {
        html.push_str("<p>No books available.</p>\n");
    } else {
        html.push_str("<ul>\n");
        for book in &books {
            html.push_str(&format!(
                "<li><b>{}</b> ({}, {}) - <a href='/books/{}'>Download</a></li>\n",
                escape_html(&book.title),
                book.format_label(),
                format_size(book.size),
                urlencoding::encode(&book.filename),
            ));
        }
        html.push_str("</ul>\n");
    }
    html.push_str("</body></html>\n");

    Ok(Html(html))
}

/// Admin page: book table with upload, rename and delete.
pub async fn admin_page(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Html<String>> {
    let books = state.list_books(params.sort)?;
    let title = escape_html(&state.config.server.title);

    let mut rows = String::new();
    for book in &books {
        let encoded = urlencoding::encode(&book.filename).into_owned();
        rows.push_str(&format!(
            r#"<tr>
  <td><img src="/cover/{encoded}" alt="" loading="lazy"></td>
  <td><a href="/books/{encoded}">{title}</a></td>
  <td>{label}</td>
  <td>{size}</td>
  <td>{date}</td>
  <td>
    <form method="post" action="/rename" class="inline">
      <input type="hidden" name="old_filename" value="{filename}">
      <input type="text" name="new_filename" placeholder="new name" required>
      <button type="submit">Rename</button>
    </form>
    <form method="post" action="/delete/{encoded}" class="inline"
          onsubmit="return confirm('Delete {filename}?')">
      <button type="submit">Delete</button>
    </form>
  </td>
</tr>
"#,
            title = escape_html(&book.title),
            label = book.format_label(),
            size = format_size(book.size),
            date = book.modified.format("%b %d, %Y %H:%M"),
            filename = escape_html(&book.filename),
        ));
    }

    let sort_links = [
        SortMode::NameAsc,
        SortMode::NameDesc,
        SortMode::DateAsc,
        SortMode::DateDesc,
    ]
    .iter()
    .map(|m| format!(r#"<a href="/admin?sort={m}">{m}</a>"#, m = m.as_str()))
    .collect::<Vec<_>>()
    .join(" | ");

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - Admin</title>
    <style>
        body {{ font-family: system-ui, sans-serif; max-width: 900px; margin: 2rem auto; padding: 0 1rem; }}
        h1 {{ color: #333; }}
        table {{ border-collapse: collapse; width: 100%; }}
        th, td {{ text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #ddd; }}
        img {{ max-height: 60px; }}
        .inline {{ display: inline; }}
        .upload {{ background: #f5f5f5; padding: 1rem; border-radius: 8px; margin: 1rem 0; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div class="upload">
        <form method="post" action="/upload" enctype="multipart/form-data">
            <input type="file" name="book" required>
            <button type="submit">Upload</button>
        </form>
    </div>
    <p>{count} books | Sort: {sort_links} | <a href="/">OPDS feed</a></p>
    <table>
        <tr><th></th><th>Title</th><th>Type</th><th>Size</th><th>Modified</th><th></th></tr>
        {rows}
    </table>
</body>
</html>"#,
        count = books.len(),
    );

    Ok(Html(html))
}

// ============================================================================
// COVERS AND DOWNLOADS
// ============================================================================

/// Serve the cover image extracted from a book file.
///
/// Every extraction failure collapses to 404 for the client; the specific
/// kind is logged for diagnostics.
pub async fn cover(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response<Body>> {
    let path = state.resolve_book_path(&filename)?;

    if !path.is_file() {
        return Err(AppError::NotFound(filename));
    }

    let cover = extract_cover(&path, &state.mime).map_err(|e| {
        tracing::debug!(file = %filename, error = %e, "Cover extraction failed");
        AppError::Cover(e)
    })?;

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, cover.mime_type)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .body(Body::from(cover.data))
        .map_err(|e| AppError::Internal(e.to_string()))?)
}

/// Stream a book file to the client.
pub async fn download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response<Body>> {
    let path = state.resolve_book_path(&filename)?;

    if !path.is_file() {
        return Err(AppError::NotFound(filename));
    }

    let file = tokio::fs::File::open(&path).await?;
    let stream = ReaderStream::new(file);

    let basename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("book")
        .to_string();

    Ok(Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, state.mime.for_name(&filename))
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{basename}\""),
        )
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))?)
}

// ============================================================================
// MANAGEMENT
// ============================================================================

/// Handle a book upload (multipart field `book`).
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("book") {
            continue;
        }

        let filename = field
            .file_name()
            .map(ToString::to_string)
            .ok_or_else(|| AppError::BadRequest("upload without a filename".into()))?;

        let path = state.resolve_book_path(&filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;

        tokio::fs::write(&path, &data).await?;
        tracing::info!(file = %filename, bytes = data.len(), "Uploaded book");

        return Ok(Redirect::to("/admin"));
    }

    Err(AppError::BadRequest("missing 'book' form field".into()))
}

/// Delete a book file.
pub async fn delete(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse> {
    let path = state.resolve_book_path(&filename)?;

    if !path.is_file() {
        return Err(AppError::NotFound(filename));
    }

    tokio::fs::remove_file(&path).await?;
    tracing::info!(file = %filename, "Deleted book");

    Ok(Redirect::to("/admin"))
}

/// Rename form fields.
#[derive(Debug, Deserialize)]
pub struct RenameForm {
    /// Current relative filename.
    old_filename: String,
    /// New filename; inherits the old extension when it has none.
    new_filename: String,
}

/// Rename a book file, keeping it in the same directory.
pub async fn rename(
    State(state): State<AppState>,
    Form(form): Form<RenameForm>,
) -> Result<impl IntoResponse> {
    if form.old_filename.is_empty() || form.new_filename.is_empty() {
        return Err(AppError::BadRequest("missing filenames".into()));
    }

    let old_path = state.resolve_book_path(&form.old_filename)?;
    state.resolve_book_path(&form.new_filename)?;

    let new_name = rename_target(&old_path, &form.new_filename);

    if !old_path.is_file() {
        return Err(AppError::NotFound(form.old_filename));
    }

    // Stay in the old file's directory.
    let new_path = old_path
        .parent()
        .unwrap_or_else(|| state.books_dir())
        .join(&new_name);

    if new_path.exists() {
        return Err(AppError::Conflict(format!(
            "destination already exists: {new_name}"
        )));
    }

    tokio::fs::rename(&old_path, &new_path).await?;
    tracing::info!(from = %form.old_filename, to = %new_name, "Renamed book");

    Ok(Redirect::to("/admin"))
}

/// New file name for a rename, inheriting the old extension when the
/// requested name has none.
fn rename_target(old_path: &std::path::Path, new_filename: &str) -> String {
    if !new_filename.contains('.')
        && let Some(ext) = old_path.extension().and_then(|e| e.to_str())
    {
        return format!("{new_filename}.{ext}");
    }

    new_filename.to_string()
}
