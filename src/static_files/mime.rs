//! Content types by file extension.

use std::path::Path;

/// Type sent for anything not in the table.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Lowercased extension of `path`, if it has one.
fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// Content type for `path`, falling back to [`DEFAULT_CONTENT_TYPE`].
pub fn content_type(path: &Path) -> &'static str {
    let Some(ext) = extension(path) else {
        return DEFAULT_CONTENT_TYPE;
    };
    match ext.as_str() {
        "html" | "htm" => "text/html; charset=utf-8",
        "css" => "text/css; charset=utf-8",
        "js" | "mjs" => "application/javascript; charset=utf-8",
        "json" => "application/json",
        "svg" => "image/svg+xml",
        "xml" => "application/xml",
        "txt" => "text/plain; charset=utf-8",
        "csv" => "text/csv; charset=utf-8",
        "md" => "text/markdown; charset=utf-8",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

/// Text-like formats worth compressing on the fly.
pub fn is_compressible(path: &Path) -> bool {
    matches!(
        extension(path).as_deref(),
        Some("html" | "htm" | "css" | "js" | "mjs" | "json" | "svg" | "xml" | "txt" | "csv" | "md")
    )
}
