//! Content type lookup by file extension.

use std::path::Path;

/// Content type for extensions missing from [`MIME_TYPES`].
pub const DEFAULT_MIME: &str = "text/plain";

/// Content type of HTML documents (the only ones that get the reload script).
pub const HTML_MIME: &str = "text/html";

/// Lowercase extension (with leading dot) to content type.
pub const MIME_TYPES: &[(&str, &str)] = &[
    (".aac", "audio/aac"),
    (".avif", "image/avif"),
    (".avi", "video/x-msvideo"),
    (".bin", "application/octet-stream"),
    (".bmp", "image/bmp"),
    (".css", "text/css"),
    (".csv", "text/csv"),
    (".gz", "application/gzip"),
    (".gif", "image/gif"),
    (".html", HTML_MIME),
    (".ico", "image/vnd.microsoft.icon"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
    (".js", "text/javascript"),
    (".json", "application/json"),
    (".mjs", "text/javascript"),
    (".mp3", "audio/mpeg"),
    (".mp4", "video/mp4"),
    (".mpeg", "video/mpeg"),
    (".oga", "audio/ogg"),
    (".ogv", "video/ogg"),
    (".ogx", "application/ogg"),
    (".opus", "audio/opus"),
    (".otf", "font/otf"),
    (".png", "image/png"),
    (".pdf", "application/pdf"),
    (".rtf", "application/rtf"),
    (".sh", "application/x-sh"),
    (".svg", "image/svg+xml"),
    (".tar", "application/x-tar"),
    (".tiff", "image/tiff"),
    (".ttf", "font/ttf"),
    (".txt", "text/plain"),
    (".wasm", "application/wasm"),
    (".wav", "audio/wav"),
    (".weba", "audio/webm"),
    (".webm", "video/webm"),
    (".webp", "image/webp"),
    (".woff", "font/woff"),
    (".woff2", "font/woff2"),
    (".xml", "application/xml"),
    (".zip", "application/zip"),
    (".7z", "application/x-7z-compressed"),
];

/// Look up the content type for an extension such as `".css"`.
///
/// Matching ignores ASCII case. Returns `None` for unknown extensions.
pub fn lookup(extension: &str) -> Option<&'static str> {
    MIME_TYPES
        .iter()
        .find(|(ext, _)| ext.eq_ignore_ascii_case(extension))
        .map(|(_, mime)| *mime)
}

/// Content type for a file path, [`DEFAULT_MIME`] when unknown.
pub fn mime_for(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| lookup(&format!(".{ext}")))
        .unwrap_or(DEFAULT_MIME)
}

/// Whether a file is served through the HTML injector.
pub fn is_html(path: &Path) -> bool {
    mime_for(path) == HTML_MIME
}
