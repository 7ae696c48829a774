//! Static file serving.
//!
//! Resolves request paths against the served root. Directories resolve to
//! their `index.html` (one level only). HTML goes through the reload script
//! injector and is sent in one piece; everything else is streamed from disk.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use percent_encoding::percent_decode_str;
use tokio_util::io::ReaderStream;

use crate::inject::inject_reload_script;
use crate::mime;
use crate::state::AppState;

/// File served for directory requests.
const INDEX_FILE: &str = "index.html";

/// Create router serving files from the state's root for every path.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new().fallback(serve_path)
}

/// Serve the file a request path resolves to.
async fn serve_path(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let requested = join_request_path(&state.root, uri.path());

    match resolve(&requested).await {
        Ok(Some(file)) => serve_file(&file).await,
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(err) => internal_error(&requested, &err),
    }
}

/// Join the URL path onto `root`, keeping only normal components.
///
/// The path is percent-decoded first. `..`, `.` and root components are
/// dropped, so the result never leaves `root` lexically.
pub(crate) fn join_request_path(root: &Path, request_path: &str) -> PathBuf {
    let decoded = percent_decode_str(request_path).decode_utf8_lossy();

    let mut path = root.to_path_buf();
    for component in Path::new(decoded.as_ref()).components() {
        if let Component::Normal(part) = component {
            path.push(part);
        }
    }
    path
}

/// Find the file to serve for `path`.
///
/// Returns `Ok(None)` when nothing servable exists, and `Err` when the
/// filesystem probe fails for a reason other than not-found.
async fn resolve(path: &Path) -> io::Result<Option<PathBuf>> {
    let Some(metadata) = probe(path).await? else {
        return Ok(None);
    };

    if !metadata.is_dir() {
        return Ok(Some(path.to_path_buf()));
    }

    let index = path.join(INDEX_FILE);
    match probe(&index).await? {
        // A directory named index.html is not expanded again
        Some(metadata) if !metadata.is_dir() => Ok(Some(index)),
        _ => Ok(None),
    }
}

/// Stat a path, mapping not-found to `None`.
async fn probe(path: &Path) -> io::Result<Option<std::fs::Metadata>> {
    match tokio::fs::metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}

/// Send a resolved file with the content type from the mime table.
async fn serve_file(file: &Path) -> Response {
    let content_type = mime::mime_for(file);

    if mime::is_html(file) {
        return match tokio::fs::read(file).await {
            Ok(html) => {
                let body = inject_reload_script(&html).into_owned();
                ok_response(content_type, Body::from(body))
            }
            Err(err) => read_error(file, &err),
        };
    }

    match tokio::fs::File::open(file).await {
        Ok(handle) => ok_response(content_type, Body::from_stream(ReaderStream::new(handle))),
        Err(err) => read_error(file, &err),
    }
}

fn ok_response(content_type: &'static str, body: Body) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// Map a read failure after a successful probe (file vanished, permissions).
fn read_error(file: &Path, err: &io::Error) -> Response {
    if err.kind() == io::ErrorKind::NotFound {
        StatusCode::NOT_FOUND.into_response()
    } else {
        internal_error(file, err)
    }
}

fn internal_error(path: &Path, err: &io::Error) -> Response {
    tracing::error!(path = %path.display(), error = %err, "Failed to serve file");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::body::to_bytes;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use crate::app::create_router;
    use crate::inject::RELOAD_SCRIPT;
    use crate::live_reload::ReloadRegistry;

    fn router(root: &Path) -> Router {
        create_router(Arc::new(AppState {
            root: root.to_path_buf(),
            registry: Arc::new(ReloadRegistry::new()),
        }))
    }

    async fn get(root: &Path, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
        let response = router(root)
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_owned());
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, content_type, body.to_vec())
    }

    #[test]
    fn test_join_request_path() {
        let root = Path::new("/site");

        assert_eq!(join_request_path(root, "/"), PathBuf::from("/site"));
        assert_eq!(
            join_request_path(root, "/css/app.css"),
            PathBuf::from("/site/css/app.css")
        );
    }

    #[test]
    fn test_join_request_path_decodes_percent_escapes() {
        assert_eq!(
            join_request_path(Path::new("/site"), "/my%20page.html"),
            PathBuf::from("/site/my page.html")
        );
    }

    #[test]
    fn test_join_request_path_stays_under_root() {
        let root = Path::new("/site");

        assert_eq!(
            join_request_path(root, "/../etc/passwd"),
            PathBuf::from("/site/etc/passwd")
        );
        assert_eq!(
            join_request_path(root, "/%2e%2e/%2e%2e/secret"),
            PathBuf::from("/site/secret")
        );
        assert_eq!(
            join_request_path(root, "/./a/./b"),
            PathBuf::from("/site/a/b")
        );
    }

    #[tokio::test]
    async fn test_serves_mime_types() {
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            ("file.css", "text/css"),
            ("file.html", "text/html"),
            ("file.js", "text/javascript"),
            ("file.png", "image/png"),
            ("file.unknownext", "text/plain"),
        ];
        for (name, _) in &cases {
            std::fs::write(dir.path().join(name), "x").unwrap();
        }

        for (name, expected) in cases {
            let (status, content_type, _) = get(dir.path(), &format!("/{name}")).await;
            assert_eq!(status, StatusCode::OK, "{name}");
            assert_eq!(content_type.as_deref(), Some(expected), "{name}");
        }
    }

    #[tokio::test]
    async fn test_streams_non_html_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        // Larger than one read chunk
        let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("blob.bin"), &data).unwrap();

        let (status, content_type, body) = get(dir.path(), "/blob.bin").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("application/octet-stream"));
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn test_non_html_not_injected() {
        let dir = tempfile::tempdir().unwrap();
        let js = "document.write('<script></script></body>');";
        std::fs::write(dir.path().join("app.js"), js).unwrap();

        let (_, _, body) = get(dir.path(), "/app.js").await;

        assert_eq!(body, js.as_bytes());
    }

    #[tokio::test]
    async fn test_injects_reload_script_into_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("page.html"),
            "<html><body><p>hi</p></body></html>",
        )
        .unwrap();

        let (status, content_type, body) = get(dir.path(), "/page.html").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(
            String::from_utf8(body).unwrap(),
            format!("<html><body><p>hi</p>{RELOAD_SCRIPT}</body></html>")
        );
    }

    #[tokio::test]
    async fn test_html_without_markers_served_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let html = b"<p>partial \xe2\x9c\x93</p>\n";
        std::fs::write(dir.path().join("partial.html"), html).unwrap();

        let (status, _, body) = get(dir.path(), "/partial.html").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, html);
    }

    #[tokio::test]
    async fn test_root_serves_index_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "<head></head>").unwrap();

        let (status, content_type, body) = get(dir.path(), "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/html"));
        assert_eq!(
            String::from_utf8(body).unwrap(),
            format!("<head>{RELOAD_SCRIPT}</head>")
        );
    }

    #[tokio::test]
    async fn test_subdirectory_serves_index_html() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/index.html"), "<body></body>").unwrap();

        for uri in ["/docs", "/docs/"] {
            let (status, _, body) = get(dir.path(), uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(String::from_utf8(body).unwrap().contains("new EventSource"));
        }
    }

    #[tokio::test]
    async fn test_directory_without_index_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("empty")).unwrap();

        let (status, _, body) = get(dir.path(), "/empty").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_index_html_directory_is_not_expanded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("odd/index.html")).unwrap();
        std::fs::write(dir.path().join("odd/index.html/index.html"), "<body></body>").unwrap();

        let (status, _, _) = get(dir.path(), "/odd").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found_with_empty_body() {
        let dir = tempfile::tempdir().unwrap();

        let (status, _, body) = get(dir.path(), "/nope.html").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_query_string_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("style.css"), "body {}").unwrap();

        let (status, content_type, body) = get(dir.path(), "/style.css?v=3#top").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/css"));
        assert_eq!(body, b"body {}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_probe_failure_is_internal_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        // Treating a file as a directory fails with ENOTDIR, not ENOENT
        let (status, _, body) = get(dir.path(), "/file.txt/child").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.is_empty());
    }
}
