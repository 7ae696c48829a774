//! Reload script injection into served HTML.
//!
//! This is a literal substring search, not an HTML parse. The script goes
//! right before the first of `</body>`, `</head>` or `<script>` found in the
//! document. Matching is case-sensitive, so `</BODY>` or an attribute-bearing
//! `<script type="module">` is not a marker. A document with no marker is
//! served unchanged and will not reload.

use std::borrow::Cow;

/// Client script: reloads the page on any message from the reload endpoint.
pub const RELOAD_SCRIPT: &str = r#"<script defer>new EventSource("/livereload").onmessage = () => location.reload();</script>"#;

/// Tags the script may be inserted before.
const MARKERS: [&[u8]; 3] = [b"</body>", b"</head>", b"<script>"];

/// Insert [`RELOAD_SCRIPT`] before the first marker in `html`.
///
/// Returns the input untouched (borrowed) when no marker is present.
pub fn inject_reload_script(html: &[u8]) -> Cow<'_, [u8]> {
    let Some(pos) = find_first_marker(html) else {
        return Cow::Borrowed(html);
    };

    let mut out = Vec::with_capacity(html.len() + RELOAD_SCRIPT.len());
    out.extend_from_slice(&html[..pos]);
    out.extend_from_slice(RELOAD_SCRIPT.as_bytes());
    out.extend_from_slice(&html[pos..]);
    Cow::Owned(out)
}

/// Byte offset of the earliest marker occurrence.
fn find_first_marker(html: &[u8]) -> Option<usize> {
    html.iter()
        .enumerate()
        .filter(|&(_, &byte)| byte == b'<')
        .map(|(pos, _)| pos)
        .find(|&pos| MARKERS.iter().any(|marker| html[pos..].starts_with(marker)))
}
