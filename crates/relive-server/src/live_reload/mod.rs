//! Live reload over server-sent events.
//!
//! Change notifications flow through the [`Broadcaster`] into the
//! [`ReloadRegistry`], which pushes a `reload` frame to every browser tab
//! connected to [`LIVERELOAD_PATH`].

mod broadcaster;
mod registry;
mod sse;

pub use broadcaster::DEFAULT_DEBOUNCE;
pub(crate) use broadcaster::Broadcaster;
pub(crate) use registry::ReloadRegistry;
pub(crate) use sse::sse_handler;

/// Route of the reload event stream.
pub const LIVERELOAD_PATH: &str = "/livereload";
