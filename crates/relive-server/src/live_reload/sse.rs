//! Server-sent-event endpoint for live reload.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::IntoResponse;
use futures_util::StreamExt;

use crate::state::AppState;

/// Interval of comment-only frames keeping idle connections open.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Open a reload stream for one browser tab.
///
/// The response never ends on its own. It is closed when the client
/// disconnects or the server shuts down.
pub(crate) async fn sse_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let stream = state
        .registry
        .register()
        .map(|message| Ok::<_, Infallible>(Event::default().data(message)));

    (
        [
            (header::CONNECTION, "keep-alive"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Sse::new(stream).keep_alive(KeepAlive::new().interval(KEEP_ALIVE_INTERVAL)),
    )
}
