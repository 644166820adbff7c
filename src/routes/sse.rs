use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    services::{session_service, sse_events, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/session",
    tag = "sse",
    responses((status = 200, description = "Session SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream `session_updated` events, starting with the current view.
///
/// The subscription is taken before the initial read so no update is lost in between.
pub async fn session_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_session(&state);
    info!("New session SSE connection");
    let initial = session_service::initial_stream_view(&state)
        .await
        .and_then(|view| sse_events::session_updated_event(&view));
    sse_service::to_sse_stream(receiver, initial)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/session", get(session_stream))
}
