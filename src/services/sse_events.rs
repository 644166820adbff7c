use serde::Serialize;
use tracing::warn;

use crate::{dto::sse::ServerEvent, state::SharedState};

const EVENT_SESSION_UPDATED: &str = "session_updated";

/// Broadcast the latest session view to every session stream subscriber.
pub fn broadcast_session_updated(state: &SharedState, view: &impl Serialize) {
    if let Some(event) = session_updated_event(view) {
        state.session_sse().broadcast(event);
    }
}

/// Encode a `session_updated` event, logging payloads that fail to serialize.
pub fn session_updated_event(view: &impl Serialize) -> Option<ServerEvent> {
    match ServerEvent::json(Some(EVENT_SESSION_UPDATED.to_string()), view) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(event = EVENT_SESSION_UPDATED, error = %err, "failed to serialize session SSE payload");
            None
        }
    }
}
