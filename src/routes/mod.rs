use axum::Router;

use crate::state::SharedState;

/// Playback account sign-in.
pub mod auth;
/// Swagger UI and OpenAPI document.
pub mod docs;
/// Health check.
pub mod health;
/// Session reads, vetoes and participants.
pub mod session;
/// Server-sent events.
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(session::router())
        .merge(auth::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
