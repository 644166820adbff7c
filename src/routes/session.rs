use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::{participant::ParticipantPayload, session::SessionViewResponse},
    error::AppError,
    services::session_service,
    state::SharedState,
};

/// Routes of the shared playback session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/veto", post(register_veto))
        .route("/participants", post(register_participant))
}

/// Current playback, vetoes and roster.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses(
        (status = 200, description = "Current session view", body = SessionViewResponse)
    )
)]
pub async fn get_session(State(state): State<SharedState>) -> Json<SessionViewResponse> {
    Json(session_service::get_session(&state).await)
}

/// Veto the current track. The track is skipped once a strict majority of the roster vetoed it.
#[utoipa::path(
    post,
    path = "/session/veto",
    tag = "session",
    request_body = ParticipantPayload,
    responses(
        (status = 200, description = "Veto recorded", body = SessionViewResponse),
        (status = 400, description = "Malformed participant profile")
    )
)]
pub async fn register_veto(
    State(state): State<SharedState>,
    Json(payload): Json<ParticipantPayload>,
) -> Result<Json<SessionViewResponse>, AppError> {
    let view = session_service::register_veto(&state, payload).await?;
    Ok(Json(view))
}

/// Join the session roster.
#[utoipa::path(
    post,
    path = "/participants",
    tag = "session",
    request_body = ParticipantPayload,
    responses(
        (status = 204, description = "Participant registered"),
        (status = 400, description = "Malformed participant profile")
    )
)]
pub async fn register_participant(
    State(state): State<SharedState>,
    Json(payload): Json<ParticipantPayload>,
) -> Result<StatusCode, AppError> {
    session_service::register_participant(&state, payload).await?;
    Ok(StatusCode::NO_CONTENT)
}
