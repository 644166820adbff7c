use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::auth::{AuthStatusResponse, AuthorizeRequest},
    error::AppError,
    services::auth_service,
    state::SharedState,
};

/// Playback account sign-in routes.
pub fn router() -> Router<SharedState> {
    Router::new().route("/auth/client", post(authorize_client))
}

/// Sign the playback account in with the code received by the client callback.
#[utoipa::path(
    post,
    path = "/auth/client",
    tag = "auth",
    request_body = AuthorizeRequest,
    responses(
        (status = 200, description = "Playback account signed in", body = AuthStatusResponse),
        (status = 400, description = "Missing authorization code"),
        (status = 401, description = "Authorization code rejected"),
        (status = 503, description = "Accounts service unreachable")
    )
)]
pub async fn authorize_client(
    State(state): State<SharedState>,
    Json(payload): Json<AuthorizeRequest>,
) -> Result<Json<AuthStatusResponse>, AppError> {
    let status = auth_service::authorize_client(&state, payload.code).await?;
    Ok(Json(status))
}
