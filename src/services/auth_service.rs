use tracing::warn;

use crate::{dto::auth::AuthStatusResponse, error::ServiceError, state::SharedState};

/// Exchange the authorization code handed to the client callback for playback credentials.
pub async fn authorize_client(
    state: &SharedState,
    code: String,
) -> Result<AuthStatusResponse, ServiceError> {
    if code.trim().is_empty() {
        return Err(ServiceError::InvalidInput(
            "authorization code must not be empty".into(),
        ));
    }

    match state.session().authorize(code).await {
        Ok(()) => Ok(AuthStatusResponse { signed_in: true }),
        Err(err) => {
            warn!(error = %err, "playback account sign-in failed");
            Err(err.into())
        }
    }
}
