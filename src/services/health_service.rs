use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the session can currently reach the playback account.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let session = state.session();
    let signed_in = session.is_signed_in().await;
    let playback_failing = session.is_playback_failing().await;

    if !signed_in {
        warn!("playback account signed out (degraded mode)");
    } else if playback_failing {
        warn!("last playback refresh failed (degraded mode)");
    }

    HealthResponse::from_flags(signed_in, playback_failing)
}
