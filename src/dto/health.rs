use serde::Serialize;
use utoipa::ToSchema;

/// Health payload returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether the playback account is signed in.
    pub signed_in: bool,
    /// Whether the last playback fetch failed.
    pub playback_failing: bool,
}

impl HealthResponse {
    /// Derive the status from the signed-in flag and the playback fetch health.
    pub fn from_flags(signed_in: bool, playback_failing: bool) -> Self {
        let status = if signed_in && !playback_failing {
            "ok"
        } else {
            "degraded"
        };
        Self {
            status: status.to_string(),
            signed_in,
            playback_failing,
        }
    }
}
