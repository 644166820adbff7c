use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::upstream::{IssuedToken, PlaybackState, TrackId};

/// Body returned by `POST /api/token`.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    /// Bearer token for Web API calls.
    pub access_token: String,
    /// Rotated refresh token, absent when the previous one stays valid.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Token lifetime in seconds.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

impl From<TokenResponse> for IssuedToken {
    fn from(value: TokenResponse) -> Self {
        Self {
            access_token: value.access_token,
            refresh_token: value.refresh_token,
            expires_in: value.expires_in.map(Duration::from_secs),
        }
    }
}

/// The few fields of `GET /me/player` the session logic reads.
#[derive(Debug, Default, Deserialize)]
struct PlayerIds {
    #[serde(default)]
    item: Option<ItemIds>,
}

#[derive(Debug, Deserialize)]
struct ItemIds {
    #[serde(default)]
    id: Option<String>,
}

/// Extract the track identifier from a raw player payload, keeping the payload intact.
pub fn playback_from_player(raw: Value) -> PlaybackState {
    let ids = PlayerIds::deserialize(&raw).unwrap_or_default();
    let track_id = ids.item.and_then(|item| item.id).map(TrackId::new);
    PlaybackState { track_id, raw }
}
