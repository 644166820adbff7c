/// Error types for token and playback calls.
pub mod error;
/// Spotify Web API implementation of the provider traits.
pub mod spotify;

use std::{fmt, time::Duration};

use futures::future::BoxFuture;
use serde_json::Value;

pub use self::error::{AuthError, AuthResult, UpstreamError, UpstreamResult};

/// Grant presented to the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// One-shot code returned by the OAuth consent redirect.
    AuthorizationCode(String),
    /// Long-lived token used to mint new access tokens.
    RefreshToken(String),
}

/// Credentials returned by a successful grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Bearer token for playback calls.
    pub access_token: String,
    /// Present when the provider rotates the refresh token.
    pub refresh_token: Option<String>,
    /// Lifetime of the access token, when the provider reports one.
    pub expires_in: Option<Duration>,
}

/// Opaque identifier of a track as reported by the playback provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackId(String);

impl TrackId {
    /// Wrap a provider track identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Playback state as fetched from the provider, before it is stamped and cached.
#[derive(Debug, Clone)]
pub struct PlaybackState {
    /// Track currently loaded on the active device; `None` when nothing is playing.
    pub track_id: Option<TrackId>,
    /// Provider payload, forwarded untouched to clients.
    pub raw: Value,
}

impl PlaybackState {
    /// State reported when the account has no active playback.
    pub fn idle() -> Self {
        Self {
            track_id: None,
            raw: Value::Null,
        }
    }
}

/// OAuth token endpoint used to exchange codes and refresh access tokens.
pub trait TokenProvider: Send + Sync {
    /// Present `grant` and return the issued credentials.
    fn exchange(&self, grant: TokenGrant) -> BoxFuture<'static, AuthResult<IssuedToken>>;
}

/// Remote player that reports the current track and advances to the next one.
pub trait PlaybackProvider: Send + Sync {
    /// Fetch what the account is playing right now.
    fn currently_playing(&self, access_token: String)
    -> BoxFuture<'static, UpstreamResult<PlaybackState>>;
    /// Advance the active device to the next track.
    fn skip_to_next(&self, access_token: String) -> BoxFuture<'static, UpstreamResult<()>>;
}
