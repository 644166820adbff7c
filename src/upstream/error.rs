//! Error types shared by the token and playback providers.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`AuthError`] failures.
pub type AuthResult<T> = Result<T, AuthError>;
/// Convenient result alias returning [`UpstreamError`] failures.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Failures raised while obtaining or refreshing client credentials.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials were ever issued, or they were revoked.
    #[error("playback account is signed out")]
    SignedOut,
    /// The token endpoint refused the grant (expired code, revoked refresh token).
    #[error("token endpoint rejected the grant with status {status}")]
    Rejected {
        /// Status returned by the token endpoint.
        status: StatusCode,
    },
    /// The token request could not be sent.
    #[error("failed to reach the token endpoint")]
    Transport {
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The token endpoint answered with a body we could not decode.
    #[error("failed to decode the token response")]
    Decode {
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
}

/// Failures raised by the playback provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No usable access token.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The provider refused the access token.
    #[error("playback provider refused the access token")]
    Unauthorized,
    /// No active playback device for the account.
    #[error("no active playback device")]
    NotFound,
    /// The provider answered with a status we do not handle.
    #[error("unexpected playback provider status {status} for `{path}`")]
    Status {
        /// API path that was called.
        path: String,
        /// Status returned by the provider.
        status: StatusCode,
    },
    /// The request could not be sent.
    #[error("failed to send playback request to `{path}`")]
    Transport {
        /// API path that was called.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The response body could not be decoded.
    #[error("failed to decode playback response for `{path}`")]
    Decode {
        /// API path that was called.
        path: String,
        /// Underlying HTTP client error.
        #[source]
        source: reqwest::Error,
    },
    /// The provider did not answer in time.
    #[error("playback provider did not answer within {0:?}")]
    Timeout(Duration),
}
