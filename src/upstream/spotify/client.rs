use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::upstream::{
    AuthError, AuthResult, IssuedToken, PlaybackProvider, PlaybackState, TokenGrant,
    TokenProvider, UpstreamError, UpstreamResult,
};

use super::{
    config::SpotifyConfig,
    models::{TokenResponse, playback_from_player},
};

const PLAYER_PATH: &str = "me/player";
const NEXT_PATH: &str = "me/player/next";

/// Spotify accounts and Web API client implementing both provider traits.
#[derive(Clone)]
pub struct SpotifyClient {
    client: Client,
    config: Arc<SpotifyConfig>,
}

impl SpotifyClient {
    /// Build the HTTP client; every request is bounded by `timeout`.
    pub fn new(config: SpotifyConfig, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    async fn request_token(&self, grant: TokenGrant) -> AuthResult<IssuedToken> {
        let url = format!(
            "{}/api/token",
            self.config.accounts_url.trim_end_matches('/')
        );
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        match &grant {
            TokenGrant::AuthorizationCode(code) => {
                form.push(("grant_type", "authorization_code"));
                form.push(("code", code.as_str()));
                form.push(("redirect_uri", self.config.redirect_uri.as_str()));
            }
            TokenGrant::RefreshToken(token) => {
                form.push(("grant_type", "refresh_token"));
                form.push(("refresh_token", token.as_str()));
            }
        }

        let response = self
            .client
            .post(url)
            .form(&form)
            .send()
            .await
            .map_err(|source| AuthError::Transport { source })?;

        token_status(response.status())?;

        let body = response
            .json::<TokenResponse>()
            .await
            .map_err(|source| AuthError::Decode { source })?;
        Ok(body.into())
    }

    fn api_request(
        &self,
        method: Method,
        path: &str,
        access_token: &str,
    ) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.config.api_url.trim_end_matches('/'), path);
        self.client.request(method, url).bearer_auth(access_token)
    }

    async fn fetch_player(&self, access_token: &str) -> UpstreamResult<PlaybackState> {
        let response = self
            .api_request(Method::GET, PLAYER_PATH, access_token)
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                path: PLAYER_PATH.to_string(),
                source,
            })?;

        match player_status(response.status())? {
            PlayerReply::Idle => {
                debug!("no active playback reported");
                Ok(PlaybackState::idle())
            }
            PlayerReply::Body => {
                let raw = response
                    .json::<Value>()
                    .await
                    .map_err(|source| UpstreamError::Decode {
                        path: PLAYER_PATH.to_string(),
                        source,
                    })?;
                Ok(playback_from_player(raw))
            }
        }
    }

    async fn next_track(&self, access_token: &str) -> UpstreamResult<()> {
        let response = self
            .api_request(Method::POST, NEXT_PATH, access_token)
            .header(reqwest::header::CONTENT_LENGTH, "0")
            .send()
            .await
            .map_err(|source| UpstreamError::Transport {
                path: NEXT_PATH.to_string(),
                source,
            })?;

        command_status(NEXT_PATH, response.status())
    }
}

/// What a player read returned, decided from the status line alone.
#[derive(Debug, PartialEq, Eq)]
enum PlayerReply {
    /// 204: the account has no active device.
    Idle,
    /// A body describing the playback follows.
    Body,
}

fn player_status(status: StatusCode) -> UpstreamResult<PlayerReply> {
    match status {
        StatusCode::NO_CONTENT => Ok(PlayerReply::Idle),
        status if status.is_success() => Ok(PlayerReply::Body),
        other => command_status(PLAYER_PATH, other).map(|()| PlayerReply::Body),
    }
}

fn command_status(path: &str, status: StatusCode) -> UpstreamResult<()> {
    match status {
        status if status.is_success() => Ok(()),
        StatusCode::UNAUTHORIZED => Err(UpstreamError::Unauthorized),
        StatusCode::NOT_FOUND => Err(UpstreamError::NotFound),
        other => Err(UpstreamError::Status {
            path: path.to_string(),
            status: other,
        }),
    }
}

fn token_status(status: StatusCode) -> AuthResult<()> {
    if status.is_success() {
        Ok(())
    } else {
        Err(AuthError::Rejected { status })
    }
}

impl TokenProvider for SpotifyClient {
    fn exchange(&self, grant: TokenGrant) -> BoxFuture<'static, AuthResult<IssuedToken>> {
        let client = self.clone();
        Box::pin(async move { client.request_token(grant).await })
    }
}

impl PlaybackProvider for SpotifyClient {
    fn currently_playing(
        &self,
        access_token: String,
    ) -> BoxFuture<'static, UpstreamResult<PlaybackState>> {
        let client = self.clone();
        Box::pin(async move { client.fetch_player(&access_token).await })
    }

    fn skip_to_next(&self, access_token: String) -> BoxFuture<'static, UpstreamResult<()>> {
        let client = self.clone();
        Box::pin(async move { client.next_track(&access_token).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_status_maps_reply_kinds() {
        assert_eq!(player_status(StatusCode::NO_CONTENT).unwrap(), PlayerReply::Idle);
        assert_eq!(player_status(StatusCode::OK).unwrap(), PlayerReply::Body);
        assert!(matches!(
            player_status(StatusCode::UNAUTHORIZED),
            Err(UpstreamError::Unauthorized)
        ));
        assert!(matches!(
            player_status(StatusCode::NOT_FOUND),
            Err(UpstreamError::NotFound)
        ));
        match player_status(StatusCode::TOO_MANY_REQUESTS) {
            Err(UpstreamError::Status { path, status }) => {
                assert_eq!(path, PLAYER_PATH);
                assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn skip_command_accepts_any_success() {
        assert!(command_status(NEXT_PATH, StatusCode::NO_CONTENT).is_ok());
        assert!(command_status(NEXT_PATH, StatusCode::OK).is_ok());
        assert!(matches!(
            command_status(NEXT_PATH, StatusCode::UNAUTHORIZED),
            Err(UpstreamError::Unauthorized)
        ));
        assert!(matches!(
            command_status(NEXT_PATH, StatusCode::NOT_FOUND),
            Err(UpstreamError::NotFound)
        ));
        assert!(matches!(
            command_status(NEXT_PATH, StatusCode::BAD_GATEWAY),
            Err(UpstreamError::Status { .. })
        ));
    }

    #[test]
    fn token_endpoint_rejections_keep_status() {
        assert!(token_status(StatusCode::OK).is_ok());
        assert!(matches!(
            token_status(StatusCode::BAD_REQUEST),
            Err(AuthError::Rejected { status }) if status == StatusCode::BAD_REQUEST
        ));
        assert!(matches!(
            token_status(StatusCode::INTERNAL_SERVER_ERROR),
            Err(AuthError::Rejected { .. })
        ));
    }
}
