use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    state::clock::Clock,
    upstream::{AuthError, AuthResult, IssuedToken, TokenGrant, TokenProvider},
};

/// Access tokens are refreshed this long before they expire.
const EXPIRY_MARGIN: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
struct ClientCredentials {
    access_token: String,
    refresh_token: Option<String>,
    expires_at: Option<Instant>,
}

impl ClientCredentials {
    fn from_issued(issued: IssuedToken, previous_refresh: Option<String>, now: Instant) -> Self {
        Self {
            access_token: issued.access_token,
            refresh_token: issued.refresh_token.or(previous_refresh),
            expires_at: issued.expires_in.map(|ttl| now + ttl),
        }
    }

    fn needs_refresh(&self, now: Instant) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + EXPIRY_MARGIN >= expires_at)
    }
}

/// Client credentials of the account whose playback the session drives.
///
/// The credential lock is held across refresh calls so concurrent callers never refresh twice.
pub struct TokenManager {
    provider: Arc<dyn TokenProvider>,
    clock: Arc<dyn Clock>,
    credentials: Mutex<Option<ClientCredentials>>,
}

impl TokenManager {
    /// Create a signed-out manager.
    pub fn new(provider: Arc<dyn TokenProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            provider,
            clock,
            credentials: Mutex::new(None),
        }
    }

    /// Exchange an OAuth authorization code and sign the account in.
    pub async fn authorize(&self, code: String) -> AuthResult<()> {
        let mut credentials = self.credentials.lock().await;
        let issued = self
            .provider
            .exchange(TokenGrant::AuthorizationCode(code))
            .await?;
        let previous_refresh = credentials
            .as_ref()
            .and_then(|current| current.refresh_token.clone());
        *credentials = Some(ClientCredentials::from_issued(
            issued,
            previous_refresh,
            self.clock.now(),
        ));
        info!("playback account signed in");
        Ok(())
    }

    /// Whether client credentials are currently held.
    pub async fn is_signed_in(&self) -> bool {
        self.credentials.lock().await.is_some()
    }

    /// Return a usable access token, refreshing it first when it is about to expire.
    ///
    /// A rejected refresh grant signs the account out; transport failures keep the credentials so
    /// the next call retries.
    pub async fn access_token(&self) -> AuthResult<String> {
        let mut credentials = self.credentials.lock().await;
        let Some(current) = credentials.as_ref() else {
            return Err(AuthError::SignedOut);
        };

        let now = self.clock.now();
        if !current.needs_refresh(now) {
            return Ok(current.access_token.clone());
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            warn!("access token expired without a refresh token; signing out");
            credentials.take();
            return Err(AuthError::SignedOut);
        };

        debug!("refreshing playback access token");
        match self
            .provider
            .exchange(TokenGrant::RefreshToken(refresh_token.clone()))
            .await
        {
            Ok(issued) => {
                let refreshed =
                    ClientCredentials::from_issued(issued, Some(refresh_token), self.clock.now());
                let token = refreshed.access_token.clone();
                *credentials = Some(refreshed);
                Ok(token)
            }
            Err(err @ AuthError::Rejected { .. }) => {
                warn!(error = %err, "refresh token rejected; signing out");
                credentials.take();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex as StdMutex;

    use futures::future::BoxFuture;
    use reqwest::StatusCode;

    use super::*;
    use crate::state::clock::ManualClock;

    /// Token endpoint that replays scripted answers and records the grants it saw.
    #[derive(Default)]
    struct ScriptedTokens {
        answers: StdMutex<Vec<AuthResult<IssuedToken>>>,
        grants: StdMutex<Vec<TokenGrant>>,
    }

    impl ScriptedTokens {
        fn push(&self, answer: AuthResult<IssuedToken>) {
            self.answers.lock().unwrap().push(answer);
        }

        fn grants(&self) -> Vec<TokenGrant> {
            self.grants.lock().unwrap().clone()
        }
    }

    impl TokenProvider for ScriptedTokens {
        fn exchange(&self, grant: TokenGrant) -> BoxFuture<'static, AuthResult<IssuedToken>> {
            self.grants.lock().unwrap().push(grant);
            let mut answers = self.answers.lock().unwrap();
            let answer = if answers.is_empty() {
                Err(AuthError::SignedOut)
            } else {
                answers.remove(0)
            };
            Box::pin(async move { answer })
        }
    }

    fn issued(access: &str, refresh: Option<&str>, expires_in: u64) -> IssuedToken {
        IssuedToken {
            access_token: access.into(),
            refresh_token: refresh.map(Into::into),
            expires_in: Some(Duration::from_secs(expires_in)),
        }
    }

    fn manager() -> (TokenManager, Arc<ScriptedTokens>, Arc<ManualClock>) {
        let tokens = Arc::new(ScriptedTokens::default());
        let clock = Arc::new(ManualClock::new());
        let manager = TokenManager::new(tokens.clone(), clock.clone());
        (manager, tokens, clock)
    }

    #[tokio::test]
    async fn signed_out_until_authorized() {
        let (manager, tokens, _clock) = manager();
        assert!(!manager.is_signed_in().await);
        assert!(matches!(
            manager.access_token().await,
            Err(AuthError::SignedOut)
        ));

        tokens.push(Ok(issued("access-1", Some("refresh-1"), 3600)));
        manager.authorize("code-1".into()).await.unwrap();

        assert!(manager.is_signed_in().await);
        assert_eq!(manager.access_token().await.unwrap(), "access-1");
        assert_eq!(
            tokens.grants(),
            vec![TokenGrant::AuthorizationCode("code-1".into())]
        );
    }

    #[tokio::test]
    async fn refreshes_shortly_before_expiry_and_keeps_refresh_token() {
        let (manager, tokens, clock) = manager();
        tokens.push(Ok(issued("access-1", Some("refresh-1"), 60)));
        manager.authorize("code".into()).await.unwrap();

        clock.advance(Duration::from_secs(50));
        assert_eq!(manager.access_token().await.unwrap(), "access-1");

        tokens.push(Ok(issued("access-2", None, 60)));
        clock.advance(Duration::from_secs(6));
        assert_eq!(manager.access_token().await.unwrap(), "access-2");

        tokens.push(Ok(issued("access-3", None, 60)));
        clock.advance(Duration::from_secs(60));
        assert_eq!(manager.access_token().await.unwrap(), "access-3");

        assert_eq!(
            tokens.grants()[1..],
            [
                TokenGrant::RefreshToken("refresh-1".into()),
                TokenGrant::RefreshToken("refresh-1".into()),
            ]
        );
    }

    #[tokio::test]
    async fn rejected_refresh_signs_out() {
        let (manager, tokens, clock) = manager();
        tokens.push(Ok(issued("access-1", Some("refresh-1"), 10)));
        manager.authorize("code".into()).await.unwrap();

        tokens.push(Err(AuthError::Rejected {
            status: StatusCode::BAD_REQUEST,
        }));
        clock.advance(Duration::from_secs(10));

        assert!(matches!(
            manager.access_token().await,
            Err(AuthError::Rejected { .. })
        ));
        assert!(!manager.is_signed_in().await);
    }

    #[tokio::test]
    async fn failed_authorization_keeps_previous_state() {
        let (manager, tokens, _clock) = manager();
        tokens.push(Err(AuthError::Rejected {
            status: StatusCode::BAD_REQUEST,
        }));
        assert!(manager.authorize("bad-code".into()).await.is_err());
        assert!(!manager.is_signed_in().await);
    }

    #[tokio::test]
    async fn tokens_without_expiry_are_reused() {
        let (manager, tokens, clock) = manager();
        tokens.push(Ok(IssuedToken {
            access_token: "forever".into(),
            refresh_token: None,
            expires_in: None,
        }));
        manager.authorize("code".into()).await.unwrap();
        clock.advance(Duration::from_secs(86_400));
        assert_eq!(manager.access_token().await.unwrap(), "forever");
        assert_eq!(tokens.grants().len(), 1);
    }
}
