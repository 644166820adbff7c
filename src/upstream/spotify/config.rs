use thiserror::Error;

const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const CALLBACK_PATH: &str = "/client-callback";

/// Required environment variable is missing.
#[derive(Debug, Error)]
#[error("missing Spotify environment variable `{var}`")]
pub struct MissingEnvVar {
    /// Name of the missing variable.
    pub var: &'static str,
}

/// Runtime configuration describing how to reach the Spotify accounts and Web APIs.
#[derive(Debug, Clone)]
pub struct SpotifyConfig {
    /// OAuth client identifier of the registered application.
    pub client_id: String,
    /// OAuth client secret of the registered application.
    pub client_secret: String,
    /// Redirect URI registered for the authorization-code flow.
    pub redirect_uri: String,
    /// Base URL of the accounts service hosting `/api/token`.
    pub accounts_url: String,
    /// Base URL of the Web API.
    pub api_url: String,
}

impl SpotifyConfig {
    /// Construct a configuration against the public Spotify endpoints.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        client_url: &str,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: format!("{}{CALLBACK_PATH}", client_url.trim_end_matches('/')),
            accounts_url: DEFAULT_ACCOUNTS_URL.into(),
            api_url: DEFAULT_API_URL.into(),
        }
    }

    /// Point the client at alternative accounts and API hosts (mock servers, proxies).
    pub fn with_endpoints(
        mut self,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Self {
        self.accounts_url = accounts_url.into();
        self.api_url = api_url.into();
        self
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> Result<Self, MissingEnvVar> {
        let client_id = required("SPOTIFY_CLIENT_ID")?;
        let client_secret = required("SPOTIFY_CLIENT_SECRET")?;
        let client_url = required("CLIENT_URL")?;

        let accounts_url =
            optional("SPOTIFY_ACCOUNTS_URL").unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.into());
        let api_url = optional("SPOTIFY_API_URL").unwrap_or_else(|| DEFAULT_API_URL.into());

        Ok(Self::new(client_id, client_secret, &client_url).with_endpoints(accounts_url, api_url))
    }
}

fn required(var: &'static str) -> Result<String, MissingEnvVar> {
    optional(var).ok_or(MissingEnvVar { var })
}

fn optional(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
