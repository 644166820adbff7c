use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authorization code returned to the client callback by the accounts service.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthorizeRequest {
    /// One-time authorization code.
    pub code: String,
}

/// Sign-in state of the playback account.
#[derive(Debug, Serialize, ToSchema)]
pub struct AuthStatusResponse {
    /// Whether client credentials are held.
    pub signed_in: bool,
}
