use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the veto session backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::session::get_session,
        crate::routes::session::register_veto,
        crate::routes::session::register_participant,
        crate::routes::auth::authorize_client,
        crate::routes::sse::session_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::session::SessionViewResponse,
            crate::dto::session::ParticipantSummary,
            crate::dto::session::PlaybackSnapshotDto,
            crate::dto::participant::ParticipantPayload,
            crate::dto::auth::AuthorizeRequest,
            crate::dto::auth::AuthStatusResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "session", description = "Shared playback session and vetoes"),
        (name = "auth", description = "Playback account sign-in"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
