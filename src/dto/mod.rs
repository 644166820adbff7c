use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Playback account sign-in payloads.
pub mod auth;
/// Health check payload.
pub mod health;
/// Participant profile payloads.
pub mod participant;
/// Session view payloads.
pub mod session;
/// Server-sent event envelope.
pub mod sse;
/// Validation helpers shared by the payloads.
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
