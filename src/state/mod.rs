/// Injectable time source.
pub mod clock;
/// Owner of the shared session.
pub mod coordinator;
/// Playback account credentials.
pub mod credentials;
/// Known participants.
pub mod roster;
mod sse;
/// TTL-gated playback snapshot.
pub mod snapshot_cache;
/// Veto majority gate.
pub mod vote_gate;

use std::sync::Arc;

pub use self::coordinator::{SessionCoordinator, SessionView};
pub use self::sse::SseHub;

/// Application state shared by every handler.
pub type SharedState = Arc<AppState>;

/// Capacity of the session SSE broadcast channel.
const SESSION_SSE_CAPACITY: usize = 16;

/// Central application state: the playback session and its live update hub.
pub struct AppState {
    session: SessionCoordinator,
    session_sse: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(session: SessionCoordinator) -> SharedState {
        Arc::new(Self {
            session,
            session_sse: SseHub::new(SESSION_SSE_CAPACITY),
        })
    }

    /// The single shared playback session.
    pub fn session(&self) -> &SessionCoordinator {
        &self.session
    }

    /// Broadcast hub used for the session SSE stream.
    pub fn session_sse(&self) -> &SseHub {
        &self.session_sse
    }
}
