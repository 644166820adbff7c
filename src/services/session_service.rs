use tracing::debug;

use crate::{
    dto::{participant::ParticipantPayload, session::SessionViewResponse},
    error::ServiceError,
    services::sse_events,
    state::{SharedState, roster::Participant},
};

/// Return the current session view, refreshing the playback snapshot when stale.
pub async fn get_session(state: &SharedState) -> SessionViewResponse {
    read_session(state).await.0
}

/// View to send first to a client that already subscribed to the session hub.
///
/// Returns `None` when the read observed a track change: that view was broadcast and reaches
/// the subscriber through the hub.
pub async fn initial_stream_view(state: &SharedState) -> Option<SessionViewResponse> {
    let (response, broadcast) = read_session(state).await;
    (!broadcast).then_some(response)
}

/// Read the session, broadcasting the view when it observed a track change.
async fn read_session(state: &SharedState) -> (SessionViewResponse, bool) {
    let view = state.session().view().await;
    let track_changed = view.track_changed;
    let response = SessionViewResponse::from(view);
    if track_changed {
        sse_events::broadcast_session_updated(state, &response);
    }
    (response, track_changed)
}

/// Record a veto against the current track on behalf of `payload`.
///
/// Unknown participants are added to the roster first. Invalid payloads are rejected
/// before any session state changes.
pub async fn register_veto(
    state: &SharedState,
    payload: ParticipantPayload,
) -> Result<SessionViewResponse, ServiceError> {
    let participant = Participant::try_from(payload)?;
    debug!(participant = %participant.id, "veto received");
    let view = state.session().register_veto(participant).await;
    let response = SessionViewResponse::from(view);
    sse_events::broadcast_session_updated(state, &response);
    Ok(response)
}

/// Add a participant to the roster. Already known participants are left untouched.
pub async fn register_participant(
    state: &SharedState,
    payload: ParticipantPayload,
) -> Result<(), ServiceError> {
    let participant = Participant::try_from(payload)?;
    if state.session().register_participant(participant).await {
        let response = SessionViewResponse::from(state.session().view().await);
        sse_events::broadcast_session_updated(state, &response);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        time::Duration,
    };

    use futures::future::BoxFuture;
    use serde_json::json;
    use tokio::sync::broadcast::error::TryRecvError;

    use super::*;
    use crate::{
        config::SessionSettings,
        state::{AppState, SessionCoordinator, clock::ManualClock},
        upstream::{
            AuthResult, IssuedToken, PlaybackProvider, PlaybackState, TokenGrant, TokenProvider,
            TrackId, UpstreamResult,
        },
    };

    struct StaticTokens;

    impl TokenProvider for StaticTokens {
        fn exchange(&self, _grant: TokenGrant) -> BoxFuture<'static, AuthResult<IssuedToken>> {
            Box::pin(async {
                Ok(IssuedToken {
                    access_token: "access".into(),
                    refresh_token: None,
                    expires_in: None,
                })
            })
        }
    }

    /// Plays `t0`, `t1`, ... depending on `position`.
    #[derive(Default)]
    struct Jukebox {
        position: AtomicUsize,
    }

    impl PlaybackProvider for Jukebox {
        fn currently_playing(
            &self,
            _access_token: String,
        ) -> BoxFuture<'static, UpstreamResult<PlaybackState>> {
            let id = format!("t{}", self.position.load(Ordering::SeqCst));
            Box::pin(async move {
                Ok(PlaybackState {
                    track_id: Some(TrackId::new(id.clone())),
                    raw: json!({ "item": { "id": id } }),
                })
            })
        }

        fn skip_to_next(&self, _access_token: String) -> BoxFuture<'static, UpstreamResult<()>> {
            self.position.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        }
    }

    async fn signed_in_state() -> (SharedState, Arc<Jukebox>, Arc<ManualClock>) {
        let jukebox = Arc::new(Jukebox::default());
        let clock = Arc::new(ManualClock::new());
        let session = SessionCoordinator::new(
            &SessionSettings::default(),
            Arc::new(StaticTokens),
            jukebox.clone(),
            clock.clone(),
        );
        session.authorize("code".into()).await.unwrap();
        (AppState::new(session), jukebox, clock)
    }

    #[tokio::test]
    async fn stream_subscriber_sees_a_track_change_once() {
        let (state, jukebox, clock) = signed_in_state().await;

        let mut first = state.session_sse().subscribe();
        let initial = initial_stream_view(&state).await.unwrap();
        assert_eq!(
            initial.playback.and_then(|p| p.track_id).as_deref(),
            Some("t0")
        );
        assert!(matches!(first.try_recv(), Err(TryRecvError::Empty)));

        jukebox.position.store(1, Ordering::SeqCst);
        clock.advance(Duration::from_secs(2));

        let mut second = state.session_sse().subscribe();
        assert!(initial_stream_view(&state).await.is_none());

        let event = second.try_recv().unwrap();
        assert_eq!(event.event.as_deref(), Some("session_updated"));
        assert!(event.data.contains("\"t1\""));
        assert!(matches!(second.try_recv(), Err(TryRecvError::Empty)));
        assert!(first.try_recv().is_ok());
    }

    #[tokio::test]
    async fn invalid_veto_leaves_the_roster_untouched() {
        let (state, _jukebox, _clock) = signed_in_state().await;
        let payload = ParticipantPayload {
            sub: "two words".into(),
            name: None,
            nickname: None,
            picture: None,
        };

        let err = register_veto(&state, payload).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(get_session(&state).await.participant_count, 0);
    }
}
