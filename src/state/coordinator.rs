use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{Mutex, RwLock},
    time::timeout,
};
use tracing::{debug, info, warn};

use crate::{
    config::SessionSettings,
    state::{
        clock::Clock,
        credentials::TokenManager,
        roster::{Participant, ParticipantId, Roster},
        snapshot_cache::{CacheRead, PlaybackSnapshot, PlaybackSnapshotCache, RefreshOutcome},
        vote_gate::{PendingSkip, VetoOutcome, VoteGate},
    },
    upstream::{
        AuthResult, PlaybackProvider, PlaybackState, TokenProvider, UpstreamError, UpstreamResult,
    },
};

/// Aggregated session data returned to callers.
#[derive(Debug, Clone)]
pub struct SessionView {
    /// Whether the playback account is signed in.
    pub signed_in: bool,
    /// Participants vetoing the current track, in voting order.
    pub veto_ids: Vec<ParticipantId>,
    /// Size of the roster.
    pub participant_count: usize,
    /// Roster in join order.
    pub participants: Vec<Participant>,
    /// Last known snapshot, `None` before the first successful fetch.
    pub playback: Option<Arc<PlaybackSnapshot>>,
    /// Whether a skip awaits confirmation.
    pub skip_pending: bool,
    /// Whether producing this view observed a track change.
    pub track_changed: bool,
}

/// Owner of the single shared playback session.
///
/// Locks are always taken in the order snapshot slot, vote gate, roster; the skip command runs
/// with none of them held.
pub struct SessionCoordinator {
    tokens: TokenManager,
    playback: Arc<dyn PlaybackProvider>,
    clock: Arc<dyn Clock>,
    cache: PlaybackSnapshotCache,
    votes: Mutex<VoteGate>,
    roster: RwLock<Roster>,
    upstream_timeout: Duration,
    skip_confirmation: Duration,
}

impl SessionCoordinator {
    /// Build a coordinator with an empty roster, no votes and no cached snapshot.
    pub fn new(
        settings: &SessionSettings,
        tokens: Arc<dyn TokenProvider>,
        playback: Arc<dyn PlaybackProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            tokens: TokenManager::new(tokens, clock.clone()),
            playback,
            cache: PlaybackSnapshotCache::new(
                settings.snapshot_ttl,
                settings.upstream_timeout,
                clock.clone(),
            ),
            clock,
            votes: Mutex::new(VoteGate::new(settings.allow_small_roster_skip)),
            roster: RwLock::new(Roster::new()),
            upstream_timeout: settings.upstream_timeout,
            skip_confirmation: settings.skip_confirmation,
        }
    }

    /// Refresh the playback snapshot if stale and assemble the session view.
    pub async fn view(&self) -> SessionView {
        let (read, track_changed) = self.refresh().await;
        let playback = read.snapshot();
        drop(read);
        self.assemble(playback, track_changed).await
    }

    /// Record a veto from `participant`, skipping the track once a majority is reached.
    ///
    /// The returned view reflects the attempted skip; confirmation arrives with a later snapshot.
    pub async fn register_veto(&self, participant: Participant) -> SessionView {
        let id = participant.id.clone();
        self.register_participant(participant).await;

        let (read, observed_change) = self.refresh().await;
        let pending = {
            let mut gate = self.votes.lock().await;
            match gate.record_veto(id.clone()) {
                VetoOutcome::Recorded => info!(
                    participant = %id,
                    track_id = ?gate.track_id().map(|t| t.as_str()),
                    votes = gate.vote_count(),
                    "veto recorded"
                ),
                VetoOutcome::AlreadyCounted => debug!(participant = %id, "veto already counted"),
                VetoOutcome::SkipPending => {
                    debug!(participant = %id, "veto ignored; skip already pending")
                }
            }
            let roster_size = self.roster.read().await.len();
            gate.begin_skip(roster_size, self.clock.now())
        };
        drop(read);

        if let Some(pending) = pending {
            self.advance_track(pending).await;
        }

        let mut view = self.view().await;
        view.track_changed |= observed_change;
        view
    }

    /// Add a participant to the roster. Returns `true` when they were not known yet.
    pub async fn register_participant(&self, participant: Participant) -> bool {
        let id = participant.id.clone();
        let added = self.roster.write().await.register(participant);
        if added {
            info!(participant = %id, "participant joined the session");
        }
        added
    }

    /// Exchange an authorization code for the playback account credentials.
    pub async fn authorize(&self, code: String) -> AuthResult<()> {
        self.tokens.authorize(code).await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Whether the playback account is signed in.
    pub async fn is_signed_in(&self) -> bool {
        self.tokens.is_signed_in().await
    }

    /// Whether the most recent playback fetch failed.
    pub async fn is_playback_failing(&self) -> bool {
        self.cache.is_failing().await
    }

    /// Refresh the snapshot if stale and apply what it says to the vote gate.
    ///
    /// The returned read keeps the snapshot slot locked until dropped. The flag reports whether
    /// the refresh moved the gate onto a new track.
    async fn refresh(&self) -> (CacheRead<'_>, bool) {
        let read = self.cache.get(move || self.fetch_playback()).await;

        let mut gate = self.votes.lock().await;
        let mut changed = false;
        match read.outcome() {
            RefreshOutcome::Cached => {}
            RefreshOutcome::Refreshed => {
                let snapshot = read.snapshot();
                let track = snapshot.as_ref().and_then(|s| s.track_id.as_ref());
                changed = gate.observe_track(track);
                if changed {
                    info!(track_id = ?track.map(|t| t.as_str()), "track changed; vetoes cleared");
                }
            }
            RefreshOutcome::Failed(err) => {
                warn!(error = %err, "playback refresh failed; serving cached snapshot");
            }
        }
        if let Some(expired) = gate.expire_pending(self.clock.now(), self.skip_confirmation) {
            warn!(
                skip_id = %expired.id,
                votes = gate.vote_count(),
                "skip not confirmed in time; vetoes kept"
            );
        }
        drop(gate);

        (read, changed)
    }

    async fn fetch_playback(&self) -> UpstreamResult<PlaybackState> {
        let access_token = self.tokens.access_token().await?;
        self.playback.currently_playing(access_token).await
    }

    async fn skip_to_next(&self) -> UpstreamResult<()> {
        let access_token = self.tokens.access_token().await?;
        self.playback.skip_to_next(access_token).await
    }

    /// Issue the skip command for `pending`.
    ///
    /// Success invalidates the snapshot so the next read observes the new track. Failure
    /// returns the gate to tracking with the vetoes untouched.
    async fn advance_track(&self, pending: PendingSkip) {
        info!(
            skip_id = %pending.id,
            track_id = ?pending.track_id.as_ref().map(|t| t.as_str()),
            votes = pending.votes,
            "veto majority reached; skipping track"
        );

        let result = match timeout(self.upstream_timeout, self.skip_to_next()).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.upstream_timeout)),
        };

        match result {
            Ok(()) => self.cache.invalidate().await,
            Err(err) => {
                warn!(skip_id = %pending.id, error = %err, "skip command failed; vetoes kept");
                self.votes.lock().await.skip_failed(pending.id);
            }
        }
    }

    async fn assemble(
        &self,
        playback: Option<Arc<PlaybackSnapshot>>,
        track_changed: bool,
    ) -> SessionView {
        let signed_in = self.tokens.is_signed_in().await;
        let (veto_ids, skip_pending) = {
            let gate = self.votes.lock().await;
            (gate.votes().cloned().collect(), gate.is_skip_pending())
        };
        let (participant_count, participants) = {
            let roster = self.roster.read().await;
            (roster.len(), roster.participants())
        };

        SessionView {
            signed_in,
            veto_ids,
            participant_count,
            participants,
            playback,
            skip_pending,
            track_changed,
        }
    }
}
