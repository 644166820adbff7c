use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant, SystemTime},
};

use serde_json::Value;
use tokio::{
    sync::{Mutex, MutexGuard},
    time::timeout,
};

use crate::{
    state::clock::Clock,
    upstream::{PlaybackState, TrackId, UpstreamError, UpstreamResult},
};

/// Immutable playback state stamped with its fetch time.
#[derive(Debug)]
pub struct PlaybackSnapshot {
    /// Track loaded on the active device; `None` when nothing is playing.
    pub track_id: Option<TrackId>,
    /// Provider payload.
    pub raw: Value,
    /// Monotonic time at which the fetch completed.
    pub fetched_at: Instant,
    /// Wall-clock fetch time reported to clients.
    pub received_at: SystemTime,
}

impl PlaybackSnapshot {
    fn new(state: PlaybackState, fetched_at: Instant) -> Self {
        Self {
            track_id: state.track_id,
            raw: state.raw,
            fetched_at,
            received_at: SystemTime::now(),
        }
    }
}

/// How a [`PlaybackSnapshotCache::get`] call was served.
#[derive(Debug)]
pub enum RefreshOutcome {
    /// Served from the cache inside the TTL window.
    Cached,
    /// A new snapshot replaced the previous one.
    Refreshed,
    /// The fetch failed; the previous snapshot (if any) is still served.
    Failed(UpstreamError),
}

#[derive(Debug, Default)]
struct CacheSlot {
    snapshot: Option<Arc<PlaybackSnapshot>>,
    /// Completion time of the last fetch attempt, successful or not.
    checked_at: Option<Instant>,
    invalidated: bool,
    failing: bool,
}

impl CacheSlot {
    fn is_fresh(&self, now: Instant, ttl: Duration) -> bool {
        !self.invalidated
            && self
                .checked_at
                .is_some_and(|at| now.saturating_duration_since(at) < ttl)
    }
}

/// Result of a cache read.
///
/// Holds the cache lock until dropped, so whatever the caller derives from the snapshot (vote
/// resets) happens before any other refresh can replace it.
pub struct CacheRead<'a> {
    slot: MutexGuard<'a, CacheSlot>,
    outcome: RefreshOutcome,
}

impl CacheRead<'_> {
    /// Snapshot currently in the cache.
    pub fn snapshot(&self) -> Option<Arc<PlaybackSnapshot>> {
        self.slot.snapshot.clone()
    }

    /// How this read was served.
    pub fn outcome(&self) -> &RefreshOutcome {
        &self.outcome
    }
}

/// Single-slot, TTL-gated cache of the playback state.
///
/// At most one fetch runs at a time: the slot lock is held across the upstream call and
/// concurrent readers wait for its result instead of issuing their own. Time is read from the
/// clock only once the slot is held, so readers queued behind a slow fetch judge freshness
/// against the time they are actually served.
pub struct PlaybackSnapshotCache {
    slot: Mutex<CacheSlot>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    fetch_timeout: Duration,
}

impl PlaybackSnapshotCache {
    /// Create an empty cache.
    pub fn new(ttl: Duration, fetch_timeout: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            slot: Mutex::new(CacheSlot::default()),
            clock,
            ttl,
            fetch_timeout,
        }
    }

    /// Return the cached snapshot, refreshing it through `fetch` when stale.
    ///
    /// A failed or timed-out fetch leaves the previous snapshot in place and is reported through
    /// [`RefreshOutcome::Failed`]. Failed attempts count against the TTL too, so an outage is
    /// retried at most once per window.
    pub async fn get<F, Fut>(&self, fetch: F) -> CacheRead<'_>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = UpstreamResult<PlaybackState>>,
    {
        let mut slot = self.slot.lock().await;
        if slot.is_fresh(self.clock.now(), self.ttl) {
            return CacheRead {
                slot,
                outcome: RefreshOutcome::Cached,
            };
        }

        let result = match timeout(self.fetch_timeout, fetch()).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout(self.fetch_timeout)),
        };

        let completed_at = self.clock.now();
        slot.checked_at = Some(completed_at);
        slot.invalidated = false;
        let outcome = match result {
            Ok(state) => {
                slot.snapshot = Some(Arc::new(PlaybackSnapshot::new(state, completed_at)));
                slot.failing = false;
                RefreshOutcome::Refreshed
            }
            Err(err) => {
                slot.failing = true;
                RefreshOutcome::Failed(err)
            }
        };

        CacheRead { slot, outcome }
    }

    /// Force the next [`get`](Self::get) to fetch regardless of the TTL.
    pub async fn invalidate(&self) {
        self.slot.lock().await.invalidated = true;
    }

    /// Whether the most recent fetch attempt failed.
    pub async fn is_failing(&self) -> bool {
        self.slot.lock().await.failing
    }
}
