use std::time::{Duration, Instant};

use indexmap::IndexSet;
use uuid::Uuid;

use crate::{state::roster::ParticipantId, upstream::TrackId};

/// Unique identifier for an issued skip command.
pub type SkipId = Uuid;

/// Phase of the veto gate for the current track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatePhase {
    /// Collecting vetoes for the current track.
    Tracking,
    /// A skip command went out; waiting for a snapshot showing another track.
    SkipPending(PendingSkip),
}

/// A skip command issued after the veto majority was reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSkip {
    /// Unique identifier for this skip attempt.
    pub id: SkipId,
    /// Track the majority vetoed.
    pub track_id: Option<TrackId>,
    /// Number of vetoes when the threshold was crossed.
    pub votes: usize,
    /// When the command was issued.
    pub since: Instant,
}

/// Result of recording a veto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VetoOutcome {
    /// The participant was not vetoing yet.
    Recorded,
    /// The participant had already vetoed this track.
    AlreadyCounted,
    /// A skip is already on its way; the veto changes nothing.
    SkipPending,
}

/// Majority gate over the participants vetoing the current track.
#[derive(Debug)]
pub struct VoteGate {
    votes: IndexSet<ParticipantId>,
    /// Last observed track; `None` also stands for "nothing playing" once `observed` is set.
    track_id: Option<TrackId>,
    observed: bool,
    phase: GatePhase,
    allow_small_roster_skip: bool,
}

impl VoteGate {
    /// Create an empty gate.
    ///
    /// `allow_small_roster_skip` decides whether rosters of zero or one participant can be
    /// skipped by a single veto.
    pub fn new(allow_small_roster_skip: bool) -> Self {
        Self {
            votes: IndexSet::new(),
            track_id: None,
            observed: false,
            phase: GatePhase::Tracking,
            allow_small_roster_skip,
        }
    }

    /// Add a veto for the current track.
    pub fn record_veto(&mut self, id: ParticipantId) -> VetoOutcome {
        if self.is_skip_pending() {
            return VetoOutcome::SkipPending;
        }
        if self.votes.insert(id) {
            VetoOutcome::Recorded
        } else {
            VetoOutcome::AlreadyCounted
        }
    }

    /// Reset the gate for a new track, `None` meaning nothing is playing.
    pub fn on_track_changed(&mut self, new_track: Option<TrackId>) {
        self.votes.clear();
        self.track_id = new_track;
        self.observed = true;
        self.phase = GatePhase::Tracking;
    }

    /// Feed the track seen in a freshly fetched snapshot, `None` meaning nothing is playing.
    ///
    /// Returns `true` when it differs from the last observed value, in which case the votes
    /// were cleared. The very first observation only records the track.
    pub fn observe_track(&mut self, observed: Option<&TrackId>) -> bool {
        if !self.observed {
            self.track_id = observed.cloned();
            self.observed = true;
            return false;
        }
        if self.track_id.as_ref() == observed {
            return false;
        }
        self.on_track_changed(observed.cloned());
        true
    }

    /// Whether the vetoes form a strict majority of the roster.
    pub fn should_skip(&self, roster_size: usize) -> bool {
        let votes = self.votes.len();
        if votes == 0 {
            return false;
        }
        if roster_size < 2 && !self.allow_small_roster_skip {
            return false;
        }
        votes * 2 > roster_size
    }

    /// Enter [`GatePhase::SkipPending`] if the majority is reached.
    ///
    /// Returns the pending skip the caller must execute; `None` when no skip is due or one is
    /// already in flight.
    pub fn begin_skip(&mut self, roster_size: usize, now: Instant) -> Option<PendingSkip> {
        if self.is_skip_pending() || !self.should_skip(roster_size) {
            return None;
        }
        let pending = PendingSkip {
            id: Uuid::new_v4(),
            track_id: self.track_id.clone(),
            votes: self.votes.len(),
            since: now,
        };
        self.phase = GatePhase::SkipPending(pending.clone());
        Some(pending)
    }

    /// Return to tracking after the skip command failed, keeping the vetoes.
    ///
    /// Returns `false` when `id` is no longer the pending skip.
    pub fn skip_failed(&mut self, id: SkipId) -> bool {
        match &self.phase {
            GatePhase::SkipPending(pending) if pending.id == id => {
                self.phase = GatePhase::Tracking;
                true
            }
            _ => false,
        }
    }

    /// Give up waiting for a skip to show up in snapshots, keeping the vetoes.
    pub fn expire_pending(&mut self, now: Instant, window: Duration) -> Option<PendingSkip> {
        let GatePhase::SkipPending(pending) = &self.phase else {
            return None;
        };
        if now.saturating_duration_since(pending.since) < window {
            return None;
        }
        let expired = pending.clone();
        self.phase = GatePhase::Tracking;
        Some(expired)
    }

    /// Whether a skip command is awaiting confirmation.
    pub fn is_skip_pending(&self) -> bool {
        matches!(self.phase, GatePhase::SkipPending(_))
    }

    /// Last track observed by the gate.
    pub fn track_id(&self) -> Option<&TrackId> {
        self.track_id.as_ref()
    }

    /// Number of vetoes against the current track.
    pub fn vote_count(&self) -> usize {
        self.votes.len()
    }

    /// Vetoing participants, in voting order.
    pub fn votes(&self) -> impl Iterator<Item = &ParticipantId> {
        self.votes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(value: &str) -> ParticipantId {
        ParticipantId::new(value)
    }

    fn track(value: &str) -> TrackId {
        TrackId::new(value)
    }

    #[test]
    fn repeated_vetoes_count_once() {
        let mut gate = VoteGate::new(true);
        assert_eq!(gate.record_veto(id("a")), VetoOutcome::Recorded);
        assert_eq!(gate.record_veto(id("a")), VetoOutcome::AlreadyCounted);
        assert_eq!(gate.record_veto(id("a")), VetoOutcome::AlreadyCounted);
        assert_eq!(gate.vote_count(), 1);
    }

    #[test]
    fn strict_majority_is_required() {
        let mut gate = VoteGate::new(true);
        assert!(!gate.should_skip(3));

        gate.record_veto(id("a"));
        assert!(!gate.should_skip(3));
        assert!(!gate.should_skip(2));

        gate.record_veto(id("b"));
        assert!(gate.should_skip(3));
        assert!(!gate.should_skip(4));

        gate.record_veto(id("c"));
        assert!(gate.should_skip(4));
    }

    #[test]
    fn no_votes_never_skips() {
        let gate = VoteGate::new(true);
        for roster in 0..6 {
            assert!(!gate.should_skip(roster));
        }
    }

    #[test]
    fn small_roster_policy() {
        let mut permissive = VoteGate::new(true);
        permissive.record_veto(id("a"));
        assert!(permissive.should_skip(0));
        assert!(permissive.should_skip(1));

        let mut strict = VoteGate::new(false);
        strict.record_veto(id("a"));
        assert!(!strict.should_skip(0));
        assert!(!strict.should_skip(1));
        strict.record_veto(id("b"));
        assert!(strict.should_skip(2));
    }

    #[test]
    fn observing_a_new_track_clears_votes() {
        let mut gate = VoteGate::new(true);
        assert!(!gate.observe_track(Some(&track("t1"))));
        gate.record_veto(id("a"));
        gate.record_veto(id("b"));

        assert!(!gate.observe_track(Some(&track("t1"))));
        assert_eq!(gate.vote_count(), 2);

        assert!(gate.observe_track(Some(&track("t2"))));
        assert_eq!(gate.vote_count(), 0);
        assert_eq!(gate.track_id(), Some(&track("t2")));
    }

    #[test]
    fn first_observation_keeps_votes() {
        let mut gate = VoteGate::new(true);
        gate.record_veto(id("a"));
        assert!(!gate.observe_track(Some(&track("t1"))));
        assert_eq!(gate.vote_count(), 1);
        assert_eq!(gate.track_id(), Some(&track("t1")));

        let mut idle = VoteGate::new(true);
        idle.record_veto(id("a"));
        assert!(!idle.observe_track(None));
        assert_eq!(idle.vote_count(), 1);
        assert!(!idle.observe_track(None));
        assert_eq!(idle.vote_count(), 1);
    }

    #[test]
    fn nothing_playing_after_a_track_is_a_change() {
        let mut gate = VoteGate::new(true);
        gate.observe_track(Some(&track("t1")));
        gate.record_veto(id("a"));
        gate.begin_skip(1, Instant::now()).unwrap();

        assert!(gate.observe_track(None));
        assert_eq!(gate.vote_count(), 0);
        assert_eq!(gate.phase, GatePhase::Tracking);
        assert_eq!(gate.track_id(), None);

        gate.record_veto(id("b"));
        assert!(!gate.observe_track(None));
        assert_eq!(gate.vote_count(), 1);

        assert!(gate.observe_track(Some(&track("t2"))));
        assert_eq!(gate.vote_count(), 0);
    }

    #[test]
    fn begin_skip_fires_once_per_crossing() {
        let mut gate = VoteGate::new(true);
        gate.observe_track(Some(&track("t1")));
        gate.record_veto(id("a"));
        assert!(gate.begin_skip(3, Instant::now()).is_none());

        gate.record_veto(id("b"));
        let pending = gate.begin_skip(3, Instant::now()).expect("majority reached");
        assert_eq!(pending.track_id, Some(track("t1")));
        assert_eq!(pending.votes, 2);
        assert!(gate.is_skip_pending());

        assert!(gate.begin_skip(3, Instant::now()).is_none());
        assert_eq!(gate.record_veto(id("c")), VetoOutcome::SkipPending);
        assert_eq!(gate.vote_count(), 2);
    }

    #[test]
    fn failed_skip_keeps_votes() {
        let mut gate = VoteGate::new(true);
        gate.record_veto(id("a"));
        gate.record_veto(id("b"));
        let pending = gate.begin_skip(3, Instant::now()).unwrap();

        assert!(!gate.skip_failed(Uuid::new_v4()));
        assert!(gate.is_skip_pending());

        assert!(gate.skip_failed(pending.id));
        assert_eq!(gate.phase, GatePhase::Tracking);
        assert_eq!(gate.vote_count(), 2);
        assert!(!gate.skip_failed(pending.id));
    }

    #[test]
    fn track_change_ends_pending_skip() {
        let mut gate = VoteGate::new(true);
        gate.observe_track(Some(&track("t1")));
        gate.record_veto(id("a"));
        let pending = gate.begin_skip(1, Instant::now()).unwrap();

        assert!(gate.observe_track(Some(&track("t2"))));
        assert_eq!(gate.phase, GatePhase::Tracking);
        assert_eq!(gate.vote_count(), 0);
        assert!(!gate.skip_failed(pending.id));
    }

    #[test]
    fn pending_skip_expires_after_window() {
        let mut gate = VoteGate::new(true);
        let start = Instant::now();
        gate.record_veto(id("a"));
        gate.begin_skip(1, start).unwrap();

        let window = Duration::from_secs(10);
        assert!(gate.expire_pending(start + Duration::from_secs(9), window).is_none());
        assert!(gate.is_skip_pending());

        let expired = gate.expire_pending(start + window, window).unwrap();
        assert_eq!(expired.votes, 1);
        assert_eq!(gate.phase, GatePhase::Tracking);
        assert_eq!(gate.vote_count(), 1);
    }
}
