use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::{
    dto::format_system_time,
    state::{SessionView, roster::Participant, snapshot_cache::PlaybackSnapshot},
};

/// Snapshot of the shared session returned by `GET /session` and after each veto.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionViewResponse {
    /// Whether the playback account is signed in.
    pub signed_in: bool,
    /// Participants whose veto counts against the current track.
    pub veto_ids: Vec<String>,
    /// Size of the roster, the denominator of the majority.
    pub participant_count: usize,
    /// Roster in join order.
    pub participants: Vec<ParticipantSummary>,
    /// Last known playback state, absent until the first successful fetch.
    pub playback: Option<PlaybackSnapshotDto>,
    /// Whether a skip was issued and is awaiting a track change.
    pub skip_pending: bool,
}

/// Public profile of a participant.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSummary {
    /// Participant identity.
    pub id: String,
    /// Full display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Short display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    /// Avatar URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Playback state as reported by the provider, with the time it was received.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlaybackSnapshotDto {
    /// Identifier of the playing item, `None` when nothing plays.
    pub track_id: Option<String>,
    /// RFC 3339 timestamp of the fetch.
    pub fetched_at: String,
    /// Provider payload, passed through untouched.
    #[schema(value_type = Object)]
    pub state: Value,
}

impl From<SessionView> for SessionViewResponse {
    fn from(view: SessionView) -> Self {
        Self {
            signed_in: view.signed_in,
            veto_ids: view
                .veto_ids
                .iter()
                .map(|id| id.as_str().to_owned())
                .collect(),
            participant_count: view.participant_count,
            participants: view
                .participants
                .into_iter()
                .map(ParticipantSummary::from)
                .collect(),
            playback: view
                .playback
                .as_deref()
                .map(PlaybackSnapshotDto::from),
            skip_pending: view.skip_pending,
        }
    }
}

impl From<Participant> for ParticipantSummary {
    fn from(participant: Participant) -> Self {
        Self {
            id: participant.id.as_str().to_owned(),
            name: participant.name,
            nickname: participant.nickname,
            picture: participant.picture,
        }
    }
}

impl From<&PlaybackSnapshot> for PlaybackSnapshotDto {
    fn from(snapshot: &PlaybackSnapshot) -> Self {
        Self {
            track_id: snapshot
                .track_id
                .as_ref()
                .map(|id| id.as_str().to_owned()),
            fetched_at: format_system_time(snapshot.received_at),
            state: snapshot.raw.clone(),
        }
    }
}
