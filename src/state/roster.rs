use std::fmt;

use indexmap::IndexMap;

/// Identity of a participant, taken from the `sub` claim of their auth profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    /// Wrap an already validated identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw identity.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile kept for every participant that joined the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Stable identity.
    pub id: ParticipantId,
    /// Full display name.
    pub name: Option<String>,
    /// Short display name.
    pub nickname: Option<String>,
    /// Avatar URL.
    pub picture: Option<String>,
}

impl Participant {
    /// Participant known only by identity.
    pub fn anonymous(id: ParticipantId) -> Self {
        Self {
            id,
            name: None,
            nickname: None,
            picture: None,
        }
    }
}

/// Append-only set of known participants, in join order.
///
/// Its size is the denominator of the veto majority.
#[derive(Debug, Default)]
pub struct Roster {
    entries: IndexMap<ParticipantId, Participant>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant unless their identity is already known.
    ///
    /// Returns `true` when the participant was new. The first profile seen for an identity wins.
    pub fn register(&mut self, participant: Participant) -> bool {
        if self.contains(&participant.id) {
            return false;
        }
        self.entries.insert(participant.id.clone(), participant);
        true
    }

    /// Whether `id` already joined.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of participants, the majority denominator.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nobody joined yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copy of every participant, in join order.
    pub fn participants(&self) -> Vec<Participant> {
        self.entries.values().cloned().collect()
    }
}
