use serde::{Deserialize, Serialize};

use crate::participant_id::{ParticipantId, Term};

/// Answer to an election status request.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct ElectionStatus {
    pub leader: Option<ParticipantId>,
    pub term: Term,
}

/// Announced to every participant whenever the leader changes.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct LeaderChange {
    pub new_leader: Option<ParticipantId>,
    pub term: Term,
}

impl From<LeaderChange> for ElectionStatus {
    fn from(change: LeaderChange) -> Self {
        Self {
            leader: change.new_leader,
            term: change.term,
        }
    }
}
