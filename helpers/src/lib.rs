pub mod election;
pub mod history;
pub mod participant_id;
pub mod protocol;
pub mod roster;

use election::{ElectionStatus, LeaderChange};
use history::History;
use participant_id::{ParticipantId, Term};
use serde::{Deserialize, Serialize};

/// Messages exchanged between participants and the session host.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Frame {
    /// First frame sent by the host on a new connection.
    Welcome { id: ParticipantId },
    ElectionStatusRequested,
    ElectionStatus { leader: Option<ParticipantId>, term: Term },
    LeadershipChanged { new_leader: Option<ParticipantId>, term: Term },
    /// Sent by a leader. The host relays it as `History` to everyone.
    Publish { term: Term, history: History },
    History { history: History },
}

impl Frame {
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl From<ElectionStatus> for Frame {
    fn from(status: ElectionStatus) -> Self {
        Frame::ElectionStatus {
            leader: status.leader,
            term: status.term,
        }
    }
}

impl From<LeaderChange> for Frame {
    fn from(change: LeaderChange) -> Self {
        Frame::LeadershipChanged {
            new_leader: change.new_leader,
            term: change.term,
        }
    }
}
