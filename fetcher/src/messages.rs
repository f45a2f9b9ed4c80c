use actix::Message;
use helpers::election::{ElectionStatus, LeaderChange};
use helpers::history::History;
use helpers::participant_id::ParticipantId;

use crate::display::BoxView;
use crate::fetch_task::FetchState;
use crate::leader_election::Role;
use crate::scene::NodeId;

/// Answer to the status request issued when a participant starts.
#[derive(Debug, Clone, Copy, Message)]
#[rtype(result = "()")]
pub struct ElectionStatusResponse(pub ElectionStatus);

#[derive(Debug, Clone, Copy, Message)]
#[rtype(result = "()")]
pub struct LeadershipChanged(pub LeaderChange);

/// The leader's result, delivered to every participant.
#[derive(Debug, Clone, Copy, Message)]
#[rtype(result = "()")]
pub struct HistoryBroadcast(pub History);

/// Pointer pressed on a card. Answers whether a click behavior handled it.
#[derive(Debug, Clone, Copy, Message)]
#[rtype(result = "bool")]
pub struct PointerDown {
    pub card: NodeId,
}

#[derive(Debug, Clone, Copy, Message)]
#[rtype(result = "BoardSnapshot")]
pub struct Snapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    pub id: ParticipantId,
    pub role: Role,
    pub fetch: FetchState,
    pub latest: Option<History>,
    pub boxes: Vec<BoxView>,
}
