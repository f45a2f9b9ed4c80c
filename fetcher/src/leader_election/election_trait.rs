use helpers::history::History;
use helpers::participant_id::{ParticipantId, Term};

/// Client side of the election service provided by the session host.
pub trait ElectionService {
    /// Asks for the current election status.
    /// The answer is delivered later as an `ElectionStatusResponse`.
    fn request_status(&self);
}

/// Reliable broadcast to every participant of the session, the sender
/// included.
pub trait Broadcast {
    /// Publishes `history` on behalf of the leader of `term`.
    ///
    /// The host drops the publish if `term` is no longer current, so a
    /// deposed leader never reaches the other participants.
    fn broadcast(&self, term: Term, history: History);
}

/// Everything a participant needs from its session.
pub trait SessionLink: ElectionService + Broadcast {
    /// Id assigned to this participant by the host.
    fn id(&self) -> ParticipantId;
}
