use crate::election::{ElectionStatus, LeaderChange};
use crate::participant_id::{ParticipantId, Term};

/// Membership of a session as seen by its host.
///
/// The oldest connected participant is the leader. Every change of leader
/// bumps the term, and only the current leader publishing with the current
/// term is admitted to the broadcast.
#[derive(Debug, Default)]
pub struct Roster {
    members: Vec<ParticipantId>,
    next_id: u32,
    leader: Option<ParticipantId>,
    term: Term,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&mut self) -> (ParticipantId, Option<LeaderChange>) {
        self.next_id += 1;
        let id = ParticipantId(self.next_id);
        self.members.push(id);
        (id, self.refresh())
    }

    /// Removing an unknown participant is a no-op.
    pub fn leave(&mut self, id: ParticipantId) -> Option<LeaderChange> {
        self.members.retain(|member| *member != id);
        self.refresh()
    }

    pub fn status(&self) -> ElectionStatus {
        ElectionStatus {
            leader: self.leader,
            term: self.term,
        }
    }

    pub fn admits(&self, from: ParticipantId, term: Term) -> bool {
        self.leader == Some(from) && self.term == term
    }

    pub fn members(&self) -> &[ParticipantId] {
        &self.members
    }

    fn refresh(&mut self) -> Option<LeaderChange> {
        let leader = self.members.first().copied();
        if leader == self.leader {
            return None;
        }
        self.leader = leader;
        self.term = self.term.next();
        Some(LeaderChange {
            new_leader: leader,
            term: self.term,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_member_leads() {
        let mut roster = Roster::new();
        let (first, change) = roster.join();
        assert_eq!(
            change,
            Some(LeaderChange {
                new_leader: Some(first),
                term: Term(1)
            })
        );

        let (_second, change) = roster.join();
        assert_eq!(change, None);
        assert_eq!(roster.status().leader, Some(first));
    }

    #[test]
    fn test_leader_leaving_promotes_next_member() {
        let mut roster = Roster::new();
        let (first, _) = roster.join();
        let (second, _) = roster.join();

        assert_eq!(
            roster.leave(first),
            Some(LeaderChange {
                new_leader: Some(second),
                term: Term(2)
            })
        );
        assert_eq!(roster.leave(first), None);
        assert_eq!(
            roster.leave(second),
            Some(LeaderChange {
                new_leader: None,
                term: Term(3)
            })
        );
        assert!(roster.members().is_empty());
    }

    #[test]
    fn test_follower_leaving_keeps_term() {
        let mut roster = Roster::new();
        let (first, _) = roster.join();
        let (second, _) = roster.join();

        assert_eq!(roster.leave(second), None);
        assert_eq!(
            roster.status(),
            ElectionStatus {
                leader: Some(first),
                term: Term(1)
            }
        );
    }

    #[test]
    fn test_only_current_leader_and_term_are_admitted() {
        let mut roster = Roster::new();
        let (first, _) = roster.join();
        let (second, _) = roster.join();

        assert!(roster.admits(first, Term(1)));
        assert!(!roster.admits(second, Term(1)));
        assert!(!roster.admits(first, Term(0)));

        roster.leave(first);
        assert!(!roster.admits(first, Term(1)));
        assert!(roster.admits(second, Term(2)));
    }
}
