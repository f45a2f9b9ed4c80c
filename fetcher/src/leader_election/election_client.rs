use helpers::election::ElectionStatus;
use helpers::participant_id::{ParticipantId, Term};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    Follower,
    Leader { term: Term },
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Transition {
    BecameLeader(Term),
    LostLeadership,
    Unchanged,
}

/// Tracks whether the local participant is the leader.
///
/// Status answers and leadership announcements are fed through `observe`
/// alike. Only edges are reported, so hearing the same news twice never
/// yields a second `BecameLeader`.
#[derive(Debug)]
pub struct ElectionClient {
    me: ParticipantId,
    role: Role,
    latest_term: Term,
}

impl ElectionClient {
    pub fn new(me: ParticipantId) -> Self {
        Self {
            me,
            role: Role::Follower,
            latest_term: Term::default(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_leader(&self) -> bool {
        matches!(self.role, Role::Leader { .. })
    }

    /// Term held by this participant, if it leads.
    pub fn leader_term(&self) -> Option<Term> {
        match self.role {
            Role::Leader { term } => Some(term),
            Role::Follower => None,
        }
    }

    pub fn observe(&mut self, status: ElectionStatus) -> Transition {
        if status.term < self.latest_term {
            return Transition::Unchanged;
        }
        self.latest_term = status.term;

        let elected = status.leader == Some(self.me);
        match (self.role, elected) {
            (Role::Follower, true) => {
                self.role = Role::Leader { term: status.term };
                Transition::BecameLeader(status.term)
            }
            (Role::Leader { .. }, true) => {
                // Still the same leader, a missed intermediate term does not
                // start a new one.
                self.role = Role::Leader { term: status.term };
                Transition::Unchanged
            }
            (Role::Leader { .. }, false) => {
                self.role = Role::Follower;
                Transition::LostLeadership
            }
            (Role::Follower, false) => Transition::Unchanged,
        }
    }
}
