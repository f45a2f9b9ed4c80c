use helpers::election::{ElectionStatus, LeaderChange};
use helpers::history::History;
use helpers::participant_id::{ParticipantId, Term};
use helpers::roster::Roster;
use log::{info, warn};
use std::{cell::RefCell, collections::BTreeMap, rc::Rc};

use super::Inbox;
use crate::leader_election::{Broadcast, ElectionService, SessionLink};

#[derive(Default)]
struct LocalHub {
    roster: Roster,
    inboxes: BTreeMap<ParticipantId, Inbox>,
    latest: Option<History>,
}

impl LocalHub {
    fn announce(&self, change: LeaderChange) {
        info!(
            "[SESSION] leader is now {:?} ({})",
            change.new_leader, change.term
        );
        for inbox in self.inboxes.values() {
            inbox.leadership_changed(change);
        }
    }
}

/// Session host living in the same thread as its participants.
///
/// Follows the same rules as the TCP hub: the oldest participant leads, only
/// the current leader's publishes for the current term are relayed, and late
/// joiners are handed the latest relayed history.
#[derive(Clone, Default)]
pub struct LocalSession {
    hub: Rc<RefCell<LocalHub>>,
}

impl LocalSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, inbox: Inbox) -> LocalLink {
        let mut hub = self.hub.borrow_mut();
        let (id, change) = hub.roster.join();
        if let Some(history) = hub.latest {
            inbox.history(history);
        }
        hub.inboxes.insert(id, inbox);
        if let Some(change) = change {
            hub.announce(change);
        }
        LocalLink {
            id,
            session: self.clone(),
        }
    }

    pub fn leave(&self, id: ParticipantId) {
        let mut hub = self.hub.borrow_mut();
        hub.inboxes.remove(&id);
        if let Some(change) = hub.roster.leave(id) {
            hub.announce(change);
        }
    }

    pub fn status(&self) -> ElectionStatus {
        self.hub.borrow().roster.status()
    }
}

pub struct LocalLink {
    id: ParticipantId,
    session: LocalSession,
}

impl ElectionService for LocalLink {
    fn request_status(&self) {
        let hub = self.session.hub.borrow();
        if let Some(inbox) = hub.inboxes.get(&self.id) {
            inbox.status(hub.roster.status());
        }
    }
}

impl Broadcast for LocalLink {
    fn broadcast(&self, term: Term, history: History) {
        let mut hub = self.session.hub.borrow_mut();
        if !hub.roster.admits(self.id, term) {
            warn!(
                "[SESSION] dropping publish from {} for stale {}",
                self.id, term
            );
            return;
        }
        hub.latest = Some(history);
        for inbox in hub.inboxes.values() {
            inbox.history(history);
        }
    }
}

impl SessionLink for LocalLink {
    fn id(&self) -> ParticipantId {
        self.id
    }
}
