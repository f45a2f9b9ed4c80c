pub mod local;
pub mod tcp;

use actix::{Actor, Addr, Context, Handler, Recipient};
use helpers::election::{ElectionStatus, LeaderChange};
use helpers::history::History;
use helpers::Frame;
use log::warn;

use crate::messages::{ElectionStatusResponse, HistoryBroadcast, LeadershipChanged};

/// Where a session delivers election news and broadcasts for one
/// participant.
#[derive(Clone)]
pub struct Inbox {
    status: Recipient<ElectionStatusResponse>,
    changes: Recipient<LeadershipChanged>,
    history: Recipient<HistoryBroadcast>,
}

impl Inbox {
    pub fn for_actor<A>(addr: &Addr<A>) -> Self
    where
        A: Actor<Context = Context<A>>
            + Handler<ElectionStatusResponse>
            + Handler<LeadershipChanged>
            + Handler<HistoryBroadcast>,
    {
        Self {
            status: addr.clone().recipient(),
            changes: addr.clone().recipient(),
            history: addr.clone().recipient(),
        }
    }

    pub fn status(&self, status: ElectionStatus) {
        self.status.do_send(ElectionStatusResponse(status));
    }

    pub fn leadership_changed(&self, change: LeaderChange) {
        self.changes.do_send(LeadershipChanged(change));
    }

    pub fn history(&self, history: History) {
        self.history.do_send(HistoryBroadcast(history));
    }

    /// Hands a frame received from the hub to the participant.
    pub fn deliver(&self, frame: Frame) {
        match frame {
            Frame::ElectionStatus { leader, term } => self.status(ElectionStatus { leader, term }),
            Frame::LeadershipChanged { new_leader, term } => {
                self.leadership_changed(LeaderChange { new_leader, term })
            }
            Frame::History { history } => self.history(history),
            other => warn!("[SESSION] unexpected frame from hub: {:?}", other),
        }
    }
}
