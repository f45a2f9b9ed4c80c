use actix::{Actor, Context, Handler, Message, MessageResult};
use helpers::election::LeaderChange;
use helpers::history::History;
use helpers::participant_id::ParticipantId;
use helpers::roster::Roster;
use helpers::Frame;
use log::{info, warn};
use std::collections::BTreeMap;
use tokio::sync::mpsc::UnboundedSender;

/// A new connection. Answers the id assigned to it.
#[derive(Debug, Message)]
#[rtype(result = "ParticipantId")]
pub struct Join {
    pub outbox: UnboundedSender<Frame>,
}

#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Leave {
    pub id: ParticipantId,
}

/// A frame read from a participant's connection.
#[derive(Debug, Message)]
#[rtype(result = "()")]
pub struct Inbound {
    pub from: ParticipantId,
    pub frame: Frame,
}

/// Session host: election service and broadcast relay for every connected
/// participant.
#[derive(Default)]
pub struct Hub {
    roster: Roster,
    outboxes: BTreeMap<ParticipantId, UnboundedSender<Frame>>,
    /// Last relayed result, replayed to late joiners.
    latest: Option<History>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    fn send_to(&self, id: ParticipantId, frame: Frame) {
        if let Some(outbox) = self.outboxes.get(&id) {
            // A closed outbox belongs to a connection whose Leave is on its way.
            let _ = outbox.send(frame);
        }
    }

    fn send_to_all(&self, frame: Frame) {
        for outbox in self.outboxes.values() {
            let _ = outbox.send(frame.clone());
        }
    }

    fn announce(&self, change: Option<LeaderChange>) {
        if let Some(change) = change {
            info!(
                "[HUB] leader is now {:?} ({})",
                change.new_leader, change.term
            );
            self.send_to_all(change.into());
        }
    }
}

impl Actor for Hub {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!("[HUB] started");
    }

    fn stopped(&mut self, _ctx: &mut Context<Self>) {
        info!("[HUB] stopped");
    }
}

impl Handler<Join> for Hub {
    type Result = MessageResult<Join>;

    fn handle(&mut self, msg: Join, _ctx: &mut Context<Self>) -> Self::Result {
        let (id, change) = self.roster.join();
        info!("[HUB] {} joined", id);
        let _ = msg.outbox.send(Frame::Welcome { id });
        if let Some(history) = self.latest {
            let _ = msg.outbox.send(Frame::History { history });
        }
        self.outboxes.insert(id, msg.outbox);
        self.announce(change);
        MessageResult(id)
    }
}

impl Handler<Leave> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Leave, _ctx: &mut Context<Self>) -> Self::Result {
        info!("[HUB] {} left", msg.id);
        self.outboxes.remove(&msg.id);
        let change = self.roster.leave(msg.id);
        self.announce(change);
    }
}

impl Handler<Inbound> for Hub {
    type Result = ();

    fn handle(&mut self, msg: Inbound, _ctx: &mut Context<Self>) -> Self::Result {
        match msg.frame {
            Frame::ElectionStatusRequested => {
                self.send_to(msg.from, self.roster.status().into());
            }
            Frame::Publish { term, history } => {
                if self.roster.admits(msg.from, term) {
                    info!("[HUB] relaying {} from {}", history.price, msg.from);
                    self.latest = Some(history);
                    self.send_to_all(Frame::History { history });
                } else {
                    warn!(
                        "[HUB] dropping publish from {} for stale {}",
                        msg.from, term
                    );
                }
            }
            other => warn!("[HUB] unexpected frame from {}: {:?}", msg.from, other),
        }
    }
}
