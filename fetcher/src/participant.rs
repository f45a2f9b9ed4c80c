use actix::{Actor, ActorFutureExt, AsyncContext, Context, Handler, MessageResult, WrapFuture};
use helpers::election::ElectionStatus;
use helpers::history::History;
use helpers::participant_id::{ParticipantId, Term};
use log::{info, warn};

use crate::display::PriceBoard;
use crate::error::FetchError;
use crate::fetch_task::FetchTask;
use crate::leader_election::{ElectionClient, SessionLink, Transition};
use crate::messages::{
    BoardSnapshot, ElectionStatusResponse, HistoryBroadcast, LeadershipChanged, PointerDown,
    Snapshot,
};
use crate::scene::Scene;

/// One participant of the session.
///
/// The leader fetches the latest price and publishes it; every participant,
/// the leader included, renders whatever comes back on the broadcast.
pub struct Participant<S: SessionLink> {
    id: ParticipantId,
    link: S,
    election: ElectionClient,
    fetch: FetchTask,
    board: PriceBoard,
}

impl<S: SessionLink + Unpin + 'static> Participant<S> {
    pub fn new(link: S, fetch: FetchTask, scene: &Scene) -> Self {
        let id = link.id();
        Self {
            id,
            link,
            election: ElectionClient::new(id),
            fetch,
            board: PriceBoard::new(scene),
        }
    }

    fn on_election(&mut self, status: ElectionStatus, ctx: &mut Context<Self>) {
        match self.election.observe(status) {
            Transition::BecameLeader(term) => {
                info!("[PARTICIPANT {}] elected for {}", self.id, term);
                self.start_fetch(term, ctx);
            }
            Transition::LostLeadership => {
                info!("[PARTICIPANT {}] no longer the leader", self.id);
                self.fetch.leadership_lost();
            }
            Transition::Unchanged => {}
        }
    }

    fn start_fetch(&mut self, term: Term, ctx: &mut Context<Self>) {
        let Some(fetch) = self.fetch.begin(term) else {
            info!(
                "[PARTICIPANT {}] previous fetch still pending, not fetching again",
                self.id
            );
            return;
        };
        info!("[PARTICIPANT {}] fetching price history", self.id);
        ctx.spawn(
            fetch
                .into_actor(self)
                .map(move |result, act, _ctx| act.fetched(term, result)),
        );
    }

    fn fetched(&mut self, started: Term, result: Result<History, FetchError>) {
        let history = match result {
            Ok(history) => history,
            Err(e) => {
                warn!("[PARTICIPANT {}] fetch failed: {}", self.id, e);
                self.fetch.finish(false);
                return;
            }
        };
        match self.election.leader_term() {
            Some(term) => {
                info!(
                    "[PARTICIPANT {}] publishing {} for {}",
                    self.id, history.price, term
                );
                self.link.broadcast(term, history);
                self.fetch.finish(true);
            }
            None => {
                // Deposed while fetching. The hub fences the stale term.
                warn!(
                    "[PARTICIPANT {}] lost leadership during fetch, publishing for {}",
                    self.id, started
                );
                self.link.broadcast(started, history);
                self.fetch.finish(false);
            }
        }
    }
}

impl<S: SessionLink + Unpin + 'static> Actor for Participant<S> {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        info!("[PARTICIPANT {}] started", self.id);
        self.link.request_status();
    }

    fn stopped(&mut self, _ctx: &mut Context<Self>) {
        self.board.teardown();
        info!("[PARTICIPANT {}] stopped", self.id);
    }
}

impl<S: SessionLink + Unpin + 'static> Handler<ElectionStatusResponse> for Participant<S> {
    type Result = ();

    fn handle(&mut self, msg: ElectionStatusResponse, ctx: &mut Context<Self>) -> Self::Result {
        self.on_election(msg.0, ctx);
    }
}

impl<S: SessionLink + Unpin + 'static> Handler<LeadershipChanged> for Participant<S> {
    type Result = ();

    fn handle(&mut self, msg: LeadershipChanged, ctx: &mut Context<Self>) -> Self::Result {
        self.on_election(msg.0.into(), ctx);
    }
}

impl<S: SessionLink + Unpin + 'static> Handler<HistoryBroadcast> for Participant<S> {
    type Result = ();

    fn handle(&mut self, msg: HistoryBroadcast, _ctx: &mut Context<Self>) -> Self::Result {
        self.fetch.broadcast_observed();
        self.board.apply(msg.0);
    }
}

impl<S: SessionLink + Unpin + 'static> Handler<PointerDown> for Participant<S> {
    type Result = bool;

    fn handle(&mut self, msg: PointerDown, _ctx: &mut Context<Self>) -> Self::Result {
        self.board.pointer_down(msg.card)
    }
}

impl<S: SessionLink + Unpin + 'static> Handler<Snapshot> for Participant<S> {
    type Result = MessageResult<Snapshot>;

    fn handle(&mut self, _msg: Snapshot, _ctx: &mut Context<Self>) -> Self::Result {
        MessageResult(BoardSnapshot {
            id: self.id,
            role: self.election.role(),
            fetch: self.fetch.state(),
            latest: self.board.latest(),
            boxes: self.board.boxes(),
        })
    }
}
