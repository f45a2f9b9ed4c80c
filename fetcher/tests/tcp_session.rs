use actix::{Actor, Addr};
use actix_rt::task::JoinHandle;
use fetcher::error::FetchError;
use fetcher::fetch_task::{FetchTask, PriceSource, RetryPolicy};
use fetcher::leader_election::Role;
use fetcher::messages::{BoardSnapshot, Snapshot};
use fetcher::scene::{Color, SceneGraph};
use fetcher::session::tcp::{forward, TcpLink, TcpSession};
use fetcher::session::Inbox;
use fetcher::Participant;
use helpers::history::History;
use helpers::participant_id::Term;
use helpers::protocol::ProtocolError;
use hub::{run_hub, Hub};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

struct FixedSource {
    price: &'static str,
    calls: AtomicUsize,
}

impl FixedSource {
    fn new(price: &'static str) -> Arc<Self> {
        Arc::new(Self {
            price,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceSource for FixedSource {
    fn fetch(&self) -> Result<History, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fetcher::fetch_task::latest_price(&format!(
            r#"{{"data":{{"prices":[{{"price":"42000.0"}},{{"price":"{}"}}]}}}}"#,
            self.price
        ))
    }
}

struct Connected {
    addr: Addr<Participant<TcpLink>>,
    reader: JoinHandle<Result<(), ProtocolError>>,
}

impl Connected {
    /// Closes the hub connection: the reader stops and, once the actor is
    /// gone, so does the writer.
    fn hang_up(self) {
        self.reader.abort();
        drop(self.addr);
    }
}

async fn start_hub() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    actix_rt::spawn(run_hub(listener, Hub::new().start()));
    addr
}

async fn connect(hub: SocketAddr, source: Arc<FixedSource>) -> Connected {
    let TcpSession { link, reader } = TcpSession::connect(hub).await.unwrap();
    let fetch = FetchTask::new(source, RetryPolicy::once());
    let addr = Participant::new(link, fetch, &SceneGraph::shared()).start();
    let reader = actix_rt::spawn(forward(reader, Inbox::for_actor(&addr)));
    Connected { addr, reader }
}

async fn wait_for_price(addr: &Addr<Participant<TcpLink>>, price: i64) -> BoardSnapshot {
    for _ in 0..100 {
        let snapshot = addr.send(Snapshot).await.unwrap();
        if snapshot.latest == Some(History::new(price)) {
            return snapshot;
        }
        actix_rt::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} was never broadcast", price);
}

#[actix_rt::test]
async fn test_price_reaches_every_participant_through_the_hub() {
    let hub = start_hub().await;
    let source = FixedSource::new("43000.5");

    let first = connect(hub, source.clone()).await;
    let second = connect(hub, source.clone()).await;

    for participant in [&first, &second] {
        let snapshot = wait_for_price(&participant.addr, 43000).await;
        let colors: Vec<Color> = snapshot.boxes.iter().map(|view| view.color).collect();
        assert_eq!(colors, vec![Color::GREEN, Color::BLUE]);
    }
    assert_eq!(source.calls(), 1);
}

#[actix_rt::test]
async fn test_follower_takes_over_when_leader_disconnects() {
    let hub = start_hub().await;
    let leader_source = FixedSource::new("43000.5");
    let follower_source = FixedSource::new("43001");

    let leader = connect(hub, leader_source.clone()).await;
    let follower = connect(hub, follower_source.clone()).await;
    wait_for_price(&follower.addr, 43000).await;
    assert_eq!(follower_source.calls(), 0);

    leader.hang_up();

    let snapshot = wait_for_price(&follower.addr, 43001).await;
    assert_eq!(snapshot.role, Role::Leader { term: Term(2) });
    let colors: Vec<Color> = snapshot.boxes.iter().map(|view| view.color).collect();
    assert_eq!(colors, vec![Color::GREEN]);
    assert_eq!(leader_source.calls(), 1);
    assert_eq!(follower_source.calls(), 1);
}
