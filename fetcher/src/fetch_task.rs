use helpers::history::History;
use helpers::participant_id::Term;
use log::{debug, warn};
use serde::Deserialize;
use std::{future::Future, sync::Arc, thread, time::Duration};

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Somewhere a price history can be fetched from.
///
/// Implementations block; the fetch task runs them on tokio's blocking pool.
pub trait PriceSource: Send + Sync {
    fn fetch(&self) -> Result<History, FetchError>;
}

#[derive(Debug, Deserialize)]
struct PriceHistory {
    data: PriceData,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    prices: Vec<PricePoint>,
}

#[derive(Debug, Deserialize)]
struct PricePoint {
    price: String,
}

/// Extracts the last price of a `{ data: { prices: [...] } }` document.
pub fn latest_price(body: &str) -> Result<History, FetchError> {
    let history: PriceHistory = serde_json::from_str(body)?;
    let last = history
        .data
        .prices
        .last()
        .ok_or(FetchError::EmptySeries)?;
    Ok(History::new(parse_price(&last.price)?))
}

/// Integer part of a decimal string: leading whitespace is skipped, an
/// optional sign is accepted and parsing stops at the first non digit.
pub fn parse_price(text: &str) -> Result<i64, FetchError> {
    let malformed = || FetchError::MalformedPrice(text.into());
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(malformed());
    }
    let value: i64 = rest[..digits].parse().map_err(|_| malformed())?;
    Ok(if negative { -value } else { value })
}

pub struct HttpPriceSource {
    agent: ureq::Agent,
    endpoint: String,
}

impl HttpPriceSource {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(config.timeout()).build(),
            endpoint: config.endpoint.clone(),
        }
    }
}

impl PriceSource for HttpPriceSource {
    fn fetch(&self) -> Result<History, FetchError> {
        debug!("[FETCH] GET {}", self.endpoint);
        let body = self.agent.get(&self.endpoint).call()?.into_string()?;
        latest_price(&body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn run(&self, source: &dyn PriceSource) -> Result<History, FetchError> {
        let mut attempt = 1;
        loop {
            match source.fetch() {
                Ok(history) => return Ok(history),
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "[FETCH] attempt {}/{} failed: {}",
                        attempt, self.max_attempts, e
                    );
                    attempt += 1;
                    thread::sleep(self.delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

impl From<&FetchConfig> for RetryPolicy {
    fn from(config: &FetchConfig) -> Self {
        Self::new(config.max_attempts, config.retry_delay())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum FetchState {
    Idle,
    InFlight { term: Term },
    /// The result went out but has not come back on the broadcast yet.
    Published,
}

/// Performs the leader's fetch, at most one at a time.
///
/// A new fetch can only begin from `Idle`. A published result keeps the task
/// busy until it is observed on the broadcast or leadership is lost, so
/// regaining leadership without an intervening broadcast does not fetch
/// twice.
pub struct FetchTask {
    source: Arc<dyn PriceSource>,
    retry: RetryPolicy,
    state: FetchState,
}

impl FetchTask {
    pub fn new(source: Arc<dyn PriceSource>, retry: RetryPolicy) -> Self {
        Self {
            source,
            retry,
            state: FetchState::Idle,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state
    }

    pub fn begin(
        &mut self,
        term: Term,
    ) -> Option<impl Future<Output = Result<History, FetchError>> + 'static> {
        if self.state != FetchState::Idle {
            return None;
        }
        self.state = FetchState::InFlight { term };

        let source = Arc::clone(&self.source);
        let retry = self.retry.clone();
        Some(async move {
            tokio::task::spawn_blocking(move || retry.run(source.as_ref()))
                .await
                .unwrap_or_else(|e| Err(FetchError::Aborted(e.to_string())))
        })
    }

    /// Ends the in-flight fetch. `published` tells whether the result still
    /// has to be seen on the broadcast.
    pub fn finish(&mut self, published: bool) {
        if let FetchState::InFlight { .. } = self.state {
            self.state = if published {
                FetchState::Published
            } else {
                FetchState::Idle
            };
        }
    }

    pub fn broadcast_observed(&mut self) {
        if self.state == FetchState::Published {
            self.state = FetchState::Idle;
        }
    }

    /// A deposed leader's publish may have been fenced off by the host and
    /// will never come back.
    pub fn leadership_lost(&mut self) {
        self.broadcast_observed();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Serves canned results and counts calls.
    pub struct StubSource {
        results: Mutex<Vec<Result<History, FetchError>>>,
        pub calls: AtomicUsize,
    }

    impl StubSource {
        pub fn new(mut results: Vec<Result<History, FetchError>>) -> Self {
            results.reverse();
            Self {
                results: Mutex::new(results),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PriceSource for StubSource {
        fn fetch(&self) -> Result<History, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.results
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(FetchError::EmptySeries))
        }
    }

    #[test]
    fn test_parse_price_like_parse_int() {
        assert_eq!(parse_price("43000.5").unwrap(), 43000);
        assert_eq!(parse_price("  17").unwrap(), 17);
        assert_eq!(parse_price("-12.9").unwrap(), -12);
        assert_eq!(parse_price("+8abc").unwrap(), 8);
        assert!(matches!(
            parse_price("abc"),
            Err(FetchError::MalformedPrice(_))
        ));
        assert!(parse_price("").is_err());
        assert!(parse_price("-").is_err());
        assert!(parse_price("99999999999999999999999").is_err());
    }

    #[test]
    fn test_latest_price_takes_last_entry() {
        let body = r#"{"data":{"base":"BTC","prices":[
            {"price":"41000.1","time":"2022-05-01T00:00:00Z"},
            {"price":"43000.5","time":"2022-05-02T00:00:00Z"}
        ]}}"#;
        assert_eq!(latest_price(body).unwrap(), History::new(43000));
    }

    #[test]
    fn test_latest_price_failures() {
        assert!(matches!(
            latest_price(r#"{"data":{"prices":[]}}"#),
            Err(FetchError::EmptySeries)
        ));
        assert!(matches!(
            latest_price(r#"{"data":{}}"#),
            Err(FetchError::Json(_))
        ));
        assert!(matches!(latest_price(""), Err(FetchError::Json(_))));
        assert!(matches!(
            latest_price(r#"{"data":{"prices":[{"price":"n/a"}]}}"#),
            Err(FetchError::MalformedPrice(_))
        ));
    }

    #[test]
    fn test_retry_policy_is_bounded() {
        let source = StubSource::new(vec![
            Err(FetchError::EmptySeries),
            Err(FetchError::EmptySeries),
            Ok(History::new(7)),
        ]);
        let policy = RetryPolicy::new(2, Duration::ZERO);
        assert!(policy.run(&source).is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);

        assert_eq!(policy.run(&source).unwrap(), History::new(7));
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_single_attempt_by_default() {
        let source = StubSource::new(vec![Err(FetchError::EmptySeries), Ok(History::new(1))]);
        let policy = RetryPolicy::from(&FetchConfig::default());
        assert!(policy.run(&source).is_err());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(RetryPolicy::new(0, Duration::ZERO), RetryPolicy::once());
    }

    #[actix_rt::test]
    async fn test_only_one_fetch_at_a_time() {
        let source = Arc::new(StubSource::new(vec![Ok(History::new(4)), Ok(History::new(5))]));
        let mut task = FetchTask::new(source.clone(), RetryPolicy::once());

        let fetch = task.begin(Term(1)).unwrap();
        assert_eq!(task.state(), FetchState::InFlight { term: Term(1) });
        assert!(task.begin(Term(1)).is_none());

        // A broadcast from someone else does not release an in-flight fetch.
        task.broadcast_observed();
        assert!(task.begin(Term(2)).is_none());

        assert_eq!(fetch.await.unwrap(), History::new(4));
        task.finish(true);
        assert_eq!(task.state(), FetchState::Published);
        assert!(task.begin(Term(3)).is_none());

        task.broadcast_observed();
        assert_eq!(task.begin(Term(3)).unwrap().await.unwrap(), History::new(5));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_failure_and_lost_leadership_release_the_task() {
        let source = Arc::new(StubSource::new(vec![]));
        let mut task = FetchTask::new(source, RetryPolicy::once());

        let _fetch = task.begin(Term(1)).unwrap();
        task.finish(false);
        assert_eq!(task.state(), FetchState::Idle);

        let _fetch = task.begin(Term(2)).unwrap();
        task.leadership_lost();
        assert_eq!(task.state(), FetchState::InFlight { term: Term(2) });
        task.finish(true);
        task.leadership_lost();
        assert_eq!(task.state(), FetchState::Idle);

        // Finishing twice is harmless.
        task.finish(true);
        assert_eq!(task.state(), FetchState::Idle);
    }

    #[test]
    fn test_http_source_against_local_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).unwrap();
            let body = r#"{"data":{"prices":[{"price":"10.0"},{"price":"43000.5"}]}}"#;
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            )
            .unwrap();
        });

        let source = HttpPriceSource::new(&FetchConfig {
            endpoint: format!("http://{}/v2/prices/BTC-USD/historic?period=day", addr),
            ..FetchConfig::default()
        });
        assert_eq!(source.fetch().unwrap(), History::new(43000));
        server.join().unwrap();
    }

    #[test]
    fn test_http_error_status_is_a_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).unwrap();
            stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .unwrap();
        });

        let source = HttpPriceSource::new(&FetchConfig {
            endpoint: format!("http://{}/", addr),
            ..FetchConfig::default()
        });
        assert!(matches!(source.fetch(), Err(FetchError::Http(_))));
        server.join().unwrap();
    }
}
