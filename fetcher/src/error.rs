use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(Box<ureq::Error>),

    #[error("cannot read response body: {0}")]
    Body(#[from] std::io::Error),

    #[error("malformed price history: {0}")]
    Json(#[from] serde_json::Error),

    #[error("price history is empty")]
    EmptySeries,

    #[error("price {0:?} is not a number")]
    MalformedPrice(String),

    #[error("fetch aborted: {0}")]
    Aborted(String),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        FetchError::Http(Box::new(e))
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot reach hub: {0}")]
    Connect(#[from] std::io::Error),

    #[error(transparent)]
    Protocol(#[from] helpers::protocol::ProtocolError),

    #[error("expected a welcome from the hub, got {0:?}")]
    Handshake(Option<helpers::Frame>),
}
