use actix::Actor;
use clap::Parser;
use fetcher::config::Config;
use fetcher::fetch_task::{FetchTask, HttpPriceSource, RetryPolicy};
use fetcher::scene::SceneGraph;
use fetcher::session::tcp::{forward, TcpSession};
use fetcher::session::Inbox;
use fetcher::Participant;
use log::{error, info};
use std::{path::PathBuf, process, sync::Arc};

/// Joins a session hub and renders the price history its leader fetches.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Hub address, overrides the configuration file
    #[arg(long)]
    hub: Option<String>,

    /// Price history endpoint, overrides the configuration file
    #[arg(long)]
    endpoint: Option<String>,
}

#[actix_rt::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match Config::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            process::exit(1);
        }
    };
    if let Some(hub) = args.hub {
        config.hub = hub;
    }
    if let Some(endpoint) = args.endpoint {
        config.fetch.endpoint = endpoint;
    }

    let session = match TcpSession::connect(config.hub.as_str()).await {
        Ok(session) => session,
        Err(e) => {
            error!("[PARTICIPANT] {}: {}", config.hub, e);
            process::exit(1);
        }
    };

    let source = Arc::new(HttpPriceSource::new(&config.fetch));
    let fetch = FetchTask::new(source, RetryPolicy::from(&config.fetch));
    let scene = SceneGraph::shared();
    let TcpSession { link, reader } = session;
    let addr = Participant::new(link, fetch, &scene).start();

    match forward(reader, Inbox::for_actor(&addr)).await {
        Ok(()) => info!("[PARTICIPANT] hub closed the session"),
        Err(e) => error!("[PARTICIPANT] lost the hub: {}", e),
    }
    actix::System::current().stop();
}
