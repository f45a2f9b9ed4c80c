use actix::Actor;
use clap::Parser;
use hub::{run_hub, Hub};
use log::{error, info};
use std::process;
use tokio::net::TcpListener;

/// Session hub: elects the oldest participant and relays its broadcasts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:9999")]
    bind: String,
}

#[actix_rt::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let listener = match TcpListener::bind(&args.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("[HUB] could not open {}: {}", args.bind, e);
            process::exit(1);
        }
    };
    info!("[HUB] listening on {}", args.bind);
    run_hub(listener, Hub::new().start()).await;
}
