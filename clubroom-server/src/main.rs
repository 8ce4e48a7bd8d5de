use std::{net::SocketAddr, time::Duration};

use anyhow::Context;
use structopt::StructOpt;

use clubroom_server::{app, AppState};

#[derive(Debug, StructOpt)]
#[structopt(name = "clubroom-server")]
struct Opt {
    /// Address to listen on
    #[structopt(long, default_value = "127.0.0.1:3000")]
    bind: SocketAddr,

    /// Per-request deadline, in seconds
    #[structopt(long, default_value = "30")]
    request_timeout: u64,

    /// Seconds between reference-reconciliation passes
    #[structopt(long, default_value = "300")]
    reconcile_interval: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let opt = Opt::from_args();

    let state = AppState::new();

    let store = state.store.clone();
    let reconcile_interval = Duration::from_secs(opt.reconcile_interval);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(reconcile_interval);
        loop {
            interval.tick().await;
            store.reconcile().await;
        }
    });

    let app = app(state, Duration::from_secs(opt.request_timeout));

    tracing::info!("listening on {}", opt.bind);
    axum::Server::bind(&opt.bind)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
