use axum::routing::get;
use axum::Router;
use clap::Parser;
use fieldline_daemon::{api, config::DaemonConfig, fixtures, store::MemoryStore};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "fieldline-daemon", version, about = "Timeline gateway for fieldline service requests")]
struct Cli {
    /// Where the HTTP API will listen, e.g. 127.0.0.1:8080
    #[arg(long, default_value = "127.0.0.1:8080")]
    listen: String,

    /// Seed canned fixture timelines on startup.
    #[arg(long, default_value_t = false)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = DaemonConfig {
        listen: cli.listen.clone(),
        mock: cli.mock,
    };

    info!("starting daemon with config: {:?}", config);

    let store = Arc::new(MemoryStore::new());
    if config.mock {
        fixtures::seed(store.as_ref())?;
    }

    let state = api::AppState::new(store, config);

    let app = Router::new()
        .route(
            "/v1/requests/{request_id}/timeline",
            get(api::get_timeline).post(api::append_event),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr: SocketAddr = cli.listen.parse()?;
    info!("listening on http://{}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    info!("shutdown requested");
}
