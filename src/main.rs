#![warn(clippy::pedantic, clippy::all, clippy::nursery)]
#![allow(clippy::single_match_else)]

use crate::{
    config::RuntimeConfiguration, routes::router, session::postgres_store::PostgresSessionStore,
    state::RollcallState,
};
use std::time::Duration;
use tokio::{net::TcpListener, signal};
use tower_http::{
    compression::CompressionLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[macro_use]
extern crate tracing;

mod config;
mod data;
mod error;
mod maud_conveniences;
mod routes;
mod session;
mod state;

const MAX_BODY_BYTES: usize = 64 * 1024;
const SESSION_CLEANUP_PERIOD: Duration = Duration::from_secs(60 * 60);

async fn shutdown_signal(state: RollcallState) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    warn!("signal received, starting graceful shutdown");
    state.sensible_shutdown().await;
}

#[tokio::main]
async fn main() {
    let dotenv_result = dotenvy::dotenv();

    tracing::subscriber::set_global_default(
        FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .finish(),
    )
    .expect("unable to set tracing subscriber");

    info!("`tracing` online");
    if let Err(e) = dotenv_result {
        warn!(?e, "No .env file loaded, using process environment only");
    }

    let config = RuntimeConfiguration::new().expect("unable to create config");
    let state = RollcallState::new(config.clone())
        .await
        .expect("unable to create state");

    let session_store = PostgresSessionStore::new(state.clone());
    let session_cleanup = session_store.spawn_expired_cleanup(SESSION_CLEANUP_PERIOD);
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(state.config().server_config().secure_cookies())
        .with_expiry(Expiry::OnInactivity(time::Duration::days(5)));

    let app = router()
        .layer(session_layer)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state.clone());

    let server_config = config.server_config();
    let server_ip = server_config.server_ip();
    let listener = TcpListener::bind(server_ip)
        .await
        .expect("unable to listen on server ip");

    info!(?server_ip, "Listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("unable to serve app");

    session_cleanup.abort();
}
