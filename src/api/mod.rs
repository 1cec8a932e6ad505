pub mod routes;

use crate::clock::Clock;
use crate::config::Config;
use crate::db::Database;
use anyhow::{Context, Result};
use axum::Router;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tracing::info;

/// Serves the JSON API until the listener fails. The store handle is opened
/// once by the caller and shared by every request.
pub async fn run_server(
    config: Arc<Config>,
    database: Database,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<()> {
    let port = config.api_port;
    let state = routes::ApiState {
        config,
        store: Arc::new(Mutex::new(database)),
        clock,
    };
    let app: Router = routes::router(state);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind API server: {addr}"))?;

    info!(address = %addr, "SwimLog API server started");

    axum::serve(listener, app)
        .await
        .context("API server failed")?;

    Ok(())
}
