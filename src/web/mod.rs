//! Web form: upload a season CSV and get title odds back as HTML.

pub mod page;
pub mod routes;

use crate::utils::error::Result;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;

pub use routes::{AppState, WebError, WebState};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/predict", post(routes::predict))
        .route("/health", get(routes::health))
        .with_state(state)
}

/// Serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web form listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
