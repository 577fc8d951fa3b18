pub mod error;
pub mod handlers;

use crate::core::Classifier;
use crate::utils::error::{EchoError, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

pub const CLASSIFY_PATH: &str = "/classify/v0";
pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<dyn Classifier>,
}

pub fn router(classifier: Arc<dyn Classifier>, max_body_bytes: usize) -> Router {
    let state = AppState { classifier };

    Router::new()
        .route(CLASSIFY_PATH, post(handlers::classify_image))
        .route(HEALTH_PATH, get(handlers::health))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    tracing::info!("🚀 Listening on http://{}", addr);
    tracing::info!("📮 Classify endpoint: POST http://{}{}", addr, CLASSIFY_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| EchoError::ServerError {
            message: e.to_string(),
        })
}

/// Resolves on Ctrl-C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("🛑 Shutdown signal received");
}
