//! REST surface for registering and inspecting targets.
//!
//! # Routes
//! ```text
//! GET   /health                        liveness
//! POST  /urls                          register (upsert by URL)
//! GET   /urls                          list
//! PATCH /urls/{id}                     update thresholds
//! GET   /checks?url_id=&limit=         recent observations, newest first
//! GET   /status                        newest observation per target
//! ```
//!
//! `/targets` and `/targets/{id}` are accepted as aliases of the `/urls` routes.
//!
//! # Design Decisions
//! - Handlers only talk to the store; the runner sees new targets on its next pass
//! - Store errors map to HTTP statuses in `error.rs`
//! - CORS admits the configured dashboard origins only

pub mod error;
pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ApiConfig;
use crate::store::Store;

pub use error::ApiError;

/// Shared state of every handler.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn Store>,
    /// Slow threshold for targets registered without one.
    pub default_slow_ms: u64,
}

/// Build the router with CORS, tracing and request timeout layers.
#[allow(deprecated)]
pub fn router(state: ApiState, config: &ApiConfig) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/urls", get(handlers::list_targets).post(handlers::create_target))
        .route("/urls/{id}", patch(handlers::update_target))
        .route("/targets", get(handlers::list_targets).post(handlers::create_target))
        .route("/targets/{id}", patch(handlers::update_target))
        .route("/checks", get(handlers::recent_checks))
        .route("/status", get(handlers::latest_status))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .expose_headers([header::CONTENT_LENGTH])
        .max_age(Duration::from_secs(12 * 60 * 60))
}

/// Serve `router` on `listener` until `shutdown` fires.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!(address = %addr, "API server starting");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
        })
        .await?;

    tracing::info!("API server stopped");
    Ok(())
}
