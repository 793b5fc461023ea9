//! HTTP server for deskd.

use crate::routes;
use crate::store::Store;
use crate::webhook::WebhookValidator;
use anyhow::Result;
use axum::Router;
use desk_common::DeskConfig;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: Store,
    pub config: DeskConfig,
    pub validator: WebhookValidator,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Store, config: DeskConfig) -> Self {
        let validator = WebhookValidator::from_config(&config.webhook);
        Self {
            store,
            config,
            validator,
            start_time: Instant::now(),
        }
    }
}

/// Assemble the router; split out so tests can drive it in-process.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::list_routes())
        .merge(routes::dashboard_routes())
        .merge(routes::search_routes())
        .merge(routes::webhook_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until shutdown.
pub async fn run(state: AppState) -> Result<()> {
    let addr = state.config.server.bind_addr.clone();
    let state = Arc::new(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}");

    axum::serve(listener, app(state)).await?;
    Ok(())
}
