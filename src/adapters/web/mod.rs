//! Web server adapter.
//!
//! Axum router with an HTMX frontend over the cached dataset. Every page takes
//! the filter parameters in its query string and re-aggregates per request.

mod error;
mod handlers;
mod templates;

pub use error::WebError;
pub use handlers::*;
pub use templates::*;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::adapters::pages::Page;
use crate::domain::cache::DatasetCache;
use crate::domain::config::DashboardConfig;
use crate::domain::error::DashboardError;

pub struct AppState {
    pub cache: Arc<DatasetCache>,
    pub config: Arc<DashboardConfig>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(Page::Dashboard.path(), get(handlers::dashboard))
        .route(Page::Analytics.path(), get(handlers::analytics))
        .route(Page::Risk.path(), get(handlers::risk))
        .route(Page::DeepDive.path(), get(handlers::deep_dive))
        .route("/deep-dive/export.csv", get(handlers::export_csv))
        .route(Page::Summary.path(), get(handlers::summary))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `listen` and serve until the process is stopped.
pub async fn serve(state: AppState, listen: &str) -> Result<(), DashboardError> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(listen).await?;
    tracing::info!(addr = %listener.local_addr()?, "dashboard listening");
    axum::serve(listener, router).await?;
    Ok(())
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
