//! HTTP request handlers for web adapter.

use std::sync::Arc;

use askama::Template;
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use chrono::Local;
use serde::Serialize;

use crate::adapters::csv_adapter::write_export;
use crate::adapters::pages::{Page, PageContext, PageSettings, filter_form, filter_summary, nav};
use crate::domain::explorer::explore;
use crate::domain::filter::TradeFilter;

use super::templates::BasePage;
use super::{AppState, WebError, is_htmx_request};

type Pairs = Query<Vec<(String, String)>>;

fn page_html(
    state: &AppState,
    page: Page,
    pairs: &[(String, String)],
    htmx: bool,
) -> Result<String, WebError> {
    let filter = TradeFilter::from_pairs(pairs)?;
    let settings = PageSettings::from_pairs(pairs, &state.config)?;
    let dataset = state.cache.get()?;
    let ctx = PageContext::new(&dataset, &filter, &settings);
    tracing::debug!(page = page.path(), trades = ctx.trades.len(), htmx, "rendering page");

    let mut fragment = page.fragment(&ctx);
    if htmx {
        fragment.push_str(&filter_summary(&ctx, true));
        return Ok(fragment);
    }
    let nav = nav(page, &ctx.filter_query());
    let sidebar = filter_form(page, &ctx);
    let layout = BasePage {
        title: page.title(),
        nav: &nav,
        sidebar: &sidebar,
        content: &fragment,
    };
    layout.render().map_err(|e| WebError::internal(e.to_string()))
}

fn render_page(state: &AppState, page: Page, headers: &HeaderMap, pairs: &[(String, String)]) -> Response {
    let htmx = is_htmx_request(headers);
    match page_html(state, page, pairs, htmx) {
        Ok(html) => Html(html).into_response(),
        Err(err) => err.into_page(htmx),
    }
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Response {
    render_page(&state, Page::Dashboard, &headers, &pairs)
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Response {
    render_page(&state, Page::Analytics, &headers, &pairs)
}

pub async fn risk(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Response {
    render_page(&state, Page::Risk, &headers, &pairs)
}

pub async fn deep_dive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Response {
    render_page(&state, Page::DeepDive, &headers, &pairs)
}

pub async fn summary(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(pairs): Pairs,
) -> Response {
    render_page(&state, Page::Summary, &headers, &pairs)
}

/// CSV download of the explorer view for the current filter.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(pairs): Pairs,
) -> Result<Response, WebError> {
    let filter = TradeFilter::from_pairs(&pairs)?;
    let settings = PageSettings::from_pairs(&pairs, &state.config)?;
    let dataset = state.cache.get()?;
    let trades = filter.apply(&dataset.trades);
    let view = explore(&trades, &settings.explorer);

    let mut body = Vec::new();
    write_export(&mut body, &view)?;
    let filename = format!("filtered_trades_{}.csv", Local::now().format("%Y%m%d_%H%M%S"));
    tracing::info!(rows = view.len(), %filename, "csv export");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response())
}

#[derive(Serialize)]
pub struct Health {
    pub status: &'static str,
    pub trades: Option<usize>,
}

pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Health>) {
    match state.cache.get() {
        Ok(dataset) => (
            StatusCode::OK,
            Json(Health {
                status: "ok",
                trades: Some(dataset.trades.len()),
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(Health {
                    status: "unavailable",
                    trades: None,
                }),
            )
        }
    }
}

pub async fn not_found(headers: HeaderMap) -> Response {
    WebError::not_found("Page not found").into_page(is_htmx_request(&headers))
}
