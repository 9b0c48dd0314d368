//! HTTP error responses for web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::adapters::pages::{Page, nav};
use crate::domain::error::DashboardError;

use super::templates::{BasePage, ErrorTemplate};

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    fn fragment(&self) -> String {
        let template = ErrorTemplate {
            message: &self.message,
            status: self.status.as_u16(),
        };
        template.render().unwrap_or_else(|_| self.message.clone())
    }

    /// Error fragment for htmx swaps, or the fragment inside the full layout.
    pub fn into_page(self, htmx: bool) -> Response {
        let content = self.fragment();
        if htmx {
            return (self.status, Html(content)).into_response();
        }
        let nav = nav(Page::Dashboard, "");
        let page = BasePage {
            title: "Error",
            nav: &nav,
            sidebar: "",
            content: &content,
        };
        match page.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, Html(content)).into_response(),
        }
    }
}

pub fn status_from_error(err: &DashboardError) -> StatusCode {
    match err {
        DashboardError::InvalidFilter { .. } => StatusCode::BAD_REQUEST,
        DashboardError::MissingInput { .. }
        | DashboardError::Csv { .. }
        | DashboardError::MissingColumn { .. }
        | DashboardError::EmptyDataset => StatusCode::SERVICE_UNAVAILABLE,
        DashboardError::ConfigParse { .. }
        | DashboardError::ConfigMissing { .. }
        | DashboardError::ConfigInvalid { .. }
        | DashboardError::Render { .. }
        | DashboardError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<DashboardError> for WebError {
    fn from(err: DashboardError) -> Self {
        let status = status_from_error(&err);
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let content = self.fragment();
        (self.status, Html(content)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn filter_errors_are_client_errors() {
        let err: WebError = DashboardError::invalid_filter("start", "bad date").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert!(err.message.contains("start"));
    }

    #[test]
    fn data_errors_are_unavailable() {
        let err: WebError = DashboardError::MissingInput {
            path: PathBuf::from("trades.csv"),
        }
        .into();
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_from_error(&DashboardError::EmptyDataset),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn config_errors_are_server_errors() {
        let err = DashboardError::ConfigMissing {
            section: "data".into(),
            key: "trades_csv".into(),
        };
        assert_eq!(status_from_error(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn full_page_error_has_layout() {
        let response = WebError::not_found("Page not found").into_page(false);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
