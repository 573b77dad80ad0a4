use crate::ScrapeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Errors surfaced to API callers
#[derive(Debug)]
pub enum ApiError {
    /// The `url` query parameter was missing or empty
    MissingUrl,

    /// The scrape itself failed
    Scrape(ScrapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUrl => StatusCode::BAD_REQUEST,
            Self::Scrape(err) => match err {
                ScrapeError::Format(_) => StatusCode::BAD_REQUEST,
                ScrapeError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ScrapeError::Transport { .. }
                | ScrapeError::Protocol { .. }
                | ScrapeError::ChallengeFailed { .. }
                | ScrapeError::EmptyPage { .. } => StatusCode::BAD_GATEWAY,
                ScrapeError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                ScrapeError::Config(_) | ScrapeError::Io(_) | ScrapeError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn message(&self) -> String {
        match self {
            Self::MissingUrl => "Missing 'url' query parameter".to_string(),
            Self::Scrape(err) => err.to_string(),
        }
    }
}

impl From<ScrapeError> for ApiError {
    fn from(err: ScrapeError) -> Self {
        Self::Scrape(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.message());
        }
        let body = Json(json!({ "error": self.message() }));
        (status, body).into_response()
    }
}
