use crate::output::ScrapeResult;
use crate::pipeline::{Orchestrator, ScrapeRequest};
use crate::server::error::ApiError;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
pub struct ScrapeQuery {
    pub url: Option<String>,
}

pub async fn home() -> &'static str {
    "Welcome to the Threadgrab scraping server!"
}

pub async fn health() -> &'static str {
    "OK"
}

/// `GET /scrape?url=<target>`
///
/// If the client disconnects, axum drops this future and the drop guard
/// cancels any challenge poll still in flight.
pub async fn scrape(
    State(orchestrator): State<Arc<Orchestrator>>,
    Query(query): Query<ScrapeQuery>,
) -> Result<Json<ScrapeResult>, ApiError> {
    let url = query
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or(ApiError::MissingUrl)?;
    let request = ScrapeRequest::new(url)?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let result = orchestrator.scrape(&request, &cancel).await?;
    Ok(Json(result))
}
