//! Scrape orchestration
//!
//! One request runs strictly in sequence:
//! fetch page -> solve challenge if present -> extract heading ->
//! derive post ID -> fetch comments -> assemble and persist the result.
//!
//! Only the comment fetch degrades gracefully; every other failure aborts
//! the request without a partial result.

use crate::challenge::{CapSolverClient, CaptchaSolver};
use crate::config::Config;
use crate::output::{format_elapsed, JsonFileSink, ResultSink, ScrapeResult};
use crate::pipeline::comments::{extract_post_id, CommentFetcher};
use crate::pipeline::fetcher::{build_http_client, fetch_page, FetchedPage};
use crate::pipeline::parser::{parse_page, ChallengeDetection};
use crate::{ConfigError, ScrapeError};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Caller-supplied scrape target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    url: String,
}

impl ScrapeRequest {
    /// Creates a request, rejecting an empty URL
    pub fn new(url: impl Into<String>) -> Result<Self, ScrapeError> {
        let url = url.into().trim().to_string();
        if url.is_empty() {
            return Err(ScrapeError::format("target URL cannot be empty"));
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Drives the fetch, challenge, and extraction steps for each request
///
/// The orchestrator holds no per-request state and is shared across
/// concurrent requests behind an `Arc`.
#[derive(Clone)]
pub struct Orchestrator {
    client: Client,
    comments: CommentFetcher,
    solver: Option<Arc<dyn CaptchaSolver>>,
    sink: Option<Arc<dyn ResultSink>>,
}

impl Orchestrator {
    /// Creates an orchestrator without a solver or sink
    pub fn new(client: Client, comments_endpoint: &str) -> Self {
        Self {
            comments: CommentFetcher::new(client.clone(), comments_endpoint),
            client,
            solver: None,
            sink: None,
        }
    }

    /// Builds the full pipeline from configuration
    ///
    /// A missing solver credential is reported once here; the orchestrator
    /// still serves pages without challenges and rejects challenged pages
    /// with a configuration error.
    pub fn from_config(config: &Config) -> Result<Self, ScrapeError> {
        let client = build_http_client(&config.scraper)?;

        let mut orchestrator = Self::new(client.clone(), &config.scraper.comments_endpoint);

        match CapSolverClient::new(&config.solver, client) {
            Ok(solver) => orchestrator = orchestrator.with_solver(Arc::new(solver)),
            Err(e) => tracing::warn!("Challenge solving disabled: {}", e),
        }

        if config.output.enabled {
            orchestrator =
                orchestrator.with_sink(Arc::new(JsonFileSink::new(&config.output.result_path)));
        }

        Ok(orchestrator)
    }

    pub fn with_solver(mut self, solver: Arc<dyn CaptchaSolver>) -> Self {
        self.solver = Some(solver);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn has_solver(&self) -> bool {
        self.solver.is_some()
    }

    /// Runs one scrape end to end
    ///
    /// `cancel` is honored while waiting on a challenge task.
    pub async fn scrape(
        &self,
        request: &ScrapeRequest,
        cancel: &CancellationToken,
    ) -> Result<ScrapeResult, ScrapeError> {
        let url = request.url();
        tracing::info!("Scraping {}", url);
        let started = Instant::now();

        let page = fetch_page(&self.client, url).await?;
        let parsed = parse_page(&page.body);

        let challenge_site_key = match &parsed.challenge {
            ChallengeDetection::Present { site_key } => {
                self.resolve_challenge(&page, site_key, cancel).await?;
                Some(site_key.clone())
            }
            ChallengeDetection::NotPresent if !page.is_success() => {
                return Err(ScrapeError::transport(url, format!("HTTP {}", page.status)));
            }
            ChallengeDetection::NotPresent => None,
        };

        let post_id = extract_post_id(url)?;

        let comments = match self.comments.fetch_comments(&post_id).await {
            Ok(comments) => comments,
            Err(e) => {
                tracing::warn!("Error fetching comments for post {}: {}", post_id, e);
                Vec::new()
            }
        };

        let result = ScrapeResult {
            url: url.to_string(),
            elapsed: format_elapsed(started.elapsed()),
            heading: parsed.heading,
            comments,
            html: page.body.replace('\n', ""),
            challenge_site_key,
            scraped_at: Utc::now(),
        };

        if let Some(sink) = &self.sink {
            if let Err(e) = sink.persist(&result).await {
                tracing::warn!("Failed to persist result for {}: {}", url, e);
            }
        }

        tracing::info!(
            "Scraped {} in {} ({} comments)",
            url,
            result.elapsed,
            result.comments.len()
        );

        Ok(result)
    }

    /// Submits and awaits a challenge task for the page
    ///
    /// The resolution token is not replayed against the page; extraction
    /// continues on the markup already fetched.
    async fn resolve_challenge(
        &self,
        page: &FetchedPage,
        site_key: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ScrapeError> {
        let solver = self.solver.as_ref().ok_or_else(|| {
            ConfigError::MissingCredential(format!(
                "page {} requires solving challenge {} but no solver is configured",
                page.url, site_key
            ))
        })?;

        tracing::info!("Challenge {} detected on {}", site_key, page.url);
        let task = solver.submit_task(&page.url).await?;
        let token = solver.await_resolution(&task, cancel).await?;
        tracing::debug!(
            "Challenge task {} resolved ({} byte token)",
            task.task_id,
            token.len()
        );

        Ok(())
    }
}
