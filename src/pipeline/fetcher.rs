//! HTTP fetcher implementation
//!
//! This module handles the outbound page requests, including:
//! - Building the shared HTTP client with a browser-like user agent
//! - GET requests for target pages
//! - Error classification into transport failures

use crate::config::ScraperConfig;
use crate::{ConfigError, ScrapeError};
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Raw content retrieved for a target URL
///
/// Non-success responses are kept rather than rejected here: a blocked page
/// often carries the challenge that has to be detected.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: String,

    /// Final URL after redirects
    pub final_url: String,

    /// HTTP status code
    pub status: StatusCode,

    /// Page body content
    pub body: String,
}

impl FetchedPage {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Builds the HTTP client shared by page, comment, and solver requests
///
/// # Example
///
/// ```no_run
/// use threadgrab::config::ScraperConfig;
/// use threadgrab::pipeline::build_http_client;
///
/// let client = build_http_client(&ScraperConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &ScraperConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.request_timeout))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| ConfigError::HttpClient(e.to_string()))
}

/// Fetches a page
///
/// # Returns
///
/// * `Ok(FetchedPage)` - A response with a non-empty body, whatever its status
/// * `Err(ScrapeError::Transport)` - The request or body read failed
/// * `Err(ScrapeError::EmptyPage)` - The response carried no content
pub async fn fetch_page(client: &Client, url: &str) -> Result<FetchedPage, ScrapeError> {
    tracing::debug!("Fetching page {}", url);

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            ScrapeError::transport(url, "request timeout")
        } else if e.is_connect() {
            ScrapeError::transport(url, format!("connection failed: {}", e))
        } else {
            ScrapeError::transport(url, e)
        }
    })?;

    let status = response.status();
    let final_url = response.url().to_string();
    let body = response
        .text()
        .await
        .map_err(|e| ScrapeError::transport(url, format!("failed to read body: {}", e)))?;

    if body.trim().is_empty() {
        return Err(ScrapeError::EmptyPage {
            url: url.to_string(),
        });
    }

    tracing::debug!("Fetched {} ({}, {} bytes)", final_url, status, body.len());

    Ok(FetchedPage {
        url: url.to_string(),
        final_url,
        status,
        body,
    })
}
