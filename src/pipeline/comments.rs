//! Comment listing retrieval
//!
//! The listing service answers `GET <endpoint>/<post>.json` with a two
//! element array: index 0 describes the post, index 1 holds the comment
//! tree. Only the first [`MAX_COMMENTS`] top-level children are decoded;
//! replies and later children are never inspected.

use crate::output::Comment;
use crate::ScrapeError;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Number of top-level comments kept per thread
pub const MAX_COMMENTS: usize = 2;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    children: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct Thing {
    data: CommentData,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    body: String,
    #[serde(default)]
    depth: Option<u32>,
}

impl From<CommentData> for Comment {
    fn from(data: CommentData) -> Self {
        Self {
            id: data.id,
            body: data.body,
            depth: data.depth,
        }
    }
}

/// Fetches comment listings from the listing service
#[derive(Debug, Clone)]
pub struct CommentFetcher {
    client: Client,
    endpoint: String,
}

impl CommentFetcher {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the listing URL for a post
    pub fn listing_url(&self, post_id: &str) -> String {
        format!("{}/{}.json", self.endpoint, post_id)
    }

    /// Fetches and flattens the comments of a post
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<Comment>)` - Up to [`MAX_COMMENTS`] top-level comments in source order
    /// * `Err(ScrapeError::Transport)` - Network failure or non-success status
    /// * `Err(ScrapeError::Protocol)` - Body is not JSON
    /// * `Err(ScrapeError::Format)` - JSON does not have the listing shape
    pub async fn fetch_comments(&self, post_id: &str) -> Result<Vec<Comment>, ScrapeError> {
        let url = self.listing_url(post_id);
        tracing::debug!("Fetching comments from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ScrapeError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::transport(&url, format!("HTTP {}", status)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(&url, e))?;

        parse_listing(&body, &url)
    }
}

/// Decodes a listing document into the leading top-level comments
pub fn parse_listing(body: &str, source: &str) -> Result<Vec<Comment>, ScrapeError> {
    let document: Value = serde_json::from_str(body)
        .map_err(|e| ScrapeError::protocol(source, format!("listing is not JSON: {}", e)))?;

    let elements = document
        .as_array()
        .ok_or_else(|| ScrapeError::format("comment listing is not an array"))?;

    if elements.len() < 2 {
        return Err(ScrapeError::format(format!(
            "comment listing has {} elements, expected at least 2",
            elements.len()
        )));
    }

    let listing = Listing::deserialize(&elements[1])
        .map_err(|e| ScrapeError::format(format!("comment tree malformed: {}", e)))?;

    listing
        .data
        .children
        .iter()
        .take(MAX_COMMENTS)
        .enumerate()
        .map(|(index, child)| {
            Thing::deserialize(child)
                .map(|thing| Comment::from(thing.data))
                .map_err(|e| ScrapeError::format(format!("comment {} malformed: {}", index, e)))
        })
        .collect()
}

/// Extracts the post identifier following a `comments` path segment
///
/// # Example
///
/// ```
/// use threadgrab::pipeline::extract_post_id;
///
/// let id = extract_post_id("https://www.reddit.com/r/rust/comments/abc123/title/").unwrap();
/// assert_eq!(id, "abc123");
/// ```
pub fn extract_post_id(url: &str) -> Result<String, ScrapeError> {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = path.split('/').collect();

    segments
        .windows(2)
        .find(|pair| pair[0] == "comments" && !pair[1].is_empty())
        .map(|pair| pair[1])
        .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .map(str::to_string)
        .ok_or_else(|| ScrapeError::format(format!("could not extract post ID from URL '{}'", url)))
}
