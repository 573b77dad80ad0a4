//! Scrape pipeline
//!
//! This module contains the per-request extraction logic, including:
//! - HTTP page fetching
//! - Challenge detection and heading extraction
//! - Comment listing retrieval and flattening
//! - Overall request orchestration

mod comments;
mod fetcher;
mod orchestrator;
mod parser;

pub use comments::{extract_post_id, parse_listing, CommentFetcher, MAX_COMMENTS};
pub use fetcher::{build_http_client, fetch_page, FetchedPage};
pub use orchestrator::{Orchestrator, ScrapeRequest};
pub use parser::{detect_challenge, extract_heading, parse_page, ChallengeDetection, ParsedPage};
