//! Threadgrab: a scraping backend for discussion pages
//!
//! This crate fetches a target page, resolves a reCAPTCHA challenge through an
//! external solving service when one blocks the page, extracts the title
//! heading and the first top-level comments of the thread, and serves the
//! result over a small HTTP API.

pub mod challenge;
pub mod config;
pub mod output;
pub mod pipeline;
pub mod server;

use thiserror::Error;

/// Main error type for scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport error for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("Protocol error from {url}: {message}")]
    Protocol { url: String, message: String },

    #[error("Format error: {0}")]
    Format(String),

    #[error("Challenge task {task_id} failed: {message}")]
    ChallengeFailed { task_id: String, message: String },

    #[error("Timed out after {elapsed_secs}s waiting for challenge task {task_id}")]
    Timeout { task_id: String, elapsed_secs: u64 },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Page at {url} returned no content")]
    EmptyPage { url: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// Creates a transport error for an outbound call
    pub fn transport(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a protocol error for a response that could not be decoded
    pub fn protocol(url: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Protocol {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Creates a format error for a decodable input missing required structure
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    /// Returns true for network-level failures that may succeed on retry
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Returns true for responses that arrived but could not be decoded
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Result type alias for scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use challenge::{CapSolverClient, CaptchaSolver, ChallengeResolution, ChallengeTask};
pub use config::Config;
pub use output::{Comment, ScrapeResult};
pub use pipeline::{Orchestrator, ScrapeRequest};
