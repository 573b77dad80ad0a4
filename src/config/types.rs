use serde::Deserialize;

/// Main configuration structure for Threadgrab
///
/// Every section falls back to its defaults, so an empty file is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on
    #[serde(rename = "bind-address", default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

/// Page and comment fetching configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// User agent sent with every page and comment request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL of the comment listing service; `<endpoint>/<post>.json` is fetched
    #[serde(rename = "comments-endpoint", default = "default_comments_endpoint")]
    pub comments_endpoint: String,

    /// Per-request timeout for page and comment fetches (seconds)
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            comments_endpoint: default_comments_endpoint(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Challenge-solving service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SolverConfig {
    /// Base URL of the solving service API
    #[serde(rename = "api-base", default = "default_api_base")]
    pub api_base: String,

    /// Account key sent as `clientKey`; may also come from `CAPSOLVER_API_KEY`
    #[serde(rename = "client-key", default)]
    pub client_key: Option<String>,

    /// Delay between polls while a task is pending (milliseconds)
    #[serde(rename = "poll-interval", default = "default_poll_interval")]
    pub poll_interval: u64,

    /// First retry delay after a transport failure (milliseconds)
    #[serde(rename = "initial-backoff", default = "default_initial_backoff")]
    pub initial_backoff: u64,

    /// Upper bound on the retry delay (milliseconds)
    #[serde(rename = "max-backoff", default = "default_max_backoff")]
    pub max_backoff: u64,

    /// Wall-clock budget for resolving one task (seconds)
    #[serde(rename = "timeout", default = "default_solver_timeout")]
    pub timeout: u64,

    /// Consecutive undecodable poll responses tolerated before aborting
    #[serde(
        rename = "max-protocol-errors",
        default = "default_max_protocol_errors"
    )]
    pub max_protocol_errors: u32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            client_key: None,
            poll_interval: default_poll_interval(),
            initial_backoff: default_initial_backoff(),
            max_backoff: default_max_backoff(),
            timeout: default_solver_timeout(),
            max_protocol_errors: default_max_protocol_errors(),
        }
    }
}

/// Result persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Whether each scrape result is written to disk
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path of the JSON file holding the latest result
    #[serde(rename = "result-path", default = "default_result_path")]
    pub result_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            result_path: default_result_path(),
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_comments_endpoint() -> String {
    "https://www.reddit.com/comments".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_api_base() -> String {
    "https://api.capsolver.com".to_string()
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_initial_backoff() -> u64 {
    1000
}

fn default_max_backoff() -> u64 {
    10_000
}

fn default_solver_timeout() -> u64 {
    120
}

fn default_max_protocol_errors() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_result_path() -> String {
    "scrape_results.json".to_string()
}
