use crate::config::types::{Config, OutputConfig, ScraperConfig, ServerConfig, SolverConfig};
use crate::ConfigError;
use std::net::SocketAddr;
use url::Url;

/// Longest accepted wait for a single challenge task, in seconds
pub const MAX_SOLVER_TIMEOUT_SECS: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_server_config(&config.server)?;
    validate_scraper_config(&config.scraper)?;
    validate_solver_config(&config.solver)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_server_config(config: &ServerConfig) -> Result<(), ConfigError> {
    config.bind_address.parse::<SocketAddr>().map_err(|e| {
        ConfigError::Validation(format!(
            "bind_address '{}' is not a socket address: {}",
            config.bind_address, e
        ))
    })?;
    Ok(())
}

fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    validate_http_url("comments_endpoint", &config.comments_endpoint)?;

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout must be >= 1s, got {}s",
            config.request_timeout
        )));
    }

    Ok(())
}

fn validate_solver_config(config: &SolverConfig) -> Result<(), ConfigError> {
    validate_http_url("api_base", &config.api_base)?;

    if config.poll_interval < 1 {
        return Err(ConfigError::Validation(format!(
            "poll_interval must be >= 1ms, got {}ms",
            config.poll_interval
        )));
    }

    if config.initial_backoff < 1 {
        return Err(ConfigError::Validation(format!(
            "initial_backoff must be >= 1ms, got {}ms",
            config.initial_backoff
        )));
    }

    if config.max_backoff < config.initial_backoff {
        return Err(ConfigError::Validation(format!(
            "max_backoff ({}ms) must not be below initial_backoff ({}ms)",
            config.max_backoff, config.initial_backoff
        )));
    }

    if config.timeout < 1 || config.timeout > MAX_SOLVER_TIMEOUT_SECS {
        return Err(ConfigError::Validation(format!(
            "solver timeout must be between 1s and {}s, got {}s",
            MAX_SOLVER_TIMEOUT_SECS, config.timeout
        )));
    }

    if config.max_protocol_errors < 1 {
        return Err(ConfigError::Validation(
            "max_protocol_errors must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.enabled && config.result_path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "result_path cannot be empty while output is enabled".to_string(),
        ));
    }
    Ok(())
}

/// Checks that a configured endpoint is an absolute HTTP(S) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} must use http or https, got '{}'",
            field, value
        )));
    }

    Ok(())
}
