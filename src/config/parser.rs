use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the solving-service account key
pub const CLIENT_KEY_ENV: &str = "CAPSOLVER_API_KEY";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use threadgrab::config::load_config;
///
/// let config = load_config(Path::new("threadgrab.toml")).unwrap();
/// println!("Result path: {}", config.output.result_path);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so two deployments can be compared at a glance.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Fills in settings that may come from the process environment
///
/// A non-empty `CAPSOLVER_API_KEY` replaces the configured client key.
pub fn apply_env_overrides(config: &mut Config) {
    apply_client_key(config, std::env::var(CLIENT_KEY_ENV).ok());
}

fn apply_client_key(config: &mut Config, value: Option<String>) {
    if let Some(key) = value.map(|v| v.trim().to_string()) {
        if !key.is_empty() {
            config.solver.client_key = Some(key);
        }
    }
}
