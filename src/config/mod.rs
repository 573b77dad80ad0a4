//! Configuration module for Threadgrab
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use threadgrab::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("threadgrab.toml")).unwrap();
//! println!("Listening on {}", config.server.bind_address);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, OutputConfig, ScraperConfig, ServerConfig, SolverConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, CLIENT_KEY_ENV,
};
pub use validation::validate;
