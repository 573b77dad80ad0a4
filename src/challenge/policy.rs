//! Polling policy for challenge tasks
//!
//! Pending tasks are polled at a fixed interval. Transport failures back off
//! exponentially, undecodable responses are tolerated a bounded number of
//! times in a row, and the whole wait is capped by a wall-clock timeout.

use crate::config::SolverConfig;
use std::time::Duration;

/// Timing and retry limits for awaiting one task
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    /// Delay between polls while the task is pending
    pub poll_interval: Duration,

    /// First delay after a transport failure
    pub initial_backoff: Duration,

    /// Cap on the transport retry delay
    pub max_backoff: Duration,

    /// Growth factor applied per consecutive transport failure
    pub backoff_multiplier: f64,

    /// Budget for the whole wait
    pub timeout: Duration,

    /// Consecutive protocol errors tolerated before giving up
    pub max_protocol_errors: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&SolverConfig::default())
    }
}

impl PollPolicy {
    pub fn from_config(config: &SolverConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(config.poll_interval),
            initial_backoff: Duration::from_millis(config.initial_backoff),
            max_backoff: Duration::from_millis(config.max_backoff),
            backoff_multiplier: 2.0,
            timeout: Duration::from_secs(config.timeout),
            max_protocol_errors: config.max_protocol_errors,
        }
    }

    /// Computes the delay before retrying after `attempt` consecutive
    /// transport failures (1-based)
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let backoff_secs =
            self.initial_backoff.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let capped = backoff_secs.min(self.max_backoff.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Returns true while another protocol error can be tolerated
    pub fn tolerates_protocol_errors(&self, consecutive: u32) -> bool {
        consecutive < self.max_protocol_errors
    }
}
