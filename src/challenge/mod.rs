//! Challenge resolution
//!
//! Submitting reCAPTCHA tasks to an external solving service and polling
//! them under a bounded, cancellable retry policy.

mod policy;
mod solver;
mod task;

pub use policy::PollPolicy;
pub use solver::{CapSolverClient, CaptchaSolver};
pub use task::{ChallengeResolution, ChallengeTask, TaskStatus, RECAPTCHA_V2_PROXYLESS};
