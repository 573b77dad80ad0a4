/// Challenge task definitions for tracking a solve request
///
/// A task moves `Created -> Pending -> Ready` on success or ends in `Failed`
/// when the solving service gives up. Only `Pending` is polled again.
use std::fmt;

/// Task type submitted to the solving service
pub const RECAPTCHA_V2_PROXYLESS: &str = "ReCaptchaV2TaskProxyless";

/// Represents the lifecycle state of a challenge task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskStatus {
    /// Task was accepted but not yet polled
    Created,

    /// Service is still working on the task
    Pending,

    /// Service produced a resolution token
    Ready,

    /// Service reported that the task cannot be solved
    Failed,
}

impl TaskStatus {
    /// Returns true if no further polling can change the outcome
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }

    /// Returns true if the task should be polled again
    pub fn should_poll(&self) -> bool {
        matches!(self, Self::Created | Self::Pending)
    }

    /// Converts the status to the wire string used by the solving service
    pub fn to_api_string(&self) -> &'static str {
        match self {
            Self::Created => "idle",
            Self::Pending => "processing",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    /// Parses a status reported by the solving service
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_api_string(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Created),
            "pending" | "processing" => Some(Self::Pending),
            "ready" => Some(Self::Ready),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_api_string())
    }
}

/// A solve request accepted by the solving service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeTask {
    /// Identifier assigned by the service, required for polling
    pub task_id: String,

    /// Page the challenge was found on
    pub website_url: String,

    /// Always [`RECAPTCHA_V2_PROXYLESS`]
    pub task_type: &'static str,
}

impl ChallengeTask {
    pub fn new(task_id: impl Into<String>, website_url: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            website_url: website_url.into(),
            task_type: RECAPTCHA_V2_PROXYLESS,
        }
    }
}

/// Outcome of a single poll
///
/// A token exists only in the `Ready` variant, so a ready resolution without
/// a token cannot be represented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeResolution {
    Pending,
    Ready { token: String },
    Failed { reason: String },
}

impl ChallengeResolution {
    pub fn status(&self) -> TaskStatus {
        match self {
            Self::Pending => TaskStatus::Pending,
            Self::Ready { .. } => TaskStatus::Ready,
            Self::Failed { .. } => TaskStatus::Failed,
        }
    }

    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Ready { token } => Some(token),
            _ => None,
        }
    }
}
