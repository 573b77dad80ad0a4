//! Client for the CapSolver task API
//!
//! Two calls are used: `createTask` to submit a proxyless reCAPTCHA v2 task
//! and `getTaskResult` to poll it. Both take JSON bodies authenticated by the
//! account's `clientKey`.

use crate::challenge::policy::PollPolicy;
use crate::challenge::task::{ChallengeResolution, ChallengeTask, TaskStatus, RECAPTCHA_V2_PROXYLESS};
use crate::config::SolverConfig;
use crate::{ConfigError, ScrapeError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Ceiling applied when the configured wait cannot be represented
const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolves visual challenges through an external service
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Submits a solve task for the challenge found on `page_url`
    async fn submit_task(&self, page_url: &str) -> Result<ChallengeTask, ScrapeError>;

    /// Waits until the task is ready and returns its resolution token
    async fn await_resolution(
        &self,
        task: &ChallengeTask,
        cancel: &CancellationToken,
    ) -> Result<String, ScrapeError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskRequest<'a> {
    client_key: &'a str,
    task: TaskPayload<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskPayload<'a> {
    #[serde(rename = "type")]
    task_type: &'a str,
    #[serde(rename = "websiteURL")]
    website_url: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultRequest<'a> {
    client_key: &'a str,
    task_id: &'a str,
}

/// Error fields shared by every service response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceError {
    #[serde(default)]
    error_id: i64,
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ServiceError {
    /// Returns a description when the service reported an error
    fn message(&self) -> Option<String> {
        let detail = [&self.error_code, &self.error_description, &self.error]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .cloned()
            .collect::<Vec<_>>();

        if self.error_id != 0 || !detail.is_empty() {
            if detail.is_empty() {
                Some(format!("errorId {}", self.error_id))
            } else {
                Some(detail.join(": "))
            }
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTaskResponse {
    #[serde(flatten)]
    error: ServiceError,
    #[serde(default)]
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TaskResultResponse {
    #[serde(flatten)]
    error: ServiceError,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    solution: Option<Solution>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Solution {
    #[serde(default)]
    g_recaptcha_response: Option<String>,
}

/// CapSolver implementation of [`CaptchaSolver`]
#[derive(Debug, Clone)]
pub struct CapSolverClient {
    client: Client,
    api_base: String,
    client_key: String,
    policy: PollPolicy,
}

impl CapSolverClient {
    /// Creates a client from configuration
    ///
    /// # Returns
    ///
    /// * `Ok(CapSolverClient)` - Client ready to submit tasks
    /// * `Err(ConfigError::MissingCredential)` - No client key configured
    pub fn new(config: &SolverConfig, client: Client) -> Result<Self, ConfigError> {
        let client_key = config
            .client_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                ConfigError::MissingCredential(format!(
                    "no solver client key configured (set solver.client-key or {})",
                    crate::config::CLIENT_KEY_ENV
                ))
            })?
            .to_string();

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client_key,
            policy: PollPolicy::from_config(config),
        })
    }

    /// Replaces the polling policy
    pub fn with_policy(mut self, policy: PollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    /// Sends a JSON request and decodes the JSON reply
    ///
    /// The service answers errors with non-2xx statuses and a JSON error body,
    /// so the body is decoded regardless of status. An undecodable body on a
    /// 5xx reply is a gateway fault and counts as a transport failure.
    async fn call<B, R>(&self, url: &str, body: &B) -> Result<R, ScrapeError>
    where
        B: Serialize + ?Sized,
        R: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ScrapeError::transport(url, e))?;

        serde_json::from_str(&text).map_err(|e| {
            let message = format!("HTTP {}: undecodable body: {}", status, e);
            if status.is_server_error() {
                ScrapeError::transport(url, message)
            } else {
                ScrapeError::protocol(url, message)
            }
        })
    }

    /// Polls the task once and classifies the reply
    pub async fn poll_once(&self, task: &ChallengeTask) -> Result<ChallengeResolution, ScrapeError> {
        let url = self.endpoint("getTaskResult");
        let request = TaskResultRequest {
            client_key: &self.client_key,
            task_id: &task.task_id,
        };

        let reply: TaskResultResponse = self.call(&url, &request).await?;

        if let Some(message) = reply.error.message() {
            return Ok(ChallengeResolution::Failed { reason: message });
        }

        let status = reply.status.as_deref().unwrap_or_default();
        match TaskStatus::from_api_string(status) {
            Some(TaskStatus::Ready) => {
                let token = reply
                    .solution
                    .and_then(|s| s.g_recaptcha_response)
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| {
                        ScrapeError::protocol(&url, "task reported ready without a token")
                    })?;
                Ok(ChallengeResolution::Ready { token })
            }
            Some(TaskStatus::Failed) => Ok(ChallengeResolution::Failed {
                reason: "service reported status failed".to_string(),
            }),
            Some(TaskStatus::Created) | Some(TaskStatus::Pending) => {
                Ok(ChallengeResolution::Pending)
            }
            None => Err(ScrapeError::protocol(
                &url,
                format!("unknown task status '{}'", status),
            )),
        }
    }
}

#[async_trait]
impl CaptchaSolver for CapSolverClient {
    async fn submit_task(&self, page_url: &str) -> Result<ChallengeTask, ScrapeError> {
        let url = self.endpoint("createTask");
        let request = CreateTaskRequest {
            client_key: &self.client_key,
            task: TaskPayload {
                task_type: RECAPTCHA_V2_PROXYLESS,
                website_url: page_url,
            },
        };

        tracing::debug!("Submitting challenge task for {}", page_url);
        let reply: CreateTaskResponse = self.call(&url, &request).await?;

        if let Some(message) = reply.error.message() {
            return Err(ScrapeError::protocol(&url, message));
        }

        let task_id = reply
            .task_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ScrapeError::protocol(&url, "response carried no taskId"))?;

        tracing::info!("Challenge task {} created for {}", task_id, page_url);
        Ok(ChallengeTask::new(task_id, page_url))
    }

    async fn await_resolution(
        &self,
        task: &ChallengeTask,
        cancel: &CancellationToken,
    ) -> Result<String, ScrapeError> {
        let started = Instant::now();
        let deadline = started
            .checked_add(self.policy.timeout)
            .unwrap_or_else(|| started + MAX_WAIT);
        let timed_out = || ScrapeError::Timeout {
            task_id: task.task_id.clone(),
            elapsed_secs: started.elapsed().as_secs(),
        };
        let mut transport_failures = 0u32;
        let mut protocol_errors = 0u32;
        let mut polls = 0u32;

        loop {
            if Instant::now() >= deadline {
                return Err(timed_out());
            }

            polls += 1;
            let outcome = tokio::select! {
                _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                outcome = tokio::time::timeout_at(deadline, self.poll_once(task)) => {
                    outcome.map_err(|_| timed_out())?
                }
            };

            let delay = match outcome {
                Ok(ChallengeResolution::Ready { token }) => {
                    tracing::info!("Challenge task {} ready after {} polls", task.task_id, polls);
                    return Ok(token);
                }
                Ok(ChallengeResolution::Failed { reason }) => {
                    return Err(ScrapeError::ChallengeFailed {
                        task_id: task.task_id.clone(),
                        message: reason,
                    });
                }
                Ok(ChallengeResolution::Pending) => {
                    transport_failures = 0;
                    protocol_errors = 0;
                    tracing::debug!("Challenge task {} still pending", task.task_id);
                    self.policy.poll_interval
                }
                Err(e) if e.is_transport() => {
                    transport_failures += 1;
                    let backoff = self.policy.calculate_backoff(transport_failures);
                    tracing::warn!(
                        "Poll {} for task {} failed ({}), retrying in {:?}",
                        polls,
                        task.task_id,
                        e,
                        backoff
                    );
                    backoff
                }
                Err(e) if e.is_protocol() => {
                    protocol_errors += 1;
                    if !self.policy.tolerates_protocol_errors(protocol_errors) {
                        tracing::error!(
                            "Giving up on task {} after {} undecodable replies",
                            task.task_id,
                            protocol_errors
                        );
                        return Err(e);
                    }
                    tracing::warn!("Poll {} for task {} undecodable: {}", polls, task.task_id, e);
                    self.policy.poll_interval
                }
                Err(e) => return Err(e),
            };

            let wake = Instant::now()
                .checked_add(delay)
                .map_or(deadline, |at| at.min(deadline));
            tokio::select! {
                _ = cancel.cancelled() => return Err(ScrapeError::Cancelled),
                _ = tokio::time::sleep_until(wake) => {}
            }
        }
    }
}
