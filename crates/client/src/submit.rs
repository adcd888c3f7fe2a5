//! Update submission — the companion request/response surface.
//!
//! Cell-map updates do not ride the event channel; they are posted to
//! the session service and acknowledged (or dropped) independently. The
//! core treats this as fire-and-forget: a failed submission is logged
//! and the local optimistic state kept, self-healing on the next
//! successful broadcast. Callers that want more can wrap any submitter
//! in [`RetryingSubmitter`] with a [`RetryPolicy`].

use std::fmt;
use std::thread;
use std::time::Duration;

use gridcast_protocol::SessionUpdate;

/// Transport for posting a session update outside the event channel.
pub trait UpdateSubmitter {
    fn submit(&mut self, session_id: &str, update: &SessionUpdate) -> Result<(), SubmitError>;
}

/// Error type for update submissions.
#[derive(Debug, Clone)]
pub enum SubmitError {
    /// Network-level failure (connect, timeout, TLS).
    Network(String),
    /// HTTP error with status code.
    Http(u16, String),
    /// The service parsed the request and said no.
    Rejected(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::Network(msg) => write!(f, "network error: {}", msg),
            SubmitError::Http(code, msg) => write!(f, "HTTP {}: {}", code, msg),
            SubmitError::Rejected(msg) => write!(f, "update rejected: {}", msg),
        }
    }
}

impl std::error::Error for SubmitError {}

// ============================================================================
// HTTP submitter
// ============================================================================

/// Blocking HTTP submitter (no async runtime required).
///
/// Posts to `{api_base}/api/session/update/{session_id}`.
#[derive(Clone)]
pub struct HttpSubmitter {
    http: reqwest::blocking::Client,
    api_base: String,
}

impl HttpSubmitter {
    /// Create a submitter for the given service base URL (no trailing
    /// slash, e.g. `http://localhost:5000`).
    pub fn new(api_base: impl Into<String>) -> Self {
        let http = reqwest::blocking::Client::builder()
            .user_agent(format!("gridcast/{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            api_base: api_base.into(),
        }
    }
}

impl UpdateSubmitter for HttpSubmitter {
    fn submit(&mut self, session_id: &str, update: &SessionUpdate) -> Result<(), SubmitError> {
        let url = format!("{}/api/session/update/{}", self.api_base, session_id);
        let resp = self
            .http
            .post(&url)
            .json(update)
            .send()
            .map_err(|e| SubmitError::Network(e.to_string()))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let body = resp.text().unwrap_or_default();
        if status.is_client_error() {
            Err(SubmitError::Rejected(body))
        } else {
            Err(SubmitError::Http(status.as_u16(), body))
        }
    }
}

// ============================================================================
// Retry policy
// ============================================================================

/// How many times to attempt a submission and how long to sleep between
/// attempts. The default is a single attempt (fire-and-forget), the
/// documented behavior of the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never 0.
    pub max_attempts: u32,
    /// Sleep between attempts.
    pub backoff: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retry.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    /// Fixed number of attempts with a constant backoff.
    pub fn fixed(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Wraps any submitter with a retry policy.
pub struct RetryingSubmitter<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSubmitter<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S: UpdateSubmitter> UpdateSubmitter for RetryingSubmitter<S> {
    fn submit(&mut self, session_id: &str, update: &SessionUpdate) -> Result<(), SubmitError> {
        let mut attempt = 1;
        loop {
            match self.inner.submit(session_id, update) {
                Ok(()) => return Ok(()),
                Err(e) if attempt < self.policy.max_attempts => {
                    log::warn!(
                        "Update submission attempt {}/{} failed: {}",
                        attempt,
                        self.policy.max_attempts,
                        e
                    );
                    thread::sleep(self.policy.backoff);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
