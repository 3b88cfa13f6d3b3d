//! Bounded retry-with-backoff transport for setup-time calls to the provider admin API.
//!
//! Provider operations (exchange, userinfo, introspection, refresh) never go through
//! this client; they fail fast and leave retry decisions to the caller. Collaborators
//! that talk to the provider while the process starts (identity repositories, schema
//! lookups) share one [`RetryingHttpClient`] so every request they issue gets the same
//! attempt budget and backoff cap.

// crates.io
use rand::Rng;
use reqwest::{Request, Response, StatusCode};
// self
use crate::{_prelude::*, error::TransportError, http, obs};

/// Retry budget and backoff bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
	/// Retries after the first attempt.
	pub max_retries: u32,
	/// Backoff before the first retry.
	pub min_backoff: StdDuration,
	/// Upper bound for any single backoff.
	pub max_backoff: StdDuration,
}
impl RetryPolicy {
	/// Total attempts, including the first one.
	pub fn max_attempts(&self) -> u32 {
		self.max_retries.saturating_add(1)
	}

	/// Exponential backoff before retry number `retry` (zero-based), capped at
	/// [`max_backoff`](Self::max_backoff), without jitter.
	pub fn backoff(&self, retry: u32) -> StdDuration {
		let factor = 2_u32.checked_pow(retry).unwrap_or(u32::MAX);

		self.min_backoff.checked_mul(factor).unwrap_or(self.max_backoff).min(self.max_backoff)
	}

	/// [`backoff`](Self::backoff) scaled by a random factor in `[0.5, 1.0]`.
	pub fn jittered_backoff(&self, retry: u32) -> StdDuration {
		let factor = rand::rng().random_range(0.5..=1.0);

		self.backoff(retry).mul_f64(factor)
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_retries: 10,
			min_backoff: StdDuration::from_secs(1),
			max_backoff: StdDuration::from_secs(60),
		}
	}
}

/// HTTP client that retries connection failures, timeouts, `429`, and `5xx` responses.
#[derive(Clone, Debug)]
pub struct RetryingHttpClient {
	client: ReqwestClient,
	policy: RetryPolicy,
}
impl RetryingHttpClient {
	/// Wraps `client` with `policy`.
	pub fn new(client: ReqwestClient, policy: RetryPolicy) -> Self {
		Self { client, policy }
	}

	/// Active retry policy.
	pub fn policy(&self) -> &RetryPolicy {
		&self.policy
	}

	/// Underlying reqwest client, for building requests.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}

	/// Executes `request`, retrying within the policy budget.
	///
	/// Once the budget is spent on retryable failures, statuses and transport errors alike
	/// end in [`TransportError::RetriesExhausted`].
	///
	/// Requests with streaming bodies cannot be cloned and get a single attempt. A
	/// `Retry-After` hint replaces the computed backoff when it is shorter than the cap.
	pub async fn execute(&self, request: Request) -> Result<Response> {
		let url = request.url().to_string();
		let max_attempts = self.policy.max_attempts();
		let mut pending = Some(request);
		let mut last_status = None;
		let mut attempt = 0;

		while let Some(current) = pending.take() {
			attempt += 1;

			let retry_copy = if attempt < max_attempts { current.try_clone() } else { None };
			let can_retry = retry_copy.is_some();
			let delay = match self.client.execute(current).await {
				Ok(response) if is_retryable_status(response.status()) && can_retry => {
					last_status = Some(response.status().as_u16());

					let hinted = http::parse_retry_after(response.headers())
						.and_then(|hint| StdDuration::try_from(hint).ok());

					retry_delay(&self.policy, attempt, hinted)
				},
				Ok(response) if is_retryable_status(response.status()) => {
					last_status = Some(response.status().as_u16());

					break;
				},
				Ok(response) => return Ok(response),
				Err(err) if is_retryable_error(&err) && can_retry => {
					last_status = err.status().map(|status| status.as_u16());

					retry_delay(&self.policy, attempt, None)
				},
				Err(err) if is_retryable_error(&err) => {
					last_status = err.status().map(|status| status.as_u16());

					break;
				},
				Err(err) => return Err(TransportError::network("admin api", err).into()),
			};

			obs::record_retry(&url, attempt, delay);
			tokio::time::sleep(delay).await;

			pending = retry_copy;
		}

		Err(TransportError::RetriesExhausted { url, attempts: attempt, last_status }.into())
	}
}

fn retry_delay(policy: &RetryPolicy, attempt: u32, hinted: Option<StdDuration>) -> StdDuration {
	let computed = policy.jittered_backoff(attempt - 1);

	match hinted {
		Some(hint) if hint <= policy.max_backoff => hint,
		_ => computed,
	}
}

fn is_retryable_status(status: StatusCode) -> bool {
	status == StatusCode::TOO_MANY_REQUESTS
		|| (status.is_server_error() && status != StatusCode::NOT_IMPLEMENTED)
}

fn is_retryable_error(err: &ReqwestError) -> bool {
	err.is_connect() || err.is_timeout()
}
