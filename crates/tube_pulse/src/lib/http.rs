//! Shared HTTP plumbing for the collaborator clients.
//!
//! Transient failures are retried here, inside each client, with
//! exponential backoff; the orchestrator itself never retries a stage.

use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use reqwest_retry_after::RetryAfterMiddleware;

pub const MAX_RETRIES: u32 = 3;

/// A client that honours `Retry-After` and retries transient errors
pub fn retrying_client() -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(MAX_RETRIES);

    ClientBuilder::new(reqwest::Client::new())
        .with(RetryAfterMiddleware::new())
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

pub fn is_timeout(err: &reqwest_middleware::Error) -> bool {
    matches!(err, reqwest_middleware::Error::Reqwest(e) if e.is_timeout())
}

/// Drains a failed response into `(status, body)` for error reporting
pub async fn error_parts(resp: reqwest::Response) -> (u16, String) {
    let status = resp.status().as_u16();
    let message = resp.text().await.unwrap_or_default();
    (status, message)
}
