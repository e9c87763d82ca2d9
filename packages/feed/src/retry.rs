//! Bounded retry for the upstream fetch.
//!
//! Sized for a polling loop: a tick that cannot complete quickly is
//! better skipped (the cache serves stale data) than stretched out, so
//! only a couple of attempts are made, with short backoff. Transient
//! transport errors, HTTP 429, and HTTP 5xx are retried; other 4xx
//! statuses are permanent.

use std::time::Duration;

use crate::FeedError;

/// Maximum retry attempts for transient errors. With the 1s/2s backoff
/// and the client's 30s request timeout, a fully failing fetch resolves
/// in well under two minutes.
const MAX_RETRIES: u32 = 2;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// # Errors
///
/// Returns [`FeedError`] if the request fails after all retries, the
/// server returns a non-retryable status, or the body is not JSON.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, FeedError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<FeedError> = None;

    for attempt in 0..=MAX_RETRIES {
        if attempt > 0 {
            let delay = Duration::from_secs(u64::from(attempt));
            log::warn!("  retry {attempt}/{MAX_RETRIES} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < MAX_RETRIES {
                    log::warn!("  transient error: {e}");
                    last_error = Some(FeedError::Http(e));
                    continue;
                }
                return Err(FeedError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                // 429 and 5xx are worth another attempt.
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    if attempt < MAX_RETRIES {
                        log::warn!("  HTTP {status}");
                        last_error = Some(FeedError::UnexpectedResponse {
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    return Err(FeedError::UnexpectedResponse {
                        message: format!("HTTP {status} after {MAX_RETRIES} retries"),
                    });
                }

                // Remaining 4xx are permanent.
                if status.is_client_error() {
                    return Err(FeedError::UnexpectedResponse {
                        message: format!("HTTP {status}"),
                    });
                }

                return Ok(response.json::<serde_json::Value>().await?);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| FeedError::UnexpectedResponse {
        message: "request failed after all retries".to_string(),
    }))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}
