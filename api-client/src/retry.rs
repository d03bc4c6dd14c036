use std::time::{Duration, SystemTime, UNIX_EPOCH};

use http::StatusCode;
use hyperdriver::Body;
use tower::retry::Policy;

use crate::request::try_clone_request;

/// A policy for retrying transient failures with exponential backoff.
///
/// Retries stop once the next delay would reach `max_delay`, so the number of
/// attempts is bounded.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// The initial delay for the backoff
    pub delay: Duration,

    /// The factor to grow the delay by
    pub exponent: u32,

    /// The maximum delay for the backoff
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_millis(500), 2, Duration::from_secs(16))
    }
}

impl Backoff {
    /// Create a new backoff policy.
    pub fn new(delay: Duration, exponent: u32, max_delay: Duration) -> Self {
        Self {
            delay,
            exponent,
            max_delay,
        }
    }

    /// The policy for the next attempt, or `None` when retries are exhausted.
    pub fn increment(&self) -> Option<Self> {
        let delay = self.delay.checked_mul(self.exponent)?;

        if delay >= self.max_delay {
            return None;
        }

        Some(Self {
            delay,
            exponent: self.exponent,
            max_delay: self.max_delay,
        })
    }

    /// Wait for the server's requested delay, then continue as normal.
    pub fn rate_limited(&self, delay: Duration) -> Self {
        Self {
            delay: delay.min(self.max_delay),
            exponent: self.exponent,
            max_delay: self.max_delay,
        }
    }
}

fn retry_after(res: &http::Response<Body>) -> Option<Duration> {
    res.headers()
        .get(http::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

const RATELIMIT_REMAINING: &str = "x-ratelimit-remaining";
const RATELIMIT_RESET: &str = "x-ratelimit-reset";

/// Time until an exhausted primary rate limit resets.
///
/// Github answers `403` with `x-ratelimit-remaining: 0` and the reset instant,
/// in epoch seconds, in `x-ratelimit-reset`. `None` for any other 403.
fn rate_limit_reset(res: &http::Response<Body>, now: SystemTime) -> Option<Duration> {
    let header = |name: &str| res.headers().get(name)?.to_str().ok()?.parse::<u64>().ok();

    if header(RATELIMIT_REMAINING)? != 0 {
        return None;
    }

    let reset = UNIX_EPOCH + Duration::from_secs(header(RATELIMIT_RESET)?);
    Some(reset.duration_since(now).unwrap_or_default())
}

impl<E> Policy<http::Request<Body>, http::Response<Body>, E> for Backoff
where
    E: std::fmt::Display,
{
    type Future = BackoffFuture;

    fn retry(
        &mut self,
        req: &mut http::Request<Body>,
        result: &mut Result<http::Response<Body>, E>,
    ) -> Option<Self::Future> {
        let backoff = self.increment()?;
        let wait = match result {
            Ok(res) => match res.status() {
                StatusCode::GATEWAY_TIMEOUT | StatusCode::REQUEST_TIMEOUT => {
                    tracing::debug!("retrying request to {} due to timeout", req.uri());
                    backoff.delay
                }
                status if status.is_server_error() => {
                    tracing::debug!("retrying request to {} due to server error", req.uri());
                    backoff.delay
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    tracing::debug!("retrying request to {} due to rate limit", req.uri());
                    retry_after(res)
                        .map(|delay| self.rate_limited(delay).delay)
                        .unwrap_or(backoff.delay)
                }
                StatusCode::FORBIDDEN => {
                    let reset = rate_limit_reset(res, SystemTime::now())?;
                    tracing::debug!("retrying request to {} after rate limit reset", req.uri());
                    self.rate_limited(reset).delay
                }
                _ => return None,
            },
            Err(error) => {
                tracing::warn!("retrying request to {} due to error: {error}", req.uri());
                backoff.delay
            }
        };

        *self = backoff;
        Some(BackoffFuture::new(wait))
    }

    fn clone_request(&mut self, req: &http::Request<Body>) -> Option<http::Request<Body>> {
        try_clone_request(req)
    }
}

/// Sleeps before a retried request is sent.
#[derive(Debug)]
#[pin_project::pin_project]
pub struct BackoffFuture {
    #[pin]
    sleep: tokio::time::Sleep,
}

impl BackoffFuture {
    fn new(delay: Duration) -> Self {
        Self {
            sleep: tokio::time::sleep(delay),
        }
    }
}

impl std::future::Future for BackoffFuture {
    type Output = ();

    fn poll(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        self.project().sleep.poll(cx)
    }
}
