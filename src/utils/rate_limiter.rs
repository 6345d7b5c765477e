use governor::{Quota, RateLimiter as GovernorRateLimiter};
use nonzero_ext::*;
use std::time::Duration;
use tokio::time::sleep;

/// Paces requests against an external API with a minimum delay between
/// calls, on top of a one-per-second quota.
pub struct RateLimiter {
    limiter: GovernorRateLimiter<
        governor::state::direct::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
    delay: Duration,
}

impl RateLimiter {
    pub fn with_delay(delay: Duration) -> Self {
        let quota = Quota::per_second(nonzero!(1u32));
        Self {
            limiter: GovernorRateLimiter::direct(quota),
            delay,
        }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        while self.limiter.check().is_err() {
            sleep(Duration::from_millis(100)).await;
        }

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_enforces_delay() {
        let limiter = RateLimiter::with_delay(Duration::from_millis(100));
        let start = std::time::Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(100));
    }
}
