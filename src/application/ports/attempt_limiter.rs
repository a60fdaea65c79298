use async_trait::async_trait;

use crate::app_error::AppResult;

/// Budget applied to one limiter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatePolicy {
    pub max_attempts: u64,
    pub window_secs: u64,
}

/// Outcome of recording one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    /// Attempts recorded in the current window, including this one.
    pub count: u64,
    /// Seconds until the current window closes.
    pub reset_in_secs: u64,
}

/// Counter store for attacker-triggerable operations. Implementations must be
/// safe to share across request handlers; the Redis one is also safe across
/// instances.
#[async_trait]
pub trait AttemptLimiter: Send + Sync {
    /// Record an attempt under `key` and report whether it fits the policy.
    async fn hit(&self, key: &str, policy: RatePolicy) -> AppResult<RateDecision>;

    /// Forget all attempts recorded under `key`.
    async fn reset(&self, key: &str) -> AppResult<()>;
}
