use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use redis::{AsyncCommands, Script, aio::ConnectionManager};

use super::InfraError;
use crate::app_error::{AppError, AppResult};
use crate::application::ports::{AttemptLimiter, RateDecision, RatePolicy};

/// Lua script for atomic increment with TTL.
/// Returns `{count, ttl}` after the increment.
/// The window starts at the first attempt and is not extended by later ones.
/// If the key exists but has no TTL (edge case from old bug), TTL is set.
const INCR_WITH_TTL_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
elseif redis.call('TTL', KEYS[1]) == -1 then
    -- Key exists but has no TTL (shouldn't happen, but fix it)
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
return {current, redis.call('TTL', KEYS[1])}
"#;

fn decide(count: u64, reset_in_secs: u64, policy: RatePolicy) -> RateDecision {
    RateDecision {
        allowed: count <= policy.max_attempts,
        count,
        reset_in_secs,
    }
}

/// Redis-backed attempt limiter, shared by every instance of the service.
#[derive(Clone)]
pub struct RedisAttemptLimiter {
    manager: ConnectionManager,
    script: Script,
}

impl RedisAttemptLimiter {
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url).map_err(InfraError::RedisConnection)?;
        let manager = ConnectionManager::new(client)
            .await
            .map_err(InfraError::RedisConnection)?;
        let script = Script::new(INCR_WITH_TTL_SCRIPT);
        Ok(Self { manager, script })
    }
}

#[async_trait]
impl AttemptLimiter for RedisAttemptLimiter {
    async fn hit(&self, key: &str, policy: RatePolicy) -> AppResult<RateDecision> {
        let mut conn = self.manager.clone();
        let (count, ttl): (u64, i64) = self
            .script
            .key(key)
            .arg(policy.window_secs)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let reset_in_secs = u64::try_from(ttl).unwrap_or(policy.window_secs);
        Ok(decide(count, reset_in_secs, policy))
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        let mut conn = self.manager.clone();
        let _: u64 = conn
            .del(key)
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

struct Window {
    count: u64,
    opened_at: u64,
}

/// Process-local attempt limiter. Only correct for a single-instance
/// deployment; used when no REDIS_URL is configured.
#[derive(Default)]
pub struct InMemoryAttemptLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl InMemoryAttemptLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an attempt at `now` (unix seconds).
    pub fn hit_at(&self, key: &str, policy: RatePolicy, now: u64) -> AppResult<RateDecision> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".into()))?;

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            opened_at: now,
        });
        if now.saturating_sub(window.opened_at) >= policy.window_secs {
            window.count = 0;
            window.opened_at = now;
        }
        window.count += 1;

        let elapsed = now.saturating_sub(window.opened_at);
        let reset_in_secs = policy.window_secs.saturating_sub(elapsed);
        Ok(decide(window.count, reset_in_secs, policy))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl AttemptLimiter for InMemoryAttemptLimiter {
    async fn hit(&self, key: &str, policy: RatePolicy) -> AppResult<RateDecision> {
        self.hit_at(key, policy, unix_now())
    }

    async fn reset(&self, key: &str) -> AppResult<()> {
        self.windows
            .lock()
            .map_err(|_| AppError::Internal("rate limiter lock poisoned".into()))?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOURLY: RatePolicy = RatePolicy {
        max_attempts: 5,
        window_secs: 3600,
    };

    #[test]
    fn five_attempts_pass_and_the_sixth_is_limited() {
        let limiter = InMemoryAttemptLimiter::new();
        let start = 1_700_000_000;

        for i in 0..5 {
            let decision = limiter.hit_at("tenant-a", HOURLY, start + i).unwrap();
            assert!(decision.allowed, "attempt {} should pass", i + 1);
        }

        let sixth = limiter.hit_at("tenant-a", HOURLY, start + 10).unwrap();
        assert!(!sixth.allowed);
        assert_eq!(sixth.count, 6);
        assert_eq!(sixth.reset_in_secs, 3590);
    }

    #[test]
    fn window_elapsing_allows_new_attempts() {
        let limiter = InMemoryAttemptLimiter::new();
        let start = 1_700_000_000;
        for _ in 0..6 {
            limiter.hit_at("tenant-a", HOURLY, start).unwrap();
        }

        let later = limiter.hit_at("tenant-a", HOURLY, start + 3600).unwrap();
        assert!(later.allowed);
        assert_eq!(later.count, 1);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = InMemoryAttemptLimiter::new();
        let start = 1_700_000_000;
        for _ in 0..6 {
            limiter.hit_at("tenant-a", HOURLY, start).unwrap();
        }
        assert!(limiter.hit_at("tenant-b", HOURLY, start).unwrap().allowed);
    }

    #[tokio::test]
    async fn reset_forgets_the_window() {
        let limiter = InMemoryAttemptLimiter::new();
        for _ in 0..6 {
            limiter.hit("tenant-a", HOURLY).await.unwrap();
        }
        limiter.reset("tenant-a").await.unwrap();

        let decision = limiter.hit("tenant-a", HOURLY).await.unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.count, 1);
    }
}
