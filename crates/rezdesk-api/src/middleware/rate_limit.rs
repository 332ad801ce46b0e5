//! Tiered HTTP rate limiting.
//!
//! In-process sharded limiter keyed by client IP. Each request resolves to a
//! tier by path prefix:
//! - auth-sensitive (claims writes): strictest limit,
//! - sensitive (invitations, onboarding): intermediate,
//! - general: everything else.
//!
//! Responses carry `X-RateLimit-Limit` / `X-RateLimit-Remaining` /
//! `X-RateLimit-Reset`; a rejected request gets a 429 with
//! `{error, message, retryAfter}`. A limiter that cannot be consulted fails
//! open with a warning rather than blocking traffic.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const WINDOW_SECONDS: u64 = 60;
const MAX_BUCKETS_PER_SHARD: usize = 10_000;
/// How long to wait for a shard lock before failing open.
const LOCK_TIMEOUT: Duration = Duration::from_millis(50);

/// Per-minute limits for the three path tiers.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitTiers {
    pub auth_per_minute: u32,
    pub sensitive_per_minute: u32,
    pub general_per_minute: u32,
}

/// Resolve the tier limit for a request path.
pub fn limit_for_path(tiers: &RateLimitTiers, path: &str) -> u32 {
    if path.starts_with("/api/v0/claims") {
        tiers.auth_per_minute
    } else if path.starts_with("/api/v0/invitations") || path.starts_with("/api/v0/onboarding") {
        tiers.sensitive_per_minute
    } else {
        tiers.general_per_minute
    }
}

#[derive(Clone)]
struct RateLimitBucket {
    count: u32,
    reset_at: Instant,
}

impl RateLimitBucket {
    fn new() -> Self {
        Self {
            count: 0,
            reset_at: Instant::now() + Duration::from_secs(WINDOW_SECONDS),
        }
    }

    fn check_and_increment(&mut self, limit: u32) -> (bool, u32) {
        let now = Instant::now();

        // Reset if window expired
        if now >= self.reset_at {
            self.count = 0;
            self.reset_at = now + Duration::from_secs(WINDOW_SECONDS);
        }

        if self.count < limit {
            self.count += 1;
            (true, limit.saturating_sub(self.count))
        } else {
            (false, 0)
        }
    }

    fn reset_in(&self) -> Duration {
        self.reset_at.saturating_duration_since(Instant::now())
    }
}

/// Sharded rate limiter to reduce lock contention.
///
/// Keys are hashed across separate HashMaps so concurrent requests rarely
/// contend on the same mutex.
#[derive(Clone)]
pub struct HttpRateLimiter {
    shards: Vec<Arc<Mutex<HashMap<String, RateLimitBucket>>>>,
    shard_count: usize,
    pub tiers: RateLimitTiers,
}

/// Outcome of a rate limit check.
pub enum RateDecision {
    /// Allowed; remaining requests and seconds until the window resets.
    Allowed { remaining: u32, reset_seconds: u64 },
    /// Rejected; seconds until the window resets.
    Limited { reset_seconds: u64 },
    /// Limiter unavailable; let the request through.
    Unavailable,
}

impl HttpRateLimiter {
    pub fn new(tiers: RateLimitTiers) -> Self {
        Self::with_shards(tiers, 16)
    }

    pub fn with_shards(tiers: RateLimitTiers, shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|_| Arc::new(Mutex::new(HashMap::new())))
            .collect();
        Self {
            shards,
            shard_count,
            tiers,
        }
    }

    fn shard_index(&self, key: &str) -> usize {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shard_count
    }

    pub async fn check_rate_limit(&self, key: &str, limit: u32) -> RateDecision {
        let shard = &self.shards[self.shard_index(key)];

        let mut buckets = match tokio::time::timeout(LOCK_TIMEOUT, shard.lock()).await {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!(key = %key, "rate limiter shard lock timed out, failing open");
                return RateDecision::Unavailable;
            }
        };

        // Evict expired buckets when a shard approaches capacity.
        if buckets.len() >= MAX_BUCKETS_PER_SHARD {
            let now = Instant::now();
            let grace = Duration::from_secs(WINDOW_SECONDS);
            buckets.retain(|_key, bucket| {
                bucket.reset_at > now || now.duration_since(bucket.reset_at) < grace
            });

            if buckets.len() >= MAX_BUCKETS_PER_SHARD {
                let oldest_key = buckets
                    .iter()
                    .min_by_key(|(_, bucket)| bucket.reset_at)
                    .map(|(k, _)| k.clone());
                if let Some(key_to_remove) = oldest_key {
                    buckets.remove(&key_to_remove);
                }
            }
        }

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(RateLimitBucket::new);

        let (allowed, remaining) = bucket.check_and_increment(limit);
        let reset_seconds = bucket.reset_in().as_secs().max(1);
        if allowed {
            RateDecision::Allowed {
                remaining,
                reset_seconds,
            }
        } else {
            RateDecision::Limited { reset_seconds }
        }
    }

    /// Drop buckets whose window lapsed more than a grace period ago.
    pub async fn cleanup_expired_buckets(&self) {
        let now = Instant::now();
        let grace = Duration::from_secs(WINDOW_SECONDS);
        let mut total_cleaned = 0;

        for shard in &self.shards {
            let mut buckets = shard.lock().await;
            let before = buckets.len();
            buckets.retain(|_key, bucket| {
                bucket.reset_at > now || now.duration_since(bucket.reset_at) < grace
            });
            total_cleaned += before - buckets.len();
        }

        if total_cleaned > 0 {
            tracing::debug!(
                buckets_cleaned = total_cleaned,
                "Cleaned up expired rate limit buckets across all shards"
            );
        }
    }
}

fn client_ip(request: &Request) -> String {
    // Behind the load balancer the first X-Forwarded-For entry is the client.
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }

    request
        .extensions()
        .get::<std::net::SocketAddr>()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn set_header(response: &mut Response, name: &'static str, value: &str) {
    if let Ok(header_value) = HeaderValue::from_str(value) {
        response.headers_mut().insert(name, header_value);
    }
}

/// HTTP rate limiting middleware, keyed by client IP with tiered limits.
pub async fn rate_limit_middleware(
    State(rate_limiter): State<Arc<HttpRateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let limit = limit_for_path(&rate_limiter.tiers, request.uri().path());
    let key = format!("ip:{}", client_ip(&request));

    match rate_limiter.check_rate_limit(&key, limit).await {
        RateDecision::Allowed {
            remaining,
            reset_seconds,
        } => {
            let mut response = next.run(request).await;
            set_header(&mut response, "X-RateLimit-Limit", &limit.to_string());
            set_header(
                &mut response,
                "X-RateLimit-Remaining",
                &remaining.to_string(),
            );
            set_header(&mut response, "X-RateLimit-Reset", &reset_seconds.to_string());
            response
        }
        RateDecision::Unavailable => next.run(request).await,
        RateDecision::Limited { reset_seconds } => {
            tracing::warn!(key = %key, path = %request.uri().path(), limit, "rate limit exceeded");

            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                axum::Json(serde_json::json!({
                    "error": "Too Many Requests",
                    "message": "Rate limit exceeded. Please slow down.",
                    "retryAfter": reset_seconds,
                })),
            )
                .into_response();

            set_header(&mut response, "X-RateLimit-Limit", &limit.to_string());
            set_header(&mut response, "X-RateLimit-Remaining", "0");
            set_header(&mut response, "X-RateLimit-Reset", &reset_seconds.to_string());
            set_header(&mut response, "Retry-After", &reset_seconds.to_string());

            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> RateLimitTiers {
        RateLimitTiers {
            auth_per_minute: 10,
            sensitive_per_minute: 30,
            general_per_minute: 100,
        }
    }

    #[test]
    fn paths_resolve_to_their_tiers() {
        let t = tiers();
        assert_eq!(limit_for_path(&t, "/api/v0/claims"), 10);
        assert_eq!(limit_for_path(&t, "/api/v0/claims/sync"), 10);
        assert_eq!(limit_for_path(&t, "/api/v0/invitations"), 30);
        assert_eq!(limit_for_path(&t, "/api/v0/invitations/abc/revoke"), 30);
        assert_eq!(limit_for_path(&t, "/api/v0/onboarding"), 30);
        assert_eq!(limit_for_path(&t, "/api/v0/tickets"), 100);
        assert_eq!(limit_for_path(&t, "/health"), 100);
    }

    #[tokio::test]
    async fn requests_within_limit_pass_and_count_down() {
        let limiter = HttpRateLimiter::with_shards(tiers(), 4);
        for expected_remaining in (0..3).rev() {
            match limiter.check_rate_limit("ip:10.0.0.1", 3).await {
                RateDecision::Allowed { remaining, .. } => {
                    assert_eq!(remaining, expected_remaining)
                }
                _ => panic!("expected allowance"),
            }
        }
        assert!(matches!(
            limiter.check_rate_limit("ip:10.0.0.1", 3).await,
            RateDecision::Limited { .. }
        ));
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let limiter = HttpRateLimiter::with_shards(tiers(), 4);
        for _ in 0..3 {
            limiter.check_rate_limit("ip:10.0.0.1", 3).await;
        }
        assert!(matches!(
            limiter.check_rate_limit("ip:10.0.0.2", 3).await,
            RateDecision::Allowed { .. }
        ));
    }
}
