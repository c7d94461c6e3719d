use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::api::AppState;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Per-caller token-bucket limiter.  Buckets are keyed by the caller's
/// principal when the identity header is present, falling back to the
/// client IP for unauthenticated requests.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<String, TokenBucket>>>,
    rate: f64,
    capacity: f64,
}

impl RateLimiter {
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            rate,
            capacity,
        }
    }

    pub async fn check(&self, key: &str) -> bool {
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.try_consume(self.rate, self.capacity)
    }

    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let mut buckets = self.buckets.lock().await;
        let now = Instant::now();
        buckets.retain(|_, bucket| {
            now.duration_since(bucket.last_refill).as_secs_f64() < max_idle_secs
        });
    }

    #[cfg(test)]
    async fn bucket_count(&self) -> usize {
        self.buckets.lock().await.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(10.0, 30.0)
    }
}

pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if let Some(key) = caller_key(&req, &state.config.identity_header) {
        if !state.rate_limiter.check(&key).await {
            warn!(caller = %key, "Rate limit exceeded");
            return Err(StatusCode::TOO_MANY_REQUESTS);
        }
    }

    Ok(next.run(req).await)
}

/// Principal from the identity header first, then the connecting socket,
/// then X-Forwarded-For.
fn caller_key<B>(req: &Request<B>, identity_header: &str) -> Option<String> {
    if let Some(principal) = req.headers().get(identity_header) {
        if let Ok(value) = principal.to_str() {
            let value = value.trim();
            if !value.is_empty() {
                return Some(format!("id:{value}"));
            }
        }
    }

    if let Some(connect_info) = req.extensions().get::<ConnectInfo<std::net::SocketAddr>>() {
        return Some(format!("ip:{}", connect_info.0.ip()));
    }

    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(first) = value.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return Some(format!("ip:{first}"));
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = RateLimiter::new(10.0, 5.0);

        for _ in 0..5 {
            assert!(limiter.check("id:alice").await);
        }

        assert!(!limiter.check("id:alice").await);
    }

    #[tokio::test]
    async fn test_rate_limiter_isolates_callers() {
        let limiter = RateLimiter::new(10.0, 2.0);

        assert!(limiter.check("id:alice").await);
        assert!(limiter.check("id:alice").await);
        assert!(!limiter.check("id:alice").await);

        assert!(limiter.check("id:bob").await);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let limiter = RateLimiter::new(10.0, 5.0);
        assert!(limiter.check("ip:192.168.1.1").await);

        limiter.purge_stale(0.0).await;

        assert_eq!(limiter.bucket_count().await, 0);
    }

    #[test]
    fn test_caller_key_prefers_identity_header() {
        let req = Request::builder()
            .header("x-agora-identity", "alice")
            .header("x-forwarded-for", "10.0.0.1")
            .body(())
            .unwrap();
        assert_eq!(
            caller_key(&req, "x-agora-identity").as_deref(),
            Some("id:alice")
        );
    }

    #[test]
    fn test_caller_key_falls_back_to_forwarded_ip() {
        let req = Request::builder()
            .header("x-forwarded-for", "10.0.0.1, 10.0.0.2")
            .body(())
            .unwrap();
        assert_eq!(
            caller_key(&req, "x-agora-identity").as_deref(),
            Some("ip:10.0.0.1")
        );
    }
}
