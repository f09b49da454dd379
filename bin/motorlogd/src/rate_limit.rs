//! Best-effort in-memory request rate limiting.
//!
//! Fixed window per client identifier. Counters live in process memory
//! only, so limits are per-instance; a multi-instance deployment needs
//! an external limiter instead.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use motorlog_core::ServiceError;

struct Bucket {
    count: u32,
    window_start: Instant,
}

pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    buckets: RwLock<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Arc<Self> {
        Arc::new(Self {
            max_requests,
            window,
            buckets: RwLock::new(HashMap::new()),
        })
    }

    /// Count one request for `key`. Returns false when the window
    /// budget is exhausted.
    pub fn allow(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut buckets = match self.buckets.write() {
            Ok(guard) => guard,
            // A poisoned lock fails open rather than blocking traffic.
            Err(_) => return true,
        };

        let bucket = buckets.entry(key.to_string()).or_insert(Bucket {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) >= self.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        bucket.count += 1;
        bucket.count <= self.max_requests
    }

    /// Drop buckets whose window has long expired.
    pub fn sweep(&self) {
        let now = Instant::now();
        if let Ok(mut buckets) = self.buckets.write() {
            buckets.retain(|_, b| now.duration_since(b.window_start) < self.window * 2);
        }
    }

    /// Spawn a background task that sweeps stale buckets periodically.
    pub fn start_sweeper(self: &Arc<Self>) {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(300));
            loop {
                tick.tick().await;
                limiter.sweep();
            }
        });
    }
}

/// Client identifier: first X-Forwarded-For hop when present, else the
/// peer address.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
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
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ServiceError> {
    let key = client_key(&request);
    if !limiter.allow(&key) {
        return Err(ServiceError::RateLimited(
            "too many requests, slow down".into(),
        ));
    }
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_enforced() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        // Independent keys have independent budgets.
        assert!(limiter.allow("b"));
    }

    #[test]
    fn test_window_resets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.allow("a"));
    }

    #[test]
    fn test_sweep_drops_stale_buckets() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        limiter.allow("a");
        std::thread::sleep(Duration::from_millis(30));
        limiter.sweep();
        assert!(limiter.buckets.read().unwrap().is_empty());
    }
}
