use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::ApiConfig;
use crate::error::AppError;

/// Fixed-window limiter on rejected access keys, keyed by store id.
///
/// Every request that presents a key is checked first. Only rejected keys
/// count against the window.
#[derive(Clone)]
pub struct CredentialRateLimiter {
    state: Arc<Mutex<HashMap<String, RateWindow>>>,
    window: Duration,
    limit: u32,
    metrics: Arc<RateLimitMetrics>,
}

#[derive(Default)]
struct RateLimitMetrics {
    checks_allowed: AtomicU64,
    checks_limited: AtomicU64,
    rejected_keys: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct RateLimitMetricsSnapshot {
    pub checks_allowed: u64,
    pub checks_limited: u64,
    pub rejected_keys: u64,
}

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    started_at: Instant,
    count: u32,
}

impl CredentialRateLimiter {
    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(
            config.login_rate_limit_window,
            config.login_rate_limit_per_window,
        )
    }

    pub fn new(window: Duration, limit: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
            window,
            limit,
            metrics: Arc::new(RateLimitMetrics::default()),
        }
    }

    /// Refuse the request when the store's window holds `limit` rejected keys.
    pub async fn check(&self, store_id: &str) -> Result<(), AppError> {
        let now = Instant::now();
        let mut guard = self.state.lock().await;

        // Drop expired windows.
        let window = self.window;
        guard.retain(|_, entry| now.duration_since(entry.started_at) < window);

        let Some(entry) = guard.get(store_id) else {
            self.metrics.checks_allowed.fetch_add(1, Ordering::Relaxed);
            return Ok(());
        };

        if entry.count >= self.limit {
            let retry_after_secs = self
                .window
                .saturating_sub(now.duration_since(entry.started_at))
                .as_secs()
                .max(1);
            self.metrics.checks_limited.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                store = store_fingerprint(store_id),
                retry_after_secs,
                "Credential rate limit exceeded"
            );
            return Err(AppError::too_many_requests(
                "Too many rejected access keys for this store",
                retry_after_secs,
            ));
        }

        self.metrics.checks_allowed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Count a rejected key against the store's window.
    pub async fn record_rejection(&self, store_id: &str) {
        let now = Instant::now();
        let mut guard = self.state.lock().await;
        let entry = guard.entry(store_id.to_string()).or_insert(RateWindow {
            started_at: now,
            count: 0,
        });
        if now.duration_since(entry.started_at) >= self.window {
            entry.started_at = now;
            entry.count = 0;
        }
        entry.count = entry.count.saturating_add(1);
        self.metrics.rejected_keys.fetch_add(1, Ordering::Relaxed);
    }

    pub fn metrics_snapshot(&self) -> RateLimitMetricsSnapshot {
        RateLimitMetricsSnapshot {
            checks_allowed: self.metrics.checks_allowed.load(Ordering::Relaxed),
            checks_limited: self.metrics.checks_limited.load(Ordering::Relaxed),
            rejected_keys: self.metrics.rejected_keys.load(Ordering::Relaxed),
        }
    }
}

/// Stable, non-reversible tag for a store id in logs.
pub fn store_fingerprint(store_id: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    store_id.hash(&mut hasher);
    hasher.finish()
}
