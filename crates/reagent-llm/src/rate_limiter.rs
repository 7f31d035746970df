//! Process-wide per-model token-bucket rate limiter: a single owner tracks
//! a sliding 60-second window of `(timestamp, tokens)` usage per model
//! bucket and makes new callers wait once the window's sum crosses 70% of
//! the bucket's quota.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, warn};

const WINDOW: Duration = Duration::from_secs(60);
const SOFT_CEILING: f64 = 0.7;

/// Normalize a model name to its rate-limiter bucket key.
///
/// Mirrors `_get_model_key`: substring-matches the well-known Gemini model
/// families and defaults anything unrecognized to the flash bucket, since
/// flash is the conservative (lower-quota) assumption.
pub fn model_key(model: &str) -> &'static str {
    let lower = model.to_lowercase();
    if lower.contains("2.5-pro") || lower.contains("2.5pro") {
        "gemini-2.5-pro"
    } else {
        "gemini-2.5-flash"
    }
}

struct Bucket {
    quota: u64,
    usage: Vec<(Instant, u64)>,
}

impl Bucket {
    fn gc(&mut self, now: Instant) {
        self.usage.retain(|(t, _)| now.duration_since(*t) < WINDOW);
    }

    fn sum(&self) -> u64 {
        self.usage.iter().map(|(_, n)| n).sum()
    }
}

/// A single process-wide rate limiter instance, shared via `Arc` by every
/// `ChatSession`. Construct once, before any LLM session exists.
pub struct RateLimiter {
    buckets: Mutex<HashMap<&'static str, Bucket>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        let mut buckets = HashMap::new();
        buckets.insert(
            "gemini-2.5-pro",
            Bucket {
                quota: 2_000_000,
                usage: Vec::new(),
            },
        );
        buckets.insert(
            "gemini-2.5-flash",
            Bucket {
                quota: 1_000_000,
                usage: Vec::new(),
            },
        );
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// With custom quotas, e.g. from configuration.
    pub fn with_quotas(quotas: HashMap<&'static str, u64>) -> Self {
        let buckets = quotas
            .into_iter()
            .map(|(k, quota)| {
                (
                    k,
                    Bucket {
                        quota,
                        usage: Vec::new(),
                    },
                )
            })
            .collect();
        Self {
            buckets: Mutex::new(buckets),
        }
    }

    /// Block until the model's bucket is under its 70% soft ceiling.
    pub async fn wait_if_needed(&self, model: &str) {
        let key = model_key(model);
        loop {
            let wait = {
                let mut buckets = self.buckets.lock().await;
                let bucket = buckets
                    .entry(key)
                    .or_insert_with(|| Bucket {
                        quota: 1_000_000,
                        usage: Vec::new(),
                    });
                let now = Instant::now();
                bucket.gc(now);
                let used = bucket.sum();
                let threshold = (bucket.quota as f64 * SOFT_CEILING) as u64;
                if used <= threshold {
                    None
                } else {
                    bucket
                        .usage
                        .first()
                        .map(|(oldest, _)| WINDOW.saturating_sub(now.duration_since(*oldest)))
                }
            };
            match wait {
                None => return,
                Some(duration) if duration.is_zero() => continue,
                Some(duration) => {
                    debug!(model = key, ?duration, "rate limiter sleeping");
                    tokio::time::sleep(duration).await;
                }
            }
        }
    }

    /// Record token usage for a model after a completed call.
    pub async fn record_usage(&self, model: &str, tokens: u64) {
        let key = model_key(model);
        let mut buckets = self.buckets.lock().await;
        let bucket = buckets.entry(key).or_insert_with(|| Bucket {
            quota: 1_000_000,
            usage: Vec::new(),
        });
        let now = Instant::now();
        bucket.usage.push((now, tokens));
        bucket.gc(now);
        if bucket.sum() > bucket.quota {
            warn!(model = key, "rate limiter bucket over full quota");
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_key_normalizes_pro_variants() {
        assert_eq!(model_key("gemini-2.5-pro"), "gemini-2.5-pro");
        assert_eq!(model_key("models/gemini-2.5pro-latest"), "gemini-2.5-pro");
    }

    #[test]
    fn model_key_defaults_unknown_to_flash() {
        assert_eq!(model_key("gemini-1.5-flash"), "gemini-2.5-flash");
        assert_eq!(model_key("some-other-model"), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn wait_returns_immediately_with_no_history() {
        let limiter = RateLimiter::new();
        let start = Instant::now();
        limiter.wait_if_needed("gemini-2.5-flash").await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn record_usage_is_reflected_under_the_bucket() {
        let limiter = RateLimiter::new();
        limiter.record_usage("gemini-2.5-pro", 100).await;
        let buckets = limiter.buckets.lock().await;
        assert_eq!(buckets["gemini-2.5-pro"].sum(), 100);
    }

    #[tokio::test]
    async fn wait_blocks_above_soft_ceiling() {
        let mut quotas = HashMap::new();
        quotas.insert("gemini-2.5-flash", 100u64);
        let limiter = RateLimiter::with_quotas(quotas);
        // 71 tokens > 70% of 100
        limiter.record_usage("gemini-2.5-flash", 71).await;
        let start = Instant::now();
        // Use a tiny synthetic window by checking the limiter does compute a
        // positive wait rather than returning instantly. We don't sleep the
        // full 60s in a unit test; instead assert sum crosses threshold.
        let buckets = limiter.buckets.lock().await;
        let bucket = &buckets["gemini-2.5-flash"];
        assert!(bucket.sum() as f64 > bucket.quota as f64 * SOFT_CEILING);
        drop(buckets);
        let _ = start;
    }
}
