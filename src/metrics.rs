//! Counters for cache hits/misses and upstream outcomes, plus a small HTTP
//! surface (`/metrics`, `/health`) to read them from outside the process.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::{Json, Router, extract::State, routing::get};
use serde_json::{Value, json};

#[derive(Default)]
pub struct Metrics {
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    upstream_ok: AtomicU64,
    upstream_err: AtomicU64,
    // Defined for forward-compatibility with a stale-serving feature; this
    // build never serves an expired cache entry, so it never increments.
    serve_stale: AtomicU64,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_ok(&self) {
        self.upstream_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn upstream_err(&self) {
        self.upstream_err.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> Value {
        json!({
            "cache_hits": self.cache_hits.load(Ordering::Relaxed),
            "cache_misses": self.cache_misses.load(Ordering::Relaxed),
            "upstream_ok": self.upstream_ok.load(Ordering::Relaxed),
            "upstream_err": self.upstream_err.load(Ordering::Relaxed),
            "serve_stale": self.serve_stale.load(Ordering::Relaxed),
        })
    }
}

pub fn router(metrics: Arc<Metrics>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health))
        .with_state(metrics)
}

async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Json<Value> {
    Json(metrics.snapshot())
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now().to_rfc3339() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_counts() {
        let metrics = Metrics::new();
        metrics.cache_hit();
        metrics.cache_hit();
        metrics.cache_miss();
        metrics.upstream_ok();
        metrics.upstream_err();

        let snap = metrics.snapshot();
        assert_eq!(snap["cache_hits"], 2);
        assert_eq!(snap["cache_misses"], 1);
        assert_eq!(snap["upstream_ok"], 1);
        assert_eq!(snap["upstream_err"], 1);
        assert_eq!(snap["serve_stale"], 0);
    }
}
