//! # Request Metrics
//!
//! HTTP-level counters and latency recorded per request through the
//! `metrics` facade. With a Prometheus recorder installed they are rendered
//! at `/metrics`:
//!
//! - `ccon_http_requests_total{method,path,status}`
//! - `ccon_http_errors_total{method,path,status}` (4xx and 5xx)
//! - `ccon_http_request_duration_seconds{method,path}`
//!
//! [`ApiMetrics`] also keeps process-local totals for quick inspection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

/// Shared request counters.
#[derive(Debug, Clone, Default)]
pub struct ApiMetrics {
    request_count: Arc<AtomicU64>,
    error_count: Arc<AtomicU64>,
}

impl ApiMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far.
    pub fn requests(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    /// Requests answered with a 4xx or 5xx status.
    pub fn errors(&self) -> u64 {
        self.error_count.load(Ordering::Relaxed)
    }

    fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let labels = [
            ("method", method.to_string()),
            ("path", path.to_string()),
            ("status", status.to_string()),
        ];
        self.request_count.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("ccon_http_requests_total", &labels).increment(1);
        metrics::histogram!(
            "ccon_http_request_duration_seconds",
            "method" => method.to_string(),
            "path" => path.to_string()
        )
        .record(duration_secs);

        if status >= 400 {
            self.error_count.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("ccon_http_errors_total", &labels).increment(1);
        }
    }
}

/// Replace session ids and account addresses in `path` with placeholders
/// so label cardinality stays bounded.
fn normalize_path(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            if uuid::Uuid::parse_str(segment).is_ok() {
                "{id}"
            } else if segment.len() == 42
                && segment.starts_with("0x")
                && segment[2..].chars().all(|c| c.is_ascii_hexdigit())
            {
                "{address}"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Middleware that records request metrics.
pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let metrics = request.extensions().get::<ApiMetrics>().cloned();
    let method = request.method().to_string();
    let path = normalize_path(request.uri().path());
    let start = Instant::now();

    let response = next.run(request).await;

    if let Some(m) = metrics {
        m.record_request(
            &method,
            &path,
            response.status().as_u16(),
            start.elapsed().as_secs_f64(),
        );
    }

    response
}
