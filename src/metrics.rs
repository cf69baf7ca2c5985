//! Prometheus metrics.
//!
//! HTTP traffic is recorded by [`metrics_middleware`]; the join and
//! provisioning workflows report through the `track_*` helpers. Everything is
//! a no-op when `OBSERVABILITY_ENABLED` is `false` or `0`.

use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| !v.eq_ignore_ascii_case("false") && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task.
///
/// Returns `None` when observability is disabled.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
            ],
        )
        .expect("Failed to set buckets")
        .install_recorder()
        .expect("Failed to install Prometheus recorder");

    let upkeep = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep.run_upkeep();
        }
    });

    Some(handle)
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);
    let response = next.run(req).await;
    gauge!("http_requests_active").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path)
        .record(start.elapsed().as_secs_f64());

    response
}

/// Router served on the metrics port.
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// `source` is `user`, `administration` or `join_code`.
pub fn track_join_request_created(source: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("join_requests_created_total", "source" => source).increment(1);
}

/// `outcome` is `accepted` or `rejected`.
pub fn track_join_request_resolved(outcome: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("join_requests_resolved_total", "outcome" => outcome).increment(1);
}

/// `result` is `joined`, `pending` or `invalid_code`.
pub fn track_join_by_code(role: &'static str, result: &'static str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("school_joins_by_code_total", "role" => role, "result" => result).increment(1);
}

pub fn track_academic_structure_generated(classes: u64, modules: u64) {
    if !is_observability_enabled() {
        return;
    }
    counter!("academic_structures_generated_total").increment(1);
    counter!("academic_classes_generated_total").increment(classes);
    counter!("academic_modules_generated_total").increment(modules);
}

pub fn track_school_created() {
    if !is_observability_enabled() {
        return;
    }
    counter!("schools_created_total").increment(1);
}

pub fn track_user_registered(role: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("users_registered_total", "role" => role.to_string()).increment(1);
}

pub fn track_login(success: bool) {
    if !is_observability_enabled() {
        return;
    }
    let status = if success { "success" } else { "failure" };
    counter!("user_logins_total", "status" => status).increment(1);
}
