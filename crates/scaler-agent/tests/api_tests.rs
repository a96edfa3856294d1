//! Integration tests for the scaler API endpoints

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use scaler_agent::api::{create_router, AppState};
use scaler_lib::{
    cycle::SharedReport,
    health::{components, HealthRegistry},
    ActuationOutcome, CycleReport, MetricsSnapshot, ScalerMetrics, ScalingDecision,
    ScalingReason,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower::ServiceExt;

async fn setup_test_app() -> (Router, Arc<AppState>) {
    let health_registry = HealthRegistry::with_scaler_components().await;
    let metrics = ScalerMetrics::new();
    let latest: SharedReport = Arc::new(RwLock::new(None));

    let state = Arc::new(AppState::new(health_registry, metrics, latest));
    let router = create_router(state.clone());

    (router, state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

fn sample_report() -> CycleReport {
    CycleReport {
        fleet: "web".to_string(),
        generated_at: 1_700_000_000,
        duration_ms: 12,
        blobs_read: 2,
        metrics: MetricsSnapshot {
            total_requests: 10,
            error_count: 3,
            slow_response_count: 1,
            average_response_time_ms: 420.0,
            response_time_samples: 5,
        },
        utilization: vec![],
        mean_cpu_percent: None,
        decision: ScalingDecision::ScaleUp {
            reasons: vec![ScalingReason::HighErrorRate(30.0)],
        },
        actuation: ActuationOutcome::Failed {
            error: "fleet not found: web".to_string(),
        },
    }
}

#[tokio::test]
async fn test_healthz_returns_ok_when_healthy() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn test_healthz_returns_ok_when_source_degraded() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_degraded(components::BLOB_SOURCE, "log directory missing")
        .await;

    // Degraded still returns 200 (operational)
    let (status, body) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::OK);

    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(health["status"], "degraded");
    assert_eq!(
        health["components"]["blob_source"]["message"],
        "log directory missing"
    );
}

#[tokio::test]
async fn test_healthz_returns_503_when_fleet_unhealthy() {
    let (app, state) = setup_test_app().await;

    state
        .health_registry
        .set_unhealthy(components::FLEET, "fleet not found: web")
        .await;

    let (status, _) = get(app, "/healthz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_readyz_returns_503_before_first_cycle() {
    let (app, _state) = setup_test_app().await;

    let (status, body) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let readiness: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(readiness["ready"], false);
}

#[tokio::test]
async fn test_readyz_returns_ok_when_ready() {
    let (app, state) = setup_test_app().await;
    state.health_registry.set_ready(true).await;

    let (status, _) = get(app, "/readyz").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_report_is_404_before_first_cycle() {
    let (app, _state) = setup_test_app().await;

    let (status, _) = get(app, "/report").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_report_returns_latest_cycle() {
    let (app, state) = setup_test_app().await;
    *state.latest_report.write().await = Some(sample_report());

    let (status, body) = get(app, "/report").await;
    assert_eq!(status, StatusCode::OK);

    let report: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(report["fleet"], "web");
    assert_eq!(report["metrics"]["error_count"], 3);
    assert_eq!(report["decision"]["action"], "scale_up");
    assert_eq!(report["actuation"]["outcome"], "failed");
}

#[tokio::test]
async fn test_metrics_endpoint_returns_prometheus_format() {
    let (app, state) = setup_test_app().await;

    state.metrics.observe_cycle_latency(0.01);
    state.metrics.record_snapshot(&sample_report().metrics);
    state.metrics.record_decision(&ScalingDecision::Maintain);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response.headers().get("content-type").unwrap();
    assert!(content_type.to_str().unwrap().contains("text/plain"));

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics_text = String::from_utf8(body.to_vec()).unwrap();

    assert!(metrics_text.contains("log_scaler_cycle_latency_seconds_bucket"));
    assert!(metrics_text.contains("log_scaler_total_requests"));
    assert!(metrics_text.contains("log_scaler_decisions_total"));
}

#[tokio::test]
async fn test_healthz_includes_component_details() {
    let (app, _state) = setup_test_app().await;

    let (_, body) = get(app, "/healthz").await;
    let health: serde_json::Value = serde_json::from_slice(&body).unwrap();

    for name in components::ALL {
        assert!(health["components"][name].is_object(), "missing {name}");
    }
}
