use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use health_unit::clinic::{clinic_router, ClinicService};
use serde_json::json;
use std::sync::Arc;

/// Clinic API plus the operational endpoints served next to it.
pub(crate) fn with_clinic_routes(service: Arc<ClinicService>) -> Router {
    clinic_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use health_unit::clinic::{ClinicStore, SystemClock, TokenIssuer};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn app(ready: bool) -> Router {
        let service = ClinicService::new(
            ClinicStore::in_memory(),
            Arc::new(TokenIssuer::new("routes-test-secret", 1)),
            Arc::new(SystemClock),
        );
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        with_clinic_routes(Arc::new(service)).layer(Extension(state))
    }

    async fn get_status(router: Router, uri: &str) -> StatusCode {
        router
            .oneshot(
                Request::get(uri)
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("router response")
            .status()
    }

    #[tokio::test]
    async fn readiness_tracks_the_flag() {
        assert_eq!(
            get_status(app(false), "/ready").await,
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(get_status(app(true), "/ready").await, StatusCode::OK);
    }

    #[tokio::test]
    async fn operational_routes_skip_bearer_auth() {
        assert_eq!(get_status(app(true), "/health").await, StatusCode::OK);
        assert_eq!(get_status(app(true), "/metrics").await, StatusCode::OK);
        assert_eq!(
            get_status(app(true), "/api/patients").await,
            StatusCode::UNAUTHORIZED
        );
    }
}
