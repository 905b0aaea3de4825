use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use loan_scoring::scoring::{scoring_router, LoanScoringService, ModelVariant, PageRenderer};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;

pub(crate) fn with_scoring_routes(
    service: Arc<LoanScoringService>,
    pages: Arc<dyn PageRenderer>,
    static_dir: &Path,
) -> axum::Router {
    scoring_router(service, pages)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .nest_service("/statics", ServeDir::new(static_dir))
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

    let missing: Vec<ModelVariant> = ModelVariant::ALL
        .into_iter()
        .filter(|variant| !state.models.contains(variant))
        .collect();

    let label = if !ready {
        "initializing"
    } else if missing.is_empty() {
        "ready"
    } else {
        "degraded"
    };

    let payload = json!({
        "status": label,
        "models": state.models.iter().map(|variant| variant.label()).collect::<Vec<_>>(),
        "unavailable": missing.iter().map(|variant| variant.label()).collect::<Vec<_>>(),
    });

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
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use loan_scoring::scoring::{ModelRegistry, TemplatePages, TreeEnsemble};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use serde_json::Value;
    use std::path::PathBuf;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn repo_path(relative: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..").join(relative)
    }

    fn app(ready: bool, registry: ModelRegistry) -> axum::Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
            models: Arc::new(registry.loaded_variants()),
        };
        with_scoring_routes(
            Arc::new(LoanScoringService::new(registry)),
            Arc::new(TemplatePages::embedded()),
            &repo_path("frontend/statics"),
        )
        .layer(Extension(state))
    }

    fn no_bureau_only() -> ModelRegistry {
        let model = TreeEnsemble::from_path(
            repo_path("assets/model_no_bureau.json"),
            ModelVariant::NoBureau,
        )
        .expect("artifact loads");
        ModelRegistry::new().with_model(Arc::new(model))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).expect("request"))
            .await
            .expect("route executes");
        let status = response.status();
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn health_is_always_ok() {
        let (status, body) = get(app(false, ModelRegistry::new()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload, json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn readiness_waits_for_listener() {
        let (status, body) = get(app(false, no_bureau_only()), "/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], json!("initializing"));
    }

    #[tokio::test]
    async fn readiness_reports_missing_variant() {
        let (status, body) = get(app(true, no_bureau_only()), "/ready").await;
        assert_eq!(status, StatusCode::OK);
        let payload: Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(payload["status"], json!("degraded"));
        assert_eq!(payload["models"], json!(["model_no_bureau"]));
        assert_eq!(payload["unavailable"], json!(["model_bureau"]));
    }

    #[tokio::test]
    async fn serves_static_assets() {
        let (status, body) = get(app(true, no_bureau_only()), "/statics/style.css").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8_lossy(&body).contains(".grade"));
    }
}
