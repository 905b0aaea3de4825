use axum::http::{header, HeaderValue, Method};
use loan_scoring::config::WebConfig;
use loan_scoring::scoring::{ModelVariant, PageRenderer, TemplatePages};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) models: Arc<Vec<ModelVariant>>,
}

/// Templates from disk when present, otherwise the compiled-in copies.
pub(crate) fn build_pages(web: &WebConfig) -> Arc<dyn PageRenderer> {
    match TemplatePages::from_dir(&web.template_dir) {
        Ok(pages) => Arc::new(pages),
        Err(err) => {
            warn!(
                dir = %web.template_dir.display(),
                error = %err,
                "falling back to embedded templates"
            );
            Arc::new(TemplatePages::embedded())
        }
    }
}

pub(crate) fn cors_layer(web: &WebConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = web
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
