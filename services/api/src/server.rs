use crate::cli::ServeArgs;
use crate::infra::{build_pages, cors_layer, AppState};
use crate::routes::with_scoring_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use loan_scoring::config::AppConfig;
use loan_scoring::error::AppError;
use loan_scoring::scoring::{LoanScoringService, ModelRegistry};
use loan_scoring::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let registry = ModelRegistry::load(&config.models)?;
    let loaded = registry.loaded_variants();
    let service = Arc::new(LoanScoringService::new(registry));
    let pages = build_pages(&config.web);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        models: Arc::new(loaded),
    };

    let app = with_scoring_routes(service, pages, &config.web.static_dir)
        .layer(Extension(app_state))
        .layer(cors_layer(&config.web))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "loan scoring service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
