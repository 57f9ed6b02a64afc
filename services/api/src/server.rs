use crate::cli::ServeArgs;
use crate::infra::{build_i18n_state, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_hub::config::AppConfig;
use estate_hub::error::AppError;
use estate_hub::inventory::{InMemoryInventoryRepository, UnitImportService};
use estate_hub::telemetry;
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

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let i18n_state = Arc::new(build_i18n_state(&config.i18n)?);
    info!(
        locales = ?i18n_state.catalog.locales(),
        fallback = %i18n_state.catalog.fallback().code(),
        "message catalog loaded"
    );

    let repository = Arc::new(InMemoryInventoryRepository::new());
    let inventory_service = Arc::new(UnitImportService::new(repository));

    let app = with_service_routes(i18n_state, inventory_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "estate hub ready");

    axum::serve(listener, app).await?;
    Ok(())
}
