use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_clinic_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use health_unit::clinic::{ClinicService, ClinicStore, SystemClock, TokenIssuer};
use health_unit::config::AppConfig;
use health_unit::error::AppError;
use health_unit::telemetry;
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

    let service = ClinicService::new(
        ClinicStore::in_memory(),
        Arc::new(TokenIssuer::from_config(&config.auth)),
        Arc::new(SystemClock),
    );
    if let Some(admin) = &config.auth.bootstrap_admin {
        service.bootstrap_admin(admin)?;
    }

    let app = with_clinic_routes(Arc::new(service))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "health unit api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
