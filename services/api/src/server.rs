use crate::cli::ServeArgs;
use crate::infra::{
    seed_demo_properties, AppState, InMemoryBookingStore, InMemoryOwnershipDirectory,
    LoggingNotifier, StaticTokenAuthenticator,
};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use campusnest::bookings::{BookingApi, BookingService, GuardedStore};
use campusnest::config::AppConfig;
use campusnest::error::AppError;
use campusnest::telemetry;
use std::sync::atomic::Ordering;
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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(GuardedStore::new(InMemoryBookingStore::default()));
    let directory = Arc::new(InMemoryOwnershipDirectory::default());
    seed_demo_properties(&directory);
    let service = Arc::new(BookingService::new(
        store,
        directory,
        Arc::new(LoggingNotifier),
    ));
    let api = Arc::new(BookingApi::new(
        service,
        Arc::new(StaticTokenAuthenticator::with_demo_accounts()),
    ));

    let app = with_booking_routes(api)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "booking service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
