use crate::cli::ServeArgs;
use crate::infra::{seed_listings, AppState, InMemoryPropertyCatalog, LoggingNotifier};
use crate::routes::with_booking_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use homely_hub::bookings::{
    BookingNotifier, BookingPolicy, BookingRepository, BookingService, LedgerRepository,
    PropertyCatalog,
};
use homely_hub::config::AppConfig;
use homely_hub::error::AppError;
use homely_hub::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

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

    let booking_service = Arc::new(BookingService::new(
        Arc::new(LedgerRepository::default()),
        Arc::new(InMemoryPropertyCatalog::with_listings(seed_listings())),
        Arc::new(LoggingNotifier::default()),
        BookingPolicy::from(&config.booking),
    ));

    spawn_completion_sweep(
        booking_service.clone(),
        config.booking.completion_sweep_interval,
    );

    let app = with_booking_routes(booking_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        auto_confirm = config.booking.auto_confirm,
        "homely hub booking service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}

/// Periodically completes confirmed stays whose check-out has passed.
fn spawn_completion_sweep<R, P, N>(service: Arc<BookingService<R, P, N>>, every: Duration)
where
    R: BookingRepository + 'static,
    P: PropertyCatalog + 'static,
    N: BookingNotifier + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let today = Utc::now().date_naive();
            if let Err(err) = service.complete_elapsed(today) {
                error!(%err, "completion sweep failed");
            }
        }
    });
}
