use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use huntfield::config::AppConfig;
use huntfield::error::AppError;
use huntfield::telemetry;
use huntfield::workflows::booking::{AvailabilityLedger, BookingService, FieldCatalog};
use huntfield::workflows::hunt::{AnimalTagIssuer, HuntService, QuotaTracker, TagStore};
use huntfield::workflows::router::CoreState;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryBookingStore, InMemoryFieldStore, InMemoryReportStore, InMemorySessionStore,
    InMemoryTagStore, LoggingEventPublisher, SimulatedPayments,
};
use crate::routes::with_core_routes;

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

    let core = build_core_state(config.verification.clone());
    let app = with_core_routes(core)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "huntfield marketplace core ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wire the in-memory stores and collaborators behind the core services.
pub(crate) fn build_core_state(
    verification: huntfield::config::VerificationConfig,
) -> Arc<CoreState> {
    let fields = Arc::new(InMemoryFieldStore::default());
    let bookings = Arc::new(InMemoryBookingStore::default());
    let sessions = Arc::new(InMemorySessionStore::default());
    let reports = Arc::new(InMemoryReportStore::default());
    let tags = Arc::new(InMemoryTagStore::default());
    let ledger = Arc::new(AvailabilityLedger::new());
    let quota = Arc::new(QuotaTracker::new());
    let events = Arc::new(LoggingEventPublisher);
    let payments = Arc::new(SimulatedPayments::default());
    let issuer = AnimalTagIssuer::new(tags.clone() as Arc<dyn TagStore>);

    let booking_service = Arc::new(BookingService::new(
        fields.clone(),
        bookings.clone(),
        sessions.clone(),
        ledger.clone(),
        events.clone(),
        payments,
    ));
    let hunt_service = Arc::new(HuntService::new(
        bookings.clone(),
        fields.clone(),
        sessions.clone(),
        reports.clone(),
        issuer.clone(),
        quota,
        events,
    ));
    let catalog = Arc::new(FieldCatalog::new(
        fields, bookings, sessions, reports, tags, ledger,
    ));

    Arc::new(CoreState {
        bookings: booking_service,
        hunts: hunt_service,
        catalog,
        issuer,
        verification,
    })
}
