use crate::cli::ServeArgs;
use crate::infra::{
    demo_inventory, demo_submissions, AppState, InMemoryActivityFeed,
    InMemoryAllocationRepository,
};
use crate::routes::with_allocation_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use chrono::Utc;
use food_rescue::allocation::AllocationService;
use food_rescue::config::AppConfig;
use food_rescue::error::AppError;
use food_rescue::telemetry;
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

    let repository = if args.seed_demo {
        let now = Utc::now();
        info!("seeding demo pantry");
        InMemoryAllocationRepository::seeded(demo_inventory(now), demo_submissions(now))
    } else {
        InMemoryAllocationRepository::default()
    };
    let allocation_service = Arc::new(AllocationService::new(
        Arc::new(repository),
        Arc::new(InMemoryActivityFeed::default()),
        config.allocation.clone(),
    ));

    let app = with_allocation_routes(allocation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "food rescue allocator ready");

    axum::serve(listener, app).await?;
    Ok(())
}
