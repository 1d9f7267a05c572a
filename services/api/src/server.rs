use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::{info, warn};

use enroll_core::config::AppConfig;
use enroll_core::error::AppError;
use enroll_core::pipeline::extraction::{ExtractionJobManager, TesseractRecognizer};
use enroll_core::pipeline::ranking::{AttemptLimiter, RankingEngine};
use enroll_core::telemetry;

use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationDirectory, InMemoryDocumentStore, InMemoryJobStore,
    InMemoryProfileStore,
};
use crate::routes::with_pipeline_routes;

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

    let recognizer = Arc::new(TesseractRecognizer::new(&config.ocr));
    if !recognizer.engine_available() {
        warn!(
            binary = %config.ocr.binary,
            "recognition engine probe failed; extraction jobs will fail until it is installed"
        );
    }

    let profiles = Arc::new(InMemoryProfileStore::default());
    let directory = Arc::new(InMemoryApplicationDirectory::default());
    let manager = Arc::new(ExtractionJobManager::new(
        Arc::new(InMemoryJobStore::default()),
        profiles.clone(),
        Arc::new(InMemoryDocumentStore::default()),
        recognizer,
        config.ocr.timeout,
    ));
    let engine = Arc::new(RankingEngine::new(
        directory.clone(),
        profiles.clone(),
        config.ranking.cache_ttl,
    ));
    let limiter = Arc::new(AttemptLimiter::new(directory));

    let app = with_pipeline_routes(manager, engine, limiter, profiles)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "admission pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
