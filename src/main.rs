use axum::{ServiceExt, extract::Request};
use inmind::api::{self, app_state::AppState};
use inmind::classifier::create_classifier;
use inmind::config::{ConfigLoader, loader::default_config_path};
use inmind::knowledge::create_knowledge_provider;
use inmind::observability::{
    AppMetrics, HealthCheckResult, ObservabilityState, create_observability_router, init_tracing,
};
use inmind::services::{create_chat_service, create_session_service};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::var("INMIND_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| default_config_path());
    let config = ConfigLoader::load_from(&config_path)?;
    ConfigLoader::validate(&config)?;

    let _log_guard = init_tracing(&config.logging)?;
    info!(
        "Starting {} ({} environment)",
        config.app_name, config.environment
    );

    let classifier = create_classifier(&config.classifier)?;
    info!("Classifier initialized");

    let knowledge = create_knowledge_provider(&config.knowledge)?;

    let session_service: Arc<dyn inmind::services::SessionService> =
        Arc::from(create_session_service(&config.session));
    info!(
        "Session service initialized (max {} queries per session, {} sessions, idle ttl {}s)",
        config.session.max_queries, config.session.max_sessions, config.session.idle_ttl_secs
    );

    let purge_sessions = session_service.clone();
    let purge_every = Duration::from_secs(config.session.idle_ttl_secs.clamp(1, 60));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            interval.tick().await;
            purge_sessions.purge_idle().await;
        }
    });

    let metrics = Arc::new(AppMetrics::default());
    let chat_service = create_chat_service(
        session_service.clone(),
        classifier.clone(),
        knowledge,
        metrics.clone(),
    );

    let app_state = AppState::new(session_service, chat_service, classifier.clone(), metrics.clone());

    let observability_state = Arc::new(ObservabilityState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        metrics,
    ));
    observability_state
        .add_health_check(HealthCheckResult::healthy(
            "classifier",
            format!("{} categories loaded", classifier.category_names().len()),
        ))
        .await;
    observability_state
        .add_health_check(HealthCheckResult::healthy(
            "knowledge",
            format!("provider: {}", config.knowledge.provider),
        ))
        .await;

    let api_router = api::create_router(app_state, config.server.cors_permissive);
    let router = create_observability_router(observability_state).merge(api_router);
    let app = NormalizePathLayer::trim_trailing_slash().layer(router);
    info!("API router created with observability endpoints");

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await?;

    Ok(())
}
