//! Microbial-Risk API Server
//!
//! REST API exposing the rule engine and the trained risk classifier.

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod routes;

pub use config::{AppConfig, LoggingConfig, PersistenceConfig, ServerConfig};
pub use error::ApiError;

use data_validator::Validator;
use risk_classifier::RiskService;
use storage::Repository;

/// Application state shared across handlers
pub struct AppState {
    /// Shared classifier service
    pub service: Arc<RiskService>,
    /// Persisted risk records
    pub repository: Arc<Repository>,
    /// Request precondition
    pub validator: Validator,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
    /// Prometheus exporter, when installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new application state
    pub fn new(service: Arc<RiskService>, repository: Arc<Repository>) -> Self {
        Self {
            service,
            repository,
            validator: Validator::default(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle served at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub classifier: ClassifierStatus,
}

/// Classifier readiness
#[derive(Debug, Serialize)]
pub struct ClassifierStatus {
    pub trained: bool,
    pub model_version: Option<String>,
    pub training_rows: Option<usize>,
    pub oob_accuracy: Option<f64>,
}

/// Route table, logged at startup
const ROUTES: [(&str, &str); 5] = [
    ("GET", "/api/v1/health"),
    ("POST", "/api/v1/predict/microbial-risk"),
    ("POST", "/api/v1/predict/microbial-risk/rules"),
    ("GET", "/api/v1/microbial-risk/records"),
    ("GET", "/metrics"),
];

/// Create the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route(
            "/api/v1/predict/microbial-risk",
            post(routes::predictions::predict_microbial_risk),
        )
        .route(
            "/api/v1/predict/microbial-risk/rules",
            post(routes::predictions::assess_microbial_risk_rules),
        )
        .route("/api/v1/microbial-risk/records", get(routes::records::get_records))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    // Never trains: a cold service reports itself untrained
    let classifier = if state.service.is_trained() {
        state.service.classifier().await.ok()
    } else {
        None
    };

    let response = HealthResponse {
        status: if classifier.is_some() { "healthy" } else { "starting" }.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        classifier: ClassifierStatus {
            trained: classifier.is_some(),
            model_version: classifier.as_ref().map(|c| c.model_version().to_string()),
            training_rows: classifier.as_ref().map(|c| c.report().rows),
            oob_accuracy: classifier.as_ref().and_then(|c| c.report().oob_accuracy),
        },
    };

    Json(response)
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics exporter not installed".to_string(),
        ),
    }
}

/// Initialize logging. The level comes from `RUST_LOG`, defaulting to `info`.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Train the classifier, then serve until shutdown.
///
/// Training failure (for example a missing reference dataset) is fatal.
pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    let repository = Arc::new(Repository::with_capacity(config.persistence.max_records));

    let mut service = RiskService::new(config.model.clone());
    if config.persistence.enabled {
        service = service.with_sink(repository.clone(), config.persistence.timeout());
    }
    let service = Arc::new(service);

    let classifier = service.classifier().await?;
    let report = classifier.report();
    info!(
        "Classifier {} trained on {} rows ({})",
        classifier.model_version(),
        report.rows,
        report.distribution
    );

    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::new(service, repository).with_metrics(metrics));
    let app = create_router(state);

    info!("Starting API server on {}", config.server.bind);
    for (method, path) in ROUTES {
        info!("  {} {}", method, path);
    }

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
