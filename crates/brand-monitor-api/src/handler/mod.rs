//! HTTP handlers for the brand monitoring dashboard

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use brand_monitor_core::error::{ConfigError, Error, InitError, MonitoringError};
use brand_monitor_core::export::{self, ExportFormat};
use brand_monitor_core::result::{MonitoringSummary, QueryOutcome};
use brand_monitor_core::{
    ApiFactory, HealthReport, MonitoringRequest, MonitoringResult, MonitoringSystem, SecretKey,
    SecretSet, SecretStatus, SecretsDebugInfo, Session, SystemOverview,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub const SERVICE_NAME: &str = "brand-monitor";
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application state
pub struct AppState {
    pub secrets: SecretSet,
    factory: Arc<dyn ApiFactory>,
    system: OnceCell<Arc<MonitoringSystem>>,
    session: Mutex<Session>,
}

impl AppState {
    pub fn new(secrets: SecretSet, factory: Arc<dyn ApiFactory>) -> Self {
        Self {
            secrets,
            factory,
            system: OnceCell::new(),
            session: Mutex::new(Session::new()),
        }
    }

    /// The process-wide system, built on first use; failures are not cached
    async fn ensure_system(&self) -> Result<&Arc<MonitoringSystem>, Error> {
        self.system
            .get_or_try_init(|| async {
                MonitoringSystem::bootstrap(&self.secrets, self.factory.as_ref()).map(Arc::new)
            })
            .await
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/secrets", get(secret_status))
        .route("/api/v1/secrets/debug", get(secret_debug))
        .route("/api/v1/system", get(system_status))
        .route("/api/v1/system/initialize", post(initialize_system))
        .route("/api/v1/connections/test", post(test_connections))
        .route("/api/v1/monitor", post(run_monitoring))
        .route("/api/v1/results/latest", get(latest_results))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

type HandlerResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiErrorBody>)>;

fn respond<T>(data: T) -> HandlerResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
        request_id: Uuid::new_v4(),
    }))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
    })
}

async fn secret_status(State(state): State<Arc<AppState>>) -> HandlerResult<SecretStatus> {
    respond(state.secrets.status())
}

async fn secret_debug(State(state): State<Arc<AppState>>) -> HandlerResult<SecretsDebugInfo> {
    respond(state.secrets.debug_info())
}

async fn system_status(State(state): State<Arc<AppState>>) -> HandlerResult<SystemStatusResponse> {
    let overview = match state.system.get() {
        Some(system) => {
            let session = state.session.lock().await;
            Some(system.overview(&session))
        }
        None => None,
    };

    respond(SystemStatusResponse {
        bootstrapped: overview.is_some(),
        overview,
    })
}

/// Bootstrap on first call, then initialize the external API
async fn initialize_system(State(state): State<Arc<AppState>>) -> HandlerResult<SystemOverview> {
    let system = state.ensure_system().await.map_err(error_response)?;

    let mut session = state.session.lock().await;
    system
        .initialize(&mut session)
        .await
        .map_err(|e| error_response(e.into()))?;

    respond(system.overview(&session))
}

async fn test_connections(State(state): State<Arc<AppState>>) -> HandlerResult<HealthReport> {
    let system = initialized_system(&state)?;
    let session = state.session.lock().await;
    let report = system
        .test_connections(&session)
        .await
        .map_err(|e| error_response(e.into()))?;

    if let Some(error) = report.error() {
        tracing::warn!(error = %error, "Connection test failed");
    }
    respond(report)
}

async fn run_monitoring(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MonitoringRequest>,
) -> HandlerResult<MonitorResponse> {
    let system = initialized_system(&state)?;
    let max_results = request.max_results;
    let request = request.with_max_results(max_results);

    let mut session = state.session.lock().await;
    let result = system
        .monitor(&mut session, request)
        .await
        .map_err(error_response)?;

    respond(MonitorResponse {
        summary: result.summary(),
        query_results: result.query_results(),
        result,
    })
}

async fn latest_results(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, (StatusCode, Json<ApiErrorBody>)> {
    let format = match params.format.as_deref() {
        Some(raw) => raw.parse::<ExportFormat>().map_err(error_response)?,
        None => ExportFormat::default(),
    };

    let session = state.session.lock().await;
    let Some(result) = session.last_results() else {
        return Err(error_body(
            StatusCode::NOT_FOUND,
            "NoResults",
            "No monitoring results yet".to_string(),
        ));
    };

    let body = export::export(result, format).map_err(error_response)?;
    let file_name = export::export_file_name(format, chrono::Utc::now());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file_name),
            ),
        ],
        body,
    )
        .into_response())
}

fn initialized_system(
    state: &AppState,
) -> Result<Arc<MonitoringSystem>, (StatusCode, Json<ApiErrorBody>)> {
    state
        .system
        .get()
        .cloned()
        .ok_or_else(|| error_response(InitError::NotInitialized.into()))
}

fn error_body(status: StatusCode, error: &str, message: String) -> (StatusCode, Json<ApiErrorBody>) {
    (
        status,
        Json(ApiErrorBody {
            error: error.to_string(),
            message,
            missing_secrets: None,
            request_id: Some(Uuid::new_v4()),
        }),
    )
}

fn error_response(err: Error) -> (StatusCode, Json<ApiErrorBody>) {
    let (status, code) = match &err {
        Error::Config(ConfigError::MissingSecrets(_)) => (StatusCode::BAD_REQUEST, "MissingSecrets"),
        Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ConfigError"),
        Error::Init(InitError::NotInitialized) => (StatusCode::CONFLICT, "NotInitialized"),
        Error::Init(_) => (StatusCode::BAD_GATEWAY, "InitializationFailed"),
        Error::Monitoring(MonitoringError::EmptyQuery) => (StatusCode::BAD_REQUEST, "InvalidInput"),
        Error::Monitoring(_) => (StatusCode::BAD_GATEWAY, "MonitoringFailed"),
        Error::Export(_) => (StatusCode::BAD_REQUEST, "ExportFailed"),
    };

    if status.is_server_error() {
        tracing::error!(error = %err, "Request failed");
    }

    let missing_secrets = match &err {
        Error::Config(e @ ConfigError::MissingSecrets(_)) => Some(e.missing_keys().to_vec()),
        _ => None,
    };

    (
        status,
        Json(ApiErrorBody {
            error: code.to_string(),
            message: err.to_string(),
            missing_secrets,
            request_id: Some(Uuid::new_v4()),
        }),
    )
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// System status response
#[derive(Debug, Serialize)]
pub struct SystemStatusResponse {
    pub bootstrapped: bool,
    pub overview: Option<SystemOverview>,
}

/// Monitoring run response
#[derive(Debug, Serialize)]
pub struct MonitorResponse {
    pub summary: Option<MonitoringSummary>,
    pub query_results: Vec<QueryOutcome>,
    pub result: MonitoringResult,
}

/// Download query parameters
#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub format: Option<String>,
}

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub request_id: Uuid,
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_secrets: Option<Vec<SecretKey>>,
    pub request_id: Option<Uuid>,
}
