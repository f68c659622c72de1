//! Cabin Pipeline API Server
//!
//! Status polling, mapping edits and stream control over HTTP.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use pipeline::{CabinService, ServiceError};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use storage::StorageError;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod routes;
pub mod settings;

pub use settings::{LogSettings, Settings};

/// Application state shared across handlers
pub struct AppState {
    pub service: CabinService,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    pub fn new(service: CabinService) -> Self {
        Self {
            service,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Handler errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Storage(StorageError::UnknownAction(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(ServiceError::NoSource) => StatusCode::CONFLICT,
            ApiError::Service(ServiceError::ChannelClosed) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub streaming: bool,
    pub source: Option<String>,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/gesture", get(routes::status::get_gesture))
        .route("/api/v1/vitals", get(routes::status::get_vitals))
        .route("/api/v1/status", get(routes::status::get_status))
        .route("/api/v1/mappings", get(routes::mappings::get_mappings))
        .route("/api/v1/mappings/:gesture", put(routes::mappings::put_mapping))
        .route(
            "/api/v1/stream",
            post(routes::stream::start_stream).delete(routes::stream::stop_stream),
        )
        .route("/api/v1/calm-mode/reset", post(routes::stream::reset_calm_mode))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler(State(state): State<SharedState>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        streaming: state.service.is_streaming(),
        source: state.service.last_url(),
    })
}

/// Install the global tracing subscriber
pub fn init_logging(settings: &LogSettings) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    let level = settings.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true);

    if settings.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    }
}

/// Start the Prometheus exporter on `addr`
pub fn init_metrics(addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = addr.parse()?;
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    info!("Prometheus exporter on {}", addr);
    Ok(())
}

/// Serve the API until Ctrl-C
pub async fn run_server(addr: &str, service: CabinService) -> anyhow::Result<()> {
    let app = create_router(Arc::new(AppState::new(service)));

    info!("Starting API server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown requested");
            }
        })
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use dispatcher::LoggingEffector;
    use pipeline::{NoopInference, PipelineConfig};
    use serde_json::Value;
    use storage::{JsonMappingStore, MappingStore, MemoryMappingStore};
    use stream_capture::HttpStreamSource;
    use tower::ServiceExt;

    fn app() -> (Router, CabinService) {
        app_with(Arc::new(MemoryMappingStore::new()))
    }

    fn app_with(store: Arc<dyn MappingStore>) -> (Router, CabinService) {
        let config = PipelineConfig::default();
        let service = CabinService::spawn(
            config.clone(),
            HttpStreamSource::new(&config.capture),
            Box::new(NoopInference),
            store,
            Arc::new(LoggingEffector),
        );
        (create_router(Arc::new(AppState::new(service.clone()))), service)
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (app, service) = app();
        let (status, body) = send(app, "GET", "/api/v1/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["streaming"], false);
        assert!(body["source"].is_null());
        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_status_empty_before_frames() {
        let (app, service) = app();
        let (status, body) = send(app.clone(), "GET", "/api/v1/gesture", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.is_null());

        let (_, body) = send(app, "GET", "/api/v1/status", None).await;
        assert!(body["status"].is_null());
        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_mapping_edit() {
        let (app, service) = app();

        let (status, body) = send(app.clone(), "GET", "/api/v1/mappings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mappings"]["Thumb_Up"], "VOLUME_UP");
        assert_eq!(body["availableActions"].as_array().unwrap().len(), 10);

        let (status, _) = send(
            app.clone(),
            "PUT",
            "/api/v1/mappings/Thumb_Up",
            Some(serde_json::json!({ "action": "MUTE" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(service.mapping_store().get("Thumb_Up").unwrap(), "MUTE");

        let (status, body) = send(
            app,
            "PUT",
            "/api/v1/mappings/Thumb_Up",
            Some(serde_json::json!({ "action": "EJECT" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Unknown action: EJECT");
        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_mapping_edit_persists_to_file() {
        let path = std::env::temp_dir().join(format!("cabin-api-mappings-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let (app, service) = app_with(Arc::new(JsonMappingStore::new(path.clone())));

        let (status, body) = send(
            app.clone(),
            "PUT",
            "/api/v1/mappings/Open_Palm",
            Some(serde_json::json!({ "action": "NEXT" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "NEXT");

        let (status, body) = send(app, "GET", "/api/v1/mappings", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["mappings"]["Open_Palm"], "NEXT");
        assert_eq!(body["mappings"]["Thumb_Up"], "VOLUME_UP");

        let on_disk: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk, serde_json::json!({ "Open_Palm": "NEXT" }));

        service.shutdown().await.unwrap();
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_calm_mode_reset_accepted() {
        let (app, service) = app();
        let (status, _) = send(app, "POST", "/api/v1/calm-mode/reset", None).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        service.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stop_without_stream() {
        let (app, service) = app();
        let (status, _) = send(app, "DELETE", "/api/v1/stream", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        service.shutdown().await.unwrap();
    }
}
