//! Async HTTP Server Module
//!
//! Serves the DPI calculator over HTTP using axum.
//!
//! # Routes
//!
//! - `GET /` - welcome message
//! - `GET /health` - liveness and model summary
//! - `GET /metadata` - variables, fuzzy sets and rules
//! - `POST /calculate` - run one DPI calculation
//!
//! `/metadata` and `/calculate` are also mounted under `/api`.
//!
//! Every failure is answered with the structured error body
//! (`{"status": "error", "code", "code_num", "detail", ...}`), never a bare
//! string.
//!
//! # Example
//!
//! ```rust,ignore
//! use fuzzy_dpi::config::ServerConfig;
//! use fuzzy_dpi::server::run_server;
//! use fuzzy_dpi::simulation::DpiCalculator;
//!
//! #[tokio::main]
//! async fn main() {
//!     let calculator = DpiCalculator::builtin().unwrap();
//!     run_server(calculator, ServerConfig::default()).await.unwrap();
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{DpiError, DpiResult, ErrorCode, ErrorResponse};
use crate::model::FuzzyMetadata;
use crate::simulation::{DailyInput, DpiCalculator, DpiReport};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state for the server
pub struct AppState {
    /// The calculator; immutable, so shared without locks
    pub calculator: DpiCalculator,
    /// Server configuration
    pub config: ServerConfig,
}

impl AppState {
    /// Create new application state
    pub fn new(calculator: DpiCalculator, config: ServerConfig) -> Self {
        Self { calculator, config }
    }
}

/// Type alias for shared state
pub type SharedState = Arc<AppState>;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Successful response envelope
#[derive(Debug, Serialize)]
pub struct Success<T> {
    status: &'static str,
    data: T,
}

impl<T: Serialize> Success<T> {
    pub fn new(data: T) -> Self {
        Self {
            status: "success",
            data,
        }
    }
}

/// Error response
pub struct ApiError {
    status: StatusCode,
    error: DpiError,
}

impl From<DpiError> for ApiError {
    fn from(error: DpiError) -> Self {
        let status = StatusCode::from_u16(error.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self { status, error }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            error: DpiError::new(ErrorCode::InvalidFormat, rejection.body_text())
                .with_hint("Send a JSON object with Content-Type: application/json"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(code = self.error.code.code(), message = %self.error.message, "request failed");
        } else {
            debug!(code = self.error.code.code(), message = %self.error.message, "request rejected");
        }
        (self.status, Json(ErrorResponse::from(&self.error))).into_response()
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// Welcome message at /
async fn index() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the Fuzzy Productivity Simulator API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint
async fn health_check(State(state): State<SharedState>) -> Json<Value> {
    let registry = state.calculator.registry();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build_target": option_env!("DPI_BUILD_TARGET"),
        "model": registry.name(),
        "rules": registry.rules().len(),
    }))
}

/// Variable and rule definitions
async fn metadata(State(state): State<SharedState>) -> Json<FuzzyMetadata> {
    Json(state.calculator.metadata())
}

/// Run one DPI calculation
async fn calculate(
    State(state): State<SharedState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Success<DpiReport>>, ApiError> {
    let Json(body) = payload?;
    let input = DailyInput::from_json(&body)?;
    let report = state.calculator.calculate(&input)?;

    debug!(
        score = report.dpi_score,
        label = %report.linguistic_result,
        fired = report.simulation.fired_rules.len(),
        "calculated"
    );

    let today = chrono::Local::now().date_naive();
    Ok(Json(Success::new(report.dated(today))))
}

/// Unknown paths
async fn not_found() -> ApiError {
    ApiError {
        status: StatusCode::NOT_FOUND,
        error: DpiError::validation("No such endpoint")
            .with_hint("Available: /, /health, /metadata, /calculate"),
    }
}

/// Wrap bodiless error responses from axum and tower-http (405, 408) in the
/// JSON error envelope
async fn envelope_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let message = status.canonical_reason().unwrap_or("Request failed");
    let error = if status.is_client_error() && status != StatusCode::REQUEST_TIMEOUT {
        DpiError::validation(message)
    } else {
        DpiError::internal(message)
    };
    let allow = response.headers().get(header::ALLOW).cloned();

    let mut enveloped = ApiError { status, error }.into_response();
    if let Some(allow) = allow {
        enveloped.headers_mut().insert(header::ALLOW, allow);
    }
    enveloped
}

// ============================================================================
// Server Setup
// ============================================================================

fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/metadata", get(metadata))
        .route("/calculate", post(calculate))
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    let config = state.config.clone();

    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .merge(api_routes())
        .nest("/api", api_routes())
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeout_secs)))
        .layer(middleware::map_response(envelope_bare_errors))
        .layer(TraceLayer::new_for_http());

    let router = if config.cors_enabled {
        // CORS configuration
        let cors = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_origin(Any)
            .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);
        router.layer(cors)
    } else {
        router
    };

    router.with_state(state)
}

/// Run the async HTTP server
///
/// This function blocks until the server is shut down (via Ctrl+C).
pub async fn run_server(calculator: DpiCalculator, config: ServerConfig) -> DpiResult<()> {
    let bind = (config.host.clone(), config.port);
    let listener = tokio::net::TcpListener::bind(bind).await.map_err(|e| {
        DpiError::internal(format!("cannot listen on {}:{}: {}", config.host, config.port, e))
            .with_hint("Pick another port with --port or DPI_SERVER_PORT")
    })?;
    let addr = listener.local_addr()?;

    let state = Arc::new(AppState::new(calculator, config));
    let app = create_router(state);

    info!(%addr, "listening");
    info!("routes: GET /, GET /health, GET /metadata, POST /calculate (also under /api)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C)
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl+C; stop the process another way");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ============================================================================
// Tests
// ============================================================================
