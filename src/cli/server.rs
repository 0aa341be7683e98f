//! HTTP server mode for triggering conversion passes

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ConverterConfig;
use crate::error::{Error, Result};
use crate::invocation::{self, parse_flag, InvocationEvent, InvocationResponse};

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Converter settings used for every pass
    pub converter: ConverterConfig,
}

/// App state shared across handlers
struct AppState {
    config: ServerConfig,
    /// One pass at a time
    running: Mutex<()>,
}

/// Query of `GET /convert`
#[derive(Debug, Default, Deserialize)]
struct ConvertQuery {
    #[serde(default)]
    verbose: Option<String>,
}

/// Response wrapper
#[derive(Debug, Serialize)]
struct ApiResponse<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn error(msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Build the router
pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        config,
        running: Mutex::new(()),
    };

    // Build CORS layer - allow all origins for development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke))
        .route("/convert", get(convert))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig, port: u16) -> Result<()> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to port {port}: {e}")))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Run a pass for a raw trigger event
async fn invoke(State(state): State<Arc<AppState>>, Json(event): Json<Value>) -> Response {
    let event = InvocationEvent::from_value(&event);
    run_pass(&state, &event).await
}

/// Run a pass, reading `verbose` from the query string
async fn convert(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConvertQuery>,
) -> Response {
    let verbose = query
        .verbose
        .is_some_and(|v| parse_flag(&Value::String(v)));
    run_pass(&state, &InvocationEvent::verbose(verbose)).await
}

async fn run_pass(state: &AppState, event: &InvocationEvent) -> Response {
    let _guard = state.running.lock().await;

    match invocation::handle(event, state.config.converter.clone()).await {
        Ok(response) => respond(&response),
        Err(e) => {
            tracing::error!("Conversion failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::<()>::error(format!("Conversion failed: {e}"))),
            )
                .into_response()
        }
    }
}

fn respond(response: &InvocationResponse) -> Response {
    match response.body_json() {
        Ok(body) => (StatusCode::OK, Json(ApiResponse::success(body))).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(format!("Invalid response body: {e}"))),
        )
            .into_response(),
    }
}
