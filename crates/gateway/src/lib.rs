//! HTTP API gateway for ChatBridge.
//!
//! Exposes an OpenAI-compatible `/v1/chat/completions` endpoint that
//! forwards to the configured upstream, plus health and discovery routes.
//!
//! Built on Axum for high performance async HTTP.

pub mod api_v1;
pub mod error;
pub mod openai;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    response::Json,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use chatbridge_config::AppConfig;
use chatbridge_core::prompt::PromptAssembler;
use chatbridge_core::upstream::Upstream;
use chatbridge_upstream::SimplifiqueClient;

/// Shared application state for the gateway.
///
/// Read-only after startup, so handlers share it without locking.
pub struct GatewayState {
    pub config: AppConfig,
    pub assembler: PromptAssembler,
    pub upstream: Arc<dyn Upstream>,
}

impl GatewayState {
    pub fn new(config: AppConfig, upstream: Arc<dyn Upstream>) -> Self {
        let assembler = PromptAssembler::new(config.prompt.labels());
        Self {
            config,
            assembler,
            upstream,
        }
    }
}

pub type SharedState = Arc<GatewayState>;

/// Build the full router.
///
/// Layers applied:
/// - CORS from `gateway.allowed_origins`
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(state: SharedState) -> Router {
    let body_limit = state.config.gateway.body_limit_bytes;
    let cors = cors_layer(&state.config.gateway.allowed_origins);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// CORS policy. `*` allows any origin without credentials; an explicit
/// list allows credentials for those origins only.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let upstream: Arc<dyn Upstream> = Arc::new(SimplifiqueClient::new(
        &config.upstream,
        config.prompt.fallback_answer.clone(),
    )?);

    info!(
        upstream = upstream.name(),
        api_url = %config.upstream.api_url,
        query_mode = ?config.prompt.query_mode,
        "Upstream configured"
    );

    let state = Arc::new(GatewayState::new(config, upstream));
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    api_version: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        api_version: "v1",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    api: &'static str,
    status: &'static str,
    endpoints: Endpoints,
}

#[derive(Serialize)]
struct Endpoints {
    chat_completions: &'static str,
    prompt_assemble: &'static str,
    health: &'static str,
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        api: "OpenAI to Simplifique Adapter",
        status: "running",
        endpoints: Endpoints {
            chat_completions: "/v1/chat/completions",
            prompt_assemble: "/v1/prompt/assemble",
            health: "/health",
        },
    })
}
