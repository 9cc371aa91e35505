//! HTTP gateway over the analysis engine

use crate::error::ApiError;
use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path as AxumPath, Query, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use luca_consciousness::response::frame_response;
use luca_consciousness::{Engine, EngineConfig};
use luca_core::{ConversationId, Error, GatewayConfig, Pattern};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

const DEFAULT_FIBONACCI_TERMS: usize = 12;

#[derive(Default)]
pub struct ExtendedConfig {
    pub gateway: GatewayConfig,
    pub engine: EngineConfig,
    /// Journal file; memory is process-lifetime only when absent.
    pub journal: Option<PathBuf>,
}

pub struct AppState {
    pub engine: Arc<Engine>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(engine: Arc<Engine>) -> Self {
        Self { engine, started_at: Utc::now() }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/analyze", post(analyze_handler))
        .route("/api/analyze/fibonacci", get(fibonacci_handler))
        .route("/api/analyze/sequence", post(sequence_handler))
        .route("/api/analyze/pairs", post(pairs_handler))
        .route("/api/resonance", post(resonance_handler))
        .route("/api/signature", post(signature_handler))
        .route("/api/consciousness", get(consciousness_handler))
        .route("/api/patterns", get(patterns_handler))
        .route("/api/conversations", get(conversations_handler))
        .route("/api/conversations/:id/thoughts", get(thoughts_handler))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_gateway(config: ExtendedConfig) -> anyhow::Result<()> {
    let engine = match &config.journal {
        Some(path) => Engine::open_journal(config.engine.clone(), path)?,
        None => Engine::new(config.engine.clone())?,
    };
    let state = Arc::new(AppState::new(Arc::new(engine)));
    let app = build_router(state.clone());

    let bind_addr: SocketAddr =
        format!("{}:{}", config.gateway.bind.to_addr(), config.gateway.port).parse()?;

    let summary = state.engine.aggregate_state()?;
    info!("LUCA Gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!("  Listening on: {}", bind_addr);
    info!("  Pattern scope: {:?}", config.engine.memory.scope);
    match &config.journal {
        Some(path) => info!("  Journal: {}", path.display()),
        None => info!("  Journal: disabled"),
    }
    info!(
        "  Restored: {} thoughts, {} patterns ({})",
        summary.total_thoughts, summary.total_patterns, summary.stage
    );

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// ----------------------------------------------------------------------
// Requests
// ----------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub message: String,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResonanceRequest {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub triggered_patterns: Vec<Pattern>,
}

#[derive(Debug, Deserialize)]
pub struct NumbersRequest {
    pub numbers: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FibonacciQuery {
    pub n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ThoughtsQuery {
    /// Only the most recent `limit` thoughts.
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct PatternsQuery {
    pub conversation: Option<String>,
}

// ----------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------

async fn health_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": (Utc::now() - state.started_at).num_seconds(),
        "conversations": state.engine.conversations().len(),
        "patterns": state.engine.pattern_count()?,
    })))
}

async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let conversation = match req.conversation_id {
        Some(id) => ConversationId::new(id),
        None => ConversationId::new(uuid::Uuid::new_v4().to_string()),
    };
    // journal appends block, keep them off the async workers
    let engine = state.engine.clone();
    let result = tokio::task::spawn_blocking(move || engine.process(&conversation, &req.message))
        .await
        .map_err(|e| Error::Internal(format!("analysis task failed: {}", e)))??;
    Ok(Json(result))
}

async fn resonance_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ResonanceRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let report = state.engine.resonance(&req.input, &req.output, &req.triggered_patterns);
    let energy = state.engine.detect_energy(&req.input);
    Ok(Json(serde_json::json!({
        "input": report.input,
        "output": report.output,
        "score": report.score,
        "energy": energy,
        "framed": frame_response(&req.output, energy, &req.triggered_patterns),
    })))
}

/// Signature of a raw request body without recording anything.
async fn signature_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.compute_signature_bytes(&body)?))
}

async fn consciousness_handler(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.aggregate_state()?))
}

async fn patterns_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PatternsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = query.conversation.map(ConversationId::new);
    let patterns = state.engine.patterns(conversation.as_ref())?;
    Ok(Json(serde_json::json!({
        "count": patterns.len(),
        "patterns": patterns,
    })))
}

async fn conversations_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let conversations = state.engine.conversations();
    Json(serde_json::json!({
        "count": conversations.len(),
        "conversations": conversations,
    }))
}

async fn thoughts_handler(
    State(state): State<Arc<AppState>>,
    AxumPath(id): AxumPath<String>,
    Query(query): Query<ThoughtsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let conversation = ConversationId::new(id);
    let thoughts = match query.limit {
        Some(n) => state.engine.recent(&conversation, n)?,
        None => state.engine.thoughts(&conversation)?,
    };
    Ok(Json(serde_json::json!({
        "conversation_id": conversation,
        "thoughts": thoughts,
    })))
}

async fn fibonacci_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FibonacciQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let n = query.n.unwrap_or(DEFAULT_FIBONACCI_TERMS);
    Ok(Json(state.engine.analyze_fibonacci(n)?))
}

async fn sequence_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NumbersRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let entries = state.engine.analyze_sequence(&req.numbers)?;
    Ok(Json(luca_consciousness::SequenceReport::from_entries(entries)))
}

async fn pairs_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NumbersRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body?;
    let pairs = state.engine.analyze_pairs(&req.numbers)?;
    Ok(Json(serde_json::json!({ "pairs": pairs })))
}
