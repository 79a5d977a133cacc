//! # REST API
//!
//! Builds the axum router that exposes the ledger over HTTP. All endpoints
//! share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                     | Description                              |
//! |--------|--------------------------|------------------------------------------|
//! | GET    | `/health`                | Liveness check                           |
//! | GET    | `/status`                | Chain height and node settings           |
//! | POST   | `/requestValidation`     | Issue an ownership challenge             |
//! | POST   | `/submitstar`            | Authenticated submission                 |
//! | GET    | `/block/height/:height`  | Block by height                          |
//! | GET    | `/block/hash/:hash`      | Block by hex digest                      |
//! | GET    | `/blocks/:address`       | Blocks credited to a wallet              |
//! | GET    | `/validateChain`         | Full integrity audit                     |
//!
//! ## Status codes
//!
//! Lookups that miss are 404. A submission whose signature does not verify
//! is 401; one with a malformed, stale or mismatched challenge is 400. A
//! store failure is 500.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use notary_protocol::{DecodedBlock, Ledger, LedgerError};

use crate::metrics::SharedMetrics;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; the ledger and metrics are both shared handles.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The ledger every handler reads from and writes to.
    pub ledger: Ledger,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/requestValidation", post(request_validation_handler))
        .route("/submitstar", post(submit_star_handler))
        .route("/block/height/:height", get(block_by_height_handler))
        .route("/block/hash/:hash", get(block_by_hash_handler))
        .route("/blocks/:address", get(blocks_by_address_handler))
        .route("/validateChain", get(validate_chain_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response body for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub height: i64,
    /// Seconds a signed challenge stays acceptable.
    pub validation_window: u64,
    /// Whether blocks are mirrored to disk.
    pub persistent: bool,
    pub timestamp: String,
}

/// Request body for `POST /requestValidation`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub address: String,
}

/// Request body for `POST /submitstar`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitStarRequest {
    pub address: String,
    /// The challenge exactly as `/requestValidation` returned it.
    pub message: String,
    /// Hex Ed25519 signature over `message`.
    pub signature: String,
    /// The record to notarize. Any JSON value.
    pub star: serde_json::Value,
}

/// A block as served over HTTP, digests in hex.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct BlockResponse {
    pub height: u64,
    pub hash: String,
    pub previous_block_hash: Option<String>,
    pub time: u64,
    pub owner: Option<String>,
    pub body: serde_json::Value,
    pub decoded_payload: serde_json::Value,
}

impl From<DecodedBlock> for BlockResponse {
    fn from(decoded: DecodedBlock) -> Self {
        let block = decoded.block;
        Self {
            height: block.height,
            hash: block.hash_hex(),
            previous_block_hash: block.previous_hash_hex(),
            time: block.timestamp,
            owner: block.owner,
            body: block.payload,
            decoded_payload: decoded.decoded_payload,
        }
    }
}

/// Response body for `GET /validateChain`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateChainResponse {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// HTTP status for a refused submission.
fn rejection_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::Authentication => StatusCode::UNAUTHORIZED,
        LedgerError::MalformedChallenge(_)
        | LedgerError::ChallengeMismatch(_)
        | LedgerError::ChallengeExpired { .. } => StatusCode::BAD_REQUEST,
        LedgerError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` - returns 200 if the node is alive.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status`
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(StatusResponse {
        version: state.version.clone(),
        height: state.ledger.height(),
        validation_window: state.ledger.config().validation_window.as_secs(),
        persistent: state.ledger.is_persistent(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// `POST /requestValidation` - hand out a challenge for the caller to sign.
async fn request_validation_handler(
    State(state): State<AppState>,
    Json(req): Json<ValidationRequest>,
) -> Response {
    if req.address.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "address must not be empty");
    }
    let challenge = state.ledger.request_validation(&req.address);
    tracing::debug!(address = %req.address, "ownership challenge issued");
    (StatusCode::OK, Json(challenge)).into_response()
}

/// `POST /submitstar` - verify the signed challenge, then append.
///
/// The ledger may flush to disk, so the write runs on the blocking pool.
async fn submit_star_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitStarRequest>,
) -> Response {
    let started = Instant::now();
    let ledger = state.ledger.clone();

    let result = tokio::task::spawn_blocking(move || {
        ledger.submit(&req.address, &req.message, &req.signature, req.star)
    })
    .await;

    state
        .metrics
        .submit_latency_seconds
        .observe(started.elapsed().as_secs_f64());
    // Read back from the ledger: concurrent submits finish in any order.
    state.metrics.chain_height.set(state.ledger.height());

    match result {
        Ok(Ok(block)) => {
            state.metrics.blocks_appended_total.inc();
            (StatusCode::OK, Json(BlockResponse::from(block))).into_response()
        }
        Ok(Err(e)) => {
            state.metrics.submissions_rejected_total.inc();
            error_response(rejection_status(&e), e.to_string())
        }
        Err(e) => {
            tracing::error!("submission task failed: {}", e);
            state.metrics.submissions_rejected_total.inc();
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "submission failed")
        }
    }
}

/// `GET /block/height/:height`
async fn block_by_height_handler(
    State(state): State<AppState>,
    Path(height): Path<i64>,
) -> Response {
    match state.ledger.block_by_height(height) {
        Some(block) => (StatusCode::OK, Json(BlockResponse::from(block))).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("block at height {} not found", height),
        ),
    }
}

/// `GET /block/hash/:hash`
async fn block_by_hash_handler(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Response {
    match state.ledger.block_by_hash_hex(&hash) {
        Some(block) => (StatusCode::OK, Json(BlockResponse::from(block))).into_response(),
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("block with hash {} not found", hash),
        ),
    }
}

/// `GET /blocks/:address` - every block credited to `address`, oldest
/// first. Unknown addresses get an empty list.
async fn blocks_by_address_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> impl IntoResponse {
    let blocks: Vec<BlockResponse> = state
        .ledger
        .stars_by_wallet_address(&address)
        .into_iter()
        .map(BlockResponse::from)
        .collect();
    Json(blocks)
}

/// `GET /validateChain`
async fn validate_chain_handler(State(state): State<AppState>) -> impl IntoResponse {
    let findings = state.ledger.validate_chain();
    state.metrics.integrity_findings.set(findings.len() as i64);

    Json(ValidateChainResponse {
        valid: findings.is_empty(),
        errors: findings.iter().map(ToString::to_string).collect(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
