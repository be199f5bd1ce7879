//! HTTP exposure of the log service

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::error::LogError;
use crate::hashing::encode_hash;
use crate::service::wire::{
    AppendBatchRequest, AppendRequest, PathResponse, ProofQuery, ProofResponse, RootResponse,
    SizeResponse, StatusResponse,
};
use crate::service::{LogServerInterface, LogService};

pub fn router(service: LogService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(status_endpoint))
        .route("/root", get(get_root_hash))
        .route("/size", get(get_size))
        .route("/entries", post(append_log))
        .route("/entries/batch", post(append_logs))
        .route("/path/:index", get(gen_path))
        .route("/proof", get(gen_proof))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .into_inner(),
        )
        .with_state(service)
}

fn decode_content(encoded: &str) -> Result<Vec<u8>, LogError> {
    hex::decode(encoded)
        .map_err(|e| LogError::InvalidRequest(format!("Entry content is not hex: {}", e)))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "merkle-log",
        "timestamp": chrono::Utc::now()
    }))
}

async fn status_endpoint(State(service): State<LogService>) -> Json<StatusResponse> {
    let status = service.status().await;
    Json(StatusResponse {
        status: "healthy".to_string(),
        root: encode_hash(&status.root),
        size: status.size,
        capacity: status.capacity,
        height: status.height,
    })
}

async fn get_root_hash(State(service): State<LogService>) -> Result<Json<RootResponse>, LogError> {
    let root = service.get_root_hash().await?;
    Ok(Json(RootResponse {
        root: encode_hash(&root),
    }))
}

async fn get_size(State(service): State<LogService>) -> Result<Json<SizeResponse>, LogError> {
    let size = service.get_size().await?;
    Ok(Json(SizeResponse { size }))
}

async fn append_log(
    State(service): State<LogService>,
    Json(request): Json<AppendRequest>,
) -> Result<StatusCode, LogError> {
    let content = decode_content(&request.content)?;
    service.append_log(&content).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn append_logs(
    State(service): State<LogService>,
    Json(request): Json<AppendBatchRequest>,
) -> Result<StatusCode, LogError> {
    // Decode everything up front so a bad entry rejects the whole batch
    let contents = request
        .contents
        .iter()
        .map(|c| decode_content(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            warn!("Rejected append batch: {}", e);
            e
        })?;

    service.append_logs(&contents).await?;
    info!("Accepted append batch of {} entries", contents.len());
    Ok(StatusCode::NO_CONTENT)
}

async fn gen_path(
    State(service): State<LogService>,
    Path(index): Path<usize>,
) -> Result<Json<PathResponse>, LogError> {
    let path = service.gen_path(index).await?;
    Ok(Json(PathResponse {
        index,
        path: path.iter().map(encode_hash).collect(),
    }))
}

async fn gen_proof(
    State(service): State<LogService>,
    Query(query): Query<ProofQuery>,
) -> Result<Json<ProofResponse>, LogError> {
    let proof = service.gen_proof(query.size).await?;
    Ok(Json(ProofResponse {
        prior_size: query.size,
        proof: proof.iter().map(encode_hash).collect(),
    }))
}
