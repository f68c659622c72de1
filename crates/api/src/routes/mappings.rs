//! Gesture mapping routes

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::{ApiError, SharedState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingsResponse {
    pub mappings: BTreeMap<String, String>,
    pub available_actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct MappingRequest {
    pub action: String,
}

#[derive(Debug, Serialize)]
pub struct MappingResponse {
    pub gesture: String,
    pub action: String,
}

/// Store I/O may hit the filesystem, so it runs on the blocking pool
pub async fn get_mappings(State(state): State<SharedState>) -> Result<Json<MappingsResponse>, ApiError> {
    let store = state.service.mapping_store();
    let available_actions = store.available_actions().iter().map(|a| a.to_string()).collect();
    let mappings = tokio::task::spawn_blocking(move || store.mappings()).await??;
    Ok(Json(MappingsResponse {
        mappings,
        available_actions,
    }))
}

/// Single mapping edit; takes effect on the next gesture pass
pub async fn put_mapping(
    State(state): State<SharedState>,
    Path(gesture): Path<String>,
    Json(request): Json<MappingRequest>,
) -> Result<Json<MappingResponse>, ApiError> {
    let store = state.service.mapping_store();
    let (g, a) = (gesture.clone(), request.action.clone());
    tokio::task::spawn_blocking(move || store.set(&g, &a)).await??;
    metrics::counter!("api_mapping_updates_total").increment(1);
    info!("Mapping updated: {} -> {}", gesture, request.action);
    Ok(Json(MappingResponse {
        gesture,
        action: request.action,
    }))
}
