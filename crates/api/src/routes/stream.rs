//! Stream control routes

use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::{ApiError, SharedState};

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    pub url: String,
}

/// Replace the current stream; connection progress arrives as status
pub async fn start_stream(
    State(state): State<SharedState>,
    Json(request): Json<StreamRequest>,
) -> Result<StatusCode, ApiError> {
    state.service.start_stream(&request.url).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn stop_stream(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
    state.service.stop_stream().await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reset_calm_mode(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
    state.service.reset_calm_mode()?;
    Ok(StatusCode::ACCEPTED)
}
