//! Latest-value status routes

use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use crate::SharedState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: Option<String>,
}

/// Latest gesture event, `null` before the first gesture pass
pub async fn get_gesture(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.service.snapshot().gesture)
}

/// Latest vitals, `null` before the first sample
pub async fn get_vitals(State(state): State<SharedState>) -> impl IntoResponse {
    Json(state.service.snapshot().health)
}

pub async fn get_status(State(state): State<SharedState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.service.snapshot().status,
    })
}
