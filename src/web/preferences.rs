use crate::state::SharedState;
use crate::web::reject;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct ScorePayload {
    score: f64,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/preferences", get(get_preferences))
        .route("/preferences/:activity", put(set_preference))
        .with_state(state)
}

async fn get_preferences(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<BTreeMap<String, f64>>, StatusCode> {
    let prefs = state
        .records
        .preferences(&user_id)
        .await
        .map_err(|e| reject("load preferences", e))?;
    Ok(Json(prefs))
}

async fn set_preference(
    Path((user_id, activity)): Path<(String, String)>,
    State(state): State<SharedState>,
    Json(payload): Json<ScorePayload>,
) -> Result<Json<BTreeMap<String, f64>>, StatusCode> {
    if !(0.0..=100.0).contains(&payload.score) || activity.trim().is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }

    state
        .records
        .set_preference(&user_id, activity.trim(), payload.score)
        .await
        .map_err(|e| reject("set preference", e))?;

    let prefs = state
        .records
        .preferences(&user_id)
        .await
        .map_err(|e| reject("load preferences", e))?;
    Ok(Json(prefs))
}
