use crate::services::wellness::{self, ChatReply, DailyRollover, LaunchView};
use crate::state::SharedState;
use crate::web::reject;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
struct ChatPayload {
    message: String,
}

#[derive(Debug, Default, Deserialize)]
struct RolloverPayload {
    #[serde(default)]
    greetings: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    summary: Option<String>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/launch", post(launch))
        .route("/emotions/daily", post(store_daily))
        .route("/emotions/summary", get(summary))
        .with_state(state)
}

async fn chat(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
    Json(payload): Json<ChatPayload>,
) -> Result<Json<ChatReply>, StatusCode> {
    let message = payload.message.trim();
    if message.is_empty() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let reply = wellness::chat(&state, &user_id, message)
        .await
        .map_err(|e| reject("chat", e))?;
    Ok(Json(reply))
}

async fn launch(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<LaunchView>, StatusCode> {
    let view = wellness::launch(&state, &user_id)
        .await
        .map_err(|e| reject("launch", e))?;
    Ok(Json(view))
}

async fn store_daily(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
    Json(payload): Json<RolloverPayload>,
) -> Result<Json<DailyRollover>, StatusCode> {
    let rollover = wellness::store_daily_emotions(&state, &user_id, &payload.greetings)
        .await
        .map_err(|e| reject("store daily emotions", e))?;
    Ok(Json(rollover))
}

async fn summary(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<SummaryResponse>, StatusCode> {
    let summary = wellness::latest_summary(&state, &user_id)
        .await
        .map_err(|e| reject("latest summary", e))?;
    Ok(Json(SummaryResponse { summary }))
}
