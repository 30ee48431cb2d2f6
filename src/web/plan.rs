use crate::domain::plan::{DayPlan, PlanRecord, WellnessPlan};
use crate::services::wellness::{self, TodayView};
use crate::state::SharedState;
use crate::web::reject;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
struct CompletionPayload {
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct PlanPayload {
    plan: Vec<DayPlan>,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/plan", get(get_plan).put(replace_plan))
        .route("/plan/today", get(get_today))
        .route("/plan/activities/:activity_id", post(set_completion))
        .with_state(state)
}

async fn get_plan(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<PlanRecord>, StatusCode> {
    match state.plans.load(&user_id).await {
        Ok(Some(record)) => Ok(Json(record)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => Err(reject("load plan", e)),
    }
}

async fn get_today(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<TodayView>, StatusCode> {
    let view = wellness::plan_today(&state, &user_id)
        .await
        .map_err(|e| reject("plan today", e))?;
    Ok(Json(view))
}

async fn set_completion(
    Path((user_id, activity_id)): Path<(String, Uuid)>,
    State(state): State<SharedState>,
    Json(payload): Json<CompletionPayload>,
) -> Result<StatusCode, StatusCode> {
    let updated = state
        .plans
        .update_completion(&user_id, activity_id, payload.completed)
        .await
        .map_err(|e| reject("update completion", e))?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn replace_plan(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
    Json(payload): Json<PlanPayload>,
) -> Result<StatusCode, StatusCode> {
    let plan = WellnessPlan::from_days(payload.plan).map_err(|days| {
        tracing::debug!("Rejected plan update for {} with days {:?}", user_id, days);
        StatusCode::BAD_REQUEST
    })?;
    state
        .plans
        .update_plan(&user_id, plan)
        .await
        .map_err(|e| reject("update plan", e))?;
    Ok(StatusCode::NO_CONTENT)
}
