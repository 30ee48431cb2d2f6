use crate::domain::assessment::{answer_text, QUESTIONS};
use crate::domain::checkin::CheckSchedule;
use crate::services::wellness::{self, CheckOutcome};
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
struct CheckPayload {
    answers: Vec<u8>,
}

#[derive(Debug, Serialize)]
pub struct Questionnaire {
    questions: Vec<&'static str>,
    options: Vec<AnswerOption>,
}

#[derive(Debug, Serialize)]
pub struct AnswerOption {
    value: u8,
    text: &'static str,
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/checks", post(submit_check))
        .route("/checks/status", get(check_status))
        .with_state(state)
}

pub async fn questions() -> Json<Questionnaire> {
    let options = (1..=4)
        .filter_map(|value| answer_text(value).map(|text| AnswerOption { value, text }))
        .collect();
    Json(Questionnaire {
        questions: QUESTIONS.to_vec(),
        options,
    })
}

async fn submit_check(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
    Json(payload): Json<CheckPayload>,
) -> Result<Json<CheckOutcome>, StatusCode> {
    let outcome = wellness::submit_check(&state, &user_id, &payload.answers)
        .await
        .map_err(|e| reject("submit check", e))?;
    Ok(Json(outcome))
}

async fn check_status(
    Path(user_id): Path<String>,
    State(state): State<SharedState>,
) -> Result<Json<CheckSchedule>, StatusCode> {
    let schedule = wellness::check_status(&state, &user_id)
        .await
        .map_err(|e| reject("check status", e))?;
    Ok(Json(schedule))
}
