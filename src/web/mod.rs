pub mod checks;
pub mod emotions;
pub mod plan;
pub mod preferences;

use crate::error::WellnessError;
use crate::state::SharedState;
use axum::{http::StatusCode, routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

/// Generation failures map to 502 so clients can tell them apart from a
/// slow request and offer a retry.
pub fn status_for(err: &WellnessError) -> StatusCode {
    match err {
        WellnessError::Transport(_) => StatusCode::SERVICE_UNAVAILABLE,
        WellnessError::Upstream { .. }
        | WellnessError::StructureValidation { .. }
        | WellnessError::IncompletePlan { .. } => StatusCode::BAD_GATEWAY,
        WellnessError::NotFound(_) => StatusCode::NOT_FOUND,
        WellnessError::InvalidAssessment(_) => StatusCode::BAD_REQUEST,
        WellnessError::Persistence(_) | WellnessError::Corrupt(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn reject(action: &str, err: WellnessError) -> StatusCode {
    let status = status_for(&err);
    if err.is_generation_failure() {
        tracing::warn!("Plan generation failed during {}: {}", action, err);
    } else if status.is_server_error() {
        tracing::error!("Failed to {}: {}", action, err);
    } else {
        tracing::debug!("Rejected {}: {}", action, err);
    }
    status
}

pub fn routes(state: SharedState) -> Router {
    let user = Router::new()
        .merge(checks::router(state.clone()))
        .merge(plan::router(state.clone()))
        .merge(preferences::router(state.clone()))
        .merge(emotions::router(state));

    Router::new()
        .route("/health", get(health))
        .route("/api/questions", get(checks::questions))
        .nest("/api/users/:user_id", user)
}
