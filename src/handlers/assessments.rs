use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::assessments::{AnswerInput, AttemptResult, AttemptStarted},
    ApiResponse, AppState,
};

pub fn assessments_routes() -> Router<AppState> {
    Router::new()
        .route("/{quiz_id}/attempts", post(start_attempt))
        .route("/attempts/{attempt_id}/submit", post(submit_attempt))
}

pub fn certificates_routes() -> Router<AppState> {
    Router::new().route("/{number}/verify", get(verify_certificate))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitAttemptRequest {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}

async fn start_attempt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(quiz_id): Path<Uuid>,
) -> Result<(StatusCode, Json<ApiResponse<AttemptStarted>>), ServiceError> {
    let attempt = state
        .services
        .assessments
        .start_attempt(user.user_id, quiz_id)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(attempt))))
}

async fn submit_attempt(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(attempt_id): Path<Uuid>,
    Json(payload): Json<SubmitAttemptRequest>,
) -> Result<Json<ApiResponse<AttemptResult>>, ServiceError> {
    let result = state
        .services
        .assessments
        .submit_attempt(user.user_id, attempt_id, payload.answers)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn verify_certificate(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let valid = state.services.certificates.verify(&number).await?;
    Ok(Json(ApiResponse::success(json!({ "valid": valid }))))
}
