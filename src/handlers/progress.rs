use axum::{
    extract::{Json, Path, State},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::enrollment::{CompleteLessonResult, CourseProgress, WatchTimeResult},
    ApiResponse, AppState,
};

pub fn progress_routes() -> Router<AppState> {
    Router::new()
        .route("/lesson/{lesson_id}/watch-time", post(record_watch_time))
        .route("/lesson/{lesson_id}/complete", post(complete_lesson))
        .route("/course/{course_id}", get(course_progress))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WatchTimeRequest {
    #[serde(default)]
    pub seconds: i32,
}

async fn record_watch_time(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
    Json(payload): Json<WatchTimeRequest>,
) -> Result<Json<ApiResponse<WatchTimeResult>>, ServiceError> {
    let result = state
        .services
        .progress
        .record_watch_time(user.user_id, lesson_id, payload.seconds)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn complete_lesson(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CompleteLessonResult>>, ServiceError> {
    let result = state
        .services
        .progress
        .complete_lesson(user.user_id, lesson_id)
        .await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn course_progress(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<CourseProgress>>, ServiceError> {
    let progress = state
        .services
        .progress
        .get_course_progress(user.user_id, course_id)
        .await?;
    Ok(Json(ApiResponse::success(progress)))
}
