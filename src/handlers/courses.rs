use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    errors::ServiceError,
    services::catalog::CourseFilters,
    ApiResponse, AppState,
};

pub fn courses_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses))
        .route("/{id}", get(get_course))
}

/// Public course listing, served through the in-memory cache.
async fn list_courses(
    State(state): State<AppState>,
    Query(filters): Query<CourseFilters>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let cache_key = format!(
        "courses:{}",
        serde_json::to_string(&[
            filters.page.map(|p| p.to_string()).unwrap_or_default(),
            filters.limit.map(|l| l.to_string()).unwrap_or_default(),
            filters.search.clone().unwrap_or_default(),
            filters.category.clone().unwrap_or_default(),
            filters.level.clone().unwrap_or_default(),
            filters
                .price_tier
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            filters.min_price.map(|p| p.to_string()).unwrap_or_default(),
            filters.max_price.map(|p| p.to_string()).unwrap_or_default(),
        ])
        .unwrap_or_default()
    );

    if let Some(cached) = state.cache.get::<Value>(&cache_key) {
        return Ok(Json(ApiResponse::success(cached)));
    }

    let response = state.services.catalog.list_courses(filters).await?;
    let value = serde_json::to_value(&response)
        .map_err(|e| ServiceError::InternalError(format!("Response serialization failed: {e}")))?;

    let ttl = Duration::from_secs(state.config.catalog_cache_ttl_secs);
    if let Err(err) = state.cache.set(&cache_key, &value, Some(ttl)) {
        tracing::warn!(%err, "failed to cache course list");
    }

    Ok(Json(ApiResponse::success(value)))
}

async fn get_course(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<crate::services::catalog::CourseDetail>>, ServiceError> {
    let detail = state.services.catalog.get_course(id).await?;
    Ok(Json(ApiResponse::success(detail)))
}
