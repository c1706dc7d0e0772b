use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::{
    auth::AuthenticatedUser,
    entities::coupon,
    errors::ServiceError,
    services::coupons::CreateCouponInput,
    ApiResponse, AppState, ListQuery,
};

/// Coupon management, admin only.
pub fn coupons_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_coupon))
        .route("/", get(list_coupons))
}

fn require_admin(user: &AuthenticatedUser) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "Admin role required".to_string(),
        ))
    }
}

async fn create_coupon(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCouponInput>,
) -> Result<(StatusCode, Json<ApiResponse<coupon::Model>>), ServiceError> {
    require_admin(&user)?;

    let created = state.services.coupons.create_coupon(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(created))))
}

async fn list_coupons(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    require_admin(&user)?;

    let (coupons, total) = state
        .services
        .coupons
        .list_coupons(query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(json!({
        "coupons": coupons,
        "total": total,
        "page": query.page,
        "limit": query.limit,
    }))))
}
