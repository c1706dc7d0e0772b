use axum::{
    extract::{Json, Path, Query, State},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::orders::CreateOrderInput,
    ApiResponse, AppState, ListQuery,
};

pub fn orders_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/create", post(create_order))
        .route("/{order_id}/confirm-payment", post(confirm_payment))
}

async fn create_order(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateOrderInput>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let order = state
        .services
        .orders
        .create_order(user.user_id, payload)
        .await?;

    Ok(Json(ApiResponse::success(json!({ "order": order }))))
}

async fn confirm_payment(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let result = state.services.orders.confirm_payment(order_id).await?;

    let message = if result.status == "completed" {
        "Payment confirmed and courses enrolled"
    } else {
        "Payment not finalized yet"
    };

    Ok(Json(ApiResponse::success_with_message(
        json!({ "order": result }),
        message.to_string(),
    )))
}

async fn list_orders(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let (orders, total) = state
        .services
        .orders
        .list_orders(user.user_id, query.page, query.limit)
        .await?;

    Ok(Json(ApiResponse::success(json!({
        "orders": orders,
        "total": total,
        "page": query.page,
        "limit": query.limit,
    }))))
}
