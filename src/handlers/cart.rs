use axum::{
    extract::{Json, Path, State},
    routing::{delete, get, post},
    Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    auth::AuthenticatedUser,
    errors::ServiceError,
    services::cart::{AddToCartInput, CartSnapshot},
    ApiResponse, AppState,
};

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart))
        .route("/add", post(add_to_cart))
        .route("/remove/{course_id}", delete(remove_from_cart))
}

async fn get_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<CartSnapshot>>, ServiceError> {
    let cart = state.services.cart.get_cart(user.user_id).await?;
    Ok(Json(ApiResponse::success(cart)))
}

async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<AddToCartInput>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let result = state.services.cart.add_item(user.user_id, payload).await?;

    Ok(Json(ApiResponse::success_with_message(
        json!({
            "cartItem": result.cart_item,
            "cartTotal": result.cart_total,
        }),
        "Course added to cart".to_string(),
    )))
}

async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(course_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    let cart_total = state
        .services
        .cart
        .remove_item(user.user_id, course_id)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        json!({ "cartTotal": cart_total }),
        "Course removed from cart".to_string(),
    )))
}
