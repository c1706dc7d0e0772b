use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{AuthenticatedUser, RegisterInput},
    errors::ServiceError,
    handlers::common::{check_auth_rate_limit, validate_input},
    ApiResponse, AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/me", get(me))
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ServiceError> {
    check_auth_rate_limit(&state, &headers)?;
    validate_input(&payload)?;

    let user = state
        .auth
        .register(RegisterInput {
            email: payload.email,
            password: payload.password,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await?;

    let body = ApiResponse::success_with_message(
        json!({
            "user": {
                "id": user.id,
                "firstName": user.first_name,
                "lastName": user.last_name,
                "email": user.email,
            }
        }),
        "Registration successful".to_string(),
    );
    Ok((StatusCode::CREATED, Json(body)))
}

async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    check_auth_rate_limit(&state, &headers)?;
    validate_input(&payload)?;

    let (user, tokens) = state.auth.login(&payload.email, &payload.password).await?;

    Ok(Json(ApiResponse::success(json!({
        "user": UserView {
            id: user.id,
            name: format!("{} {}", user.first_name, user.last_name),
            email: user.email,
            role: user.role,
        },
        "token": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    }))))
}

async fn refresh_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<Value>>, ServiceError> {
    check_auth_rate_limit(&state, &headers)?;

    let tokens = state.auth.refresh(&payload.refresh_token).await?;

    Ok(Json(ApiResponse::success(json!({
        "token": tokens.access_token,
        "refreshToken": tokens.refresh_token,
    }))))
}

async fn me(user: AuthenticatedUser) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "id": user.user_id,
        "email": user.email,
        "role": user.role,
    })))
}
