//! LearnHub API Library
//!
//! Backend for an e-learning marketplace: course catalog with tiered
//! pricing, per-user cart, coupon-discounted checkout against an external
//! payment provider, enrollment with lesson-level progress tracking, and
//! quiz-based certification.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod rate_limiter;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::OpenApi;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
    pub cache: Arc<cache::InMemoryCache>,
    pub rate_limiter: Arc<rate_limiter::RateLimiter>,
}

/// Common query parameters for list endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

/// Success envelope: `{"success": true, "data": ..., "message"?: ...}`.
/// Errors use the matching failure envelope via [`errors::ServiceError`].
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// Builds the `/api` router. State is attached by the caller.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/status", get(api_status))
        .route("/docs/openapi.json", get(openapi_document))
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/courses", handlers::courses::courses_routes())
        .nest("/cart", handlers::cart::cart_routes())
        .nest("/orders", handlers::orders::orders_routes())
        .nest("/progress", handlers::progress::progress_routes())
        .nest("/assessments", handlers::assessments::assessments_routes())
        .nest("/certificates", handlers::assessments::certificates_routes())
        .nest("/coupons", handlers::coupons::coupons_routes())
}

async fn api_status() -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(json!({
        "status": "ok",
        "service": "learnhub-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn health_check(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let db_healthy = db::health_check(&state.db).await;
    Json(ApiResponse::success(json!({
        "status": if db_healthy { "healthy" } else { "unhealthy" },
        "checks": { "database": if db_healthy { "healthy" } else { "unhealthy" } },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(openapi::ApiDoc::openapi())
}
