use axum::http::HeaderMap;
use validator::Validate;

use crate::{errors::ServiceError, AppState};

/// Validates a request DTO, mapping failures into the standard envelope.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), ServiceError> {
    input
        .validate()
        .map_err(|e| ServiceError::ValidationError(e.to_string()))
}

/// Rate-limit check for the auth endpoints, keyed by forwarded client
/// address. Direct connections without a proxy header share one bucket.
pub fn check_auth_rate_limit(state: &AppState, headers: &HeaderMap) -> Result<(), ServiceError> {
    let key = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .unwrap_or("direct")
        .trim()
        .to_string();

    if state.rate_limiter.check(&key) {
        Ok(())
    } else {
        Err(ServiceError::RateLimitExceeded)
    }
}
