//! Login and signup routes

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::RequestContext;

// ==================== Input Validation ====================

/// Maximum allowed username length
const MAX_USERNAME_LENGTH: usize = 64;
/// Maximum allowed password length
const MAX_PASSWORD_LENGTH: usize = 256;
/// Minimum allowed password length for new accounts
const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate username format and length
fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::bad_request("username", "Username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ApiError::bad_request(
            "username",
            format!(
                "Username exceeds maximum length of {} characters",
                MAX_USERNAME_LENGTH
            ),
        ));
    }
    // Only allow alphanumeric characters, underscores, and hyphens
    if !username.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(ApiError::bad_request(
            "username",
            "Username can only contain alphanumeric characters, underscores, and hyphens",
        ));
    }
    Ok(())
}

fn validate_password(password: &str, min_length: usize) -> Result<(), ApiError> {
    if password.len() < min_length {
        return Err(ApiError::bad_request(
            "password",
            format!("Password must be at least {} characters long", min_length),
        ));
    }
    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ApiError::bad_request(
            "password",
            format!(
                "Password exceeds maximum length of {} characters",
                MAX_PASSWORD_LENGTH
            ),
        ));
    }
    Ok(())
}

// ==================== Types ====================

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: i64,
}

// ==================== Routes ====================

/// POST /user/login
async fn login(
    RequestContext(ctx): RequestContext,
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password, 1)?;

    debug!("Login attempt for user: {}", request.username);

    let token = state
        .auth
        .login(&ctx, &request.username, &request.password)
        .await?;

    Ok(Json(LoginResponse { token }))
}

/// POST /user/signup
async fn signup(
    RequestContext(ctx): RequestContext,
    State(state): State<AppState>,
    Json(request): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    validate_username(&request.username)?;
    validate_password(&request.password, MIN_PASSWORD_LENGTH)?;

    let id = state
        .auth
        .save_user(&ctx, &request.username, &request.password)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user/login", post(login))
        .route("/user/signup", post(signup))
}
