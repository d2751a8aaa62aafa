//! Request context and authentication extractors

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;
use travel_auth::{AuthError, RequiredRole};
use travel_core::LogContext;
use travel_db::{User, UserRole};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Log context for the current request, tagged with a request ID
///
/// The context is created once per request and cached in the request
/// extensions, so every extractor of the same request sees the same ID.
pub struct RequestContext(pub LogContext);

fn request_context(parts: &mut Parts) -> LogContext {
    if let Some(ctx) = parts.extensions.get::<LogContext>() {
        return ctx.clone();
    }
    let ctx = LogContext::new()
        .with("request_id", Uuid::new_v4())
        .with("method", &parts.method)
        .with("path", parts.uri.path());
    parts.extensions.insert(ctx.clone());
    ctx
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(RequestContext(request_context(parts)))
    }
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(AuthError::MissingAuthHeader.to_string()))?;

    header
        .strip_prefix("Bearer ")
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::Unauthorized(AuthError::InvalidAuthHeader.to_string()))
}

async fn authenticate<S>(parts: &mut Parts, state: &S, required: RequiredRole) -> Result<User, ApiError>
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    let app_state = AppState::from_ref(state);
    let ctx = request_context(parts);
    let token = bearer_token(parts)?;

    Ok(app_state.auth.authenticate(&ctx, token, required).await?)
}

/// Extractor for any authenticated user
pub struct RequireUser(pub User);

impl<S> FromRequestParts<S> for RequireUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, RequiredRole::Any).await.map(RequireUser)
    }
}

/// Extractor for a user whose token and stored role are both ADMIN
pub struct RequireAdmin(pub User);

impl<S> FromRequestParts<S> for RequireAdmin
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        authenticate(parts, state, RequiredRole::Exactly(UserRole::Admin))
            .await
            .map(RequireAdmin)
    }
}
