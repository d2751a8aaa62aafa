//! City catalog routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use travel_core::CityWithComments;

use crate::error::ApiError;
use crate::state::AppState;

use super::auth::{RequestContext, RequireAdmin, RequireUser};
use super::users::CreatedResponse;

/// Most comments returned per city
const MAX_COMMENTS: u32 = 100;
/// Longest accepted comment text in bytes
const MAX_COMMENT_LENGTH: usize = 4096;

#[derive(Debug, Default, Deserialize)]
pub struct CommentsQuery {
    #[serde(default)]
    pub comments: u32,
}

impl CommentsQuery {
    fn limit(&self) -> Result<u32, ApiError> {
        if self.comments > MAX_COMMENTS {
            return Err(ApiError::bad_request(
                "comments",
                format!("At most {} comments can be requested", MAX_COMMENTS),
            ));
        }
        Ok(self.comments)
    }
}

#[derive(Debug, Deserialize)]
pub struct CityRequest {
    pub name: String,
    pub country: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub text: String,
}

/// GET /cities
async fn list_cities(
    RequestContext(ctx): RequestContext,
    State(state): State<AppState>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<Vec<CityWithComments>>, ApiError> {
    let cities = state.cities.list_cities(&ctx, query.limit()?).await?;
    Ok(Json(cities))
}

/// GET /cities/{id}
async fn get_city(
    RequestContext(ctx): RequestContext,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<CommentsQuery>,
) -> Result<Json<CityWithComments>, ApiError> {
    let city = state.cities.get_city(&ctx, id, query.limit()?).await?;
    Ok(Json(city))
}

/// POST /cities
async fn create_city(
    RequestContext(ctx): RequestContext,
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(request): Json<CityRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let ctx = ctx.with("username", &user.username);
    let id = state
        .cities
        .create_city(&ctx, &request.name, &request.country)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PUT /cities/{id}
async fn update_city(
    RequestContext(ctx): RequestContext,
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CityRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = ctx.with("username", &user.username);
    state
        .cities
        .update_city(&ctx, id, &request.name, &request.country)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /cities/{id} (Admin only)
async fn delete_city(
    RequestContext(ctx): RequestContext,
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = ctx.with("username", &admin.username);
    state.cities.delete_city(&ctx, id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /cities/{id}/comments
async fn add_comment(
    RequestContext(ctx): RequestContext,
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    if request.text.len() > MAX_COMMENT_LENGTH {
        return Err(ApiError::bad_request(
            "text",
            format!("Comment exceeds maximum length of {} bytes", MAX_COMMENT_LENGTH),
        ));
    }

    let ctx = ctx.with("username", &user.username);
    let comment_id = state
        .cities
        .add_comment(&ctx, id, user.id, &request.text)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: comment_id })))
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/cities", get(list_cities).post(create_city))
        .route(
            "/cities/{id}",
            get(get_city).put(update_city).delete(delete_city),
        )
        .route("/cities/{id}/comments", post(add_comment))
}
