use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::auth::{require_user, SessionUser};
use super::error::ApiError;
use crate::db::{Favorite, FavoriteRepo};
use crate::server::AppState;
use crate::util::QueryParams;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteFavoriteResponse {
    pub success: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddFavoriteRequest {
    pub movie_id: i64,
}

/// `movie_id` must be a positive integer.
pub fn parse_movie_id(raw: Option<&str>) -> Result<i64, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing movie_id in query".to_string()))?;

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::BadRequest(format!("Invalid movie_id: {}", raw))),
    }
}

/// Delete `user`'s favorite for `movie_id`. Whether a row existed is not
/// reported.
pub async fn delete_favorite<S: FavoriteRepo + ?Sized>(
    store: &S,
    user: &SessionUser,
    movie_id: i64,
) -> Result<DeleteFavoriteResponse, ApiError> {
    store
        .delete_favorite(&user.user_id, movie_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to delete favorite"))?;

    info!(user_id = %user.user_id, movie_id = movie_id, "Favorite removed");
    Ok(DeleteFavoriteResponse { success: true })
}

pub async fn add_favorite<S: FavoriteRepo + ?Sized>(
    store: &S,
    user: &SessionUser,
    movie_id: i64,
) -> Result<Favorite, ApiError> {
    if movie_id <= 0 {
        return Err(ApiError::BadRequest(format!("Invalid movie_id: {}", movie_id)));
    }
    store
        .add_favorite(&user.user_id, movie_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to add favorite"))
}

pub async fn list_favorites<S: FavoriteRepo + ?Sized>(
    store: &S,
    user: &SessionUser,
) -> Result<Vec<Favorite>, ApiError> {
    store
        .list_favorites(&user.user_id)
        .await
        .map_err(|e| ApiError::store(e, "Failed to list favorites"))
}

pub async fn delete_favorite_handler(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<DeleteFavoriteResponse>, ApiError> {
    let movie_id = parse_movie_id(params.get("movie_id"))?;
    let user = require_user(user.map(|Extension(u)| u))?;

    let response = delete_favorite(state.db.as_ref(), &user, movie_id).await?;
    Ok(Json(response))
}

pub async fn add_favorite_handler(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
    Json(req): Json<AddFavoriteRequest>,
) -> Result<Json<Favorite>, ApiError> {
    let user = require_user(user.map(|Extension(u)| u))?;

    let favorite = add_favorite(state.db.as_ref(), &user, req.movie_id).await?;
    Ok(Json(favorite))
}

pub async fn list_favorites_handler(
    State(state): State<AppState>,
    user: Option<Extension<SessionUser>>,
) -> Result<Json<Vec<Favorite>>, ApiError> {
    let user = require_user(user.map(|Extension(u)| u))?;

    let favorites = list_favorites(state.db.as_ref(), &user).await?;
    Ok(Json(favorites))
}
