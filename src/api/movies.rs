use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use super::error::ApiError;
use crate::models::MovieQuery;
use crate::server::AppState;
use crate::util::QueryParams;

/// Turn `?page=&query=&sort_by=` into a normalized request. A missing,
/// non-numeric or zero page means page 1.
pub fn movie_query_from_params(params: &QueryParams) -> MovieQuery {
    let page = params
        .parse::<u32>("page")
        .filter(|p| *p >= 1)
        .unwrap_or(1);

    MovieQuery {
        page,
        query: params.get("query").unwrap_or_default().to_string(),
        sort_by: params.get_nonempty("sort_by").map(|s| s.to_string()),
    }
}

/// Relays the provider's result page as-is.
pub async fn get_movies(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<Value>, ApiError> {
    let query = movie_query_from_params(&params);

    let page = state
        .tmdb
        .movies(&query)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch movie data"))?;

    Ok(Json(page))
}

pub async fn get_genres(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let genres = state
        .tmdb
        .genres()
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch genres"))?;

    Ok(Json(genres))
}

pub async fn get_movie_images(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let movie_id = parse_path_id(&id)?;

    let images = state
        .tmdb
        .movie_images(movie_id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch movie images"))?;

    Ok(Json(images))
}

pub async fn get_movie_videos(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let movie_id = parse_path_id(&id)?;

    let videos = state
        .tmdb
        .movie_videos(movie_id)
        .await
        .map_err(|e| ApiError::upstream(e, "Failed to fetch movie videos"))?;

    Ok(Json(videos))
}

fn parse_path_id(id: &str) -> Result<u64, ApiError> {
    id.parse::<u64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid movie id: {}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        pairs.iter().map(|(k, v)| (*k, *v)).collect()
    }

    #[test]
    fn test_defaults() {
        let query = movie_query_from_params(&params(&[]));
        assert_eq!(query, MovieQuery::search(1, ""));
        assert!(!query.is_search());
        assert_eq!(query.sort_key(), "popularity.desc");
    }

    #[test]
    fn test_bad_page_is_page_one() {
        assert_eq!(movie_query_from_params(&params(&[("page", "abc")])).page, 1);
        assert_eq!(movie_query_from_params(&params(&[("page", "0")])).page, 1);
        assert_eq!(movie_query_from_params(&params(&[("page", "-4")])).page, 1);
        assert_eq!(movie_query_from_params(&params(&[("page", "7")])).page, 7);
    }

    #[test]
    fn test_query_and_sort() {
        let query = movie_query_from_params(&params(&[
            ("query", "batman"),
            ("sort_by", "vote_average.asc"),
        ]));
        assert!(query.is_search());
        assert_eq!(query.query, "batman");
        assert_eq!(query.sort_by.as_deref(), Some("vote_average.asc"));
    }

    #[test]
    fn test_parse_path_id() {
        assert_eq!(parse_path_id("603").unwrap(), 603);
        assert!(matches!(parse_path_id("abc"), Err(ApiError::BadRequest(_))));
    }
}
