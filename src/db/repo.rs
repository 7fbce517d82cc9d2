use async_trait::async_trait;

use super::model::*;

/// Session lookup for the bearer tokens handed out by the auth provider.
#[async_trait]
pub trait SessionRepo: Send + Sync {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken>;
}

/// Favorites are always addressed by `(user_id, movie_id)`.
#[async_trait]
pub trait FavoriteRepo: Send + Sync {
    async fn list_favorites(&self, user_id: &str) -> DbResult<Vec<Favorite>>;
    async fn add_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<Favorite>;
    /// Returns the number of rows removed.
    async fn delete_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<u64>;
}

pub trait Repository: SessionRepo + FavoriteRepo + Send + Sync {}

impl<T: SessionRepo + FavoriteRepo + Send + Sync> Repository for T {}
