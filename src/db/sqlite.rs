use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use super::model::*;
use super::repo::*;

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(db_path: &str) -> DbResult<Self> {
        let options = SqliteConnectOptions::from_str(db_path)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let repo = Self { pool };

        repo.init_schema().await?;

        info!("Database initialized at {}", db_path);

        Ok(repo)
    }

    async fn init_schema(&self) -> DbResult<()> {
        let schema = include_str!("schema.sql");
        sqlx::query(schema).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionRepo for SqliteRepository {
    async fn get_token(&self, token: &str) -> DbResult<AccessToken> {
        let access_token = sqlx::query_as::<_, AccessToken>(
            "SELECT token, userid, created, lastused FROM accesstokens WHERE token = ?",
        )
        .bind(token)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => DbError::NotFound("Token not found".to_string()),
            _ => DbError::Sqlx(e),
        })?;

        sqlx::query("UPDATE accesstokens SET lastused = ? WHERE token = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(access_token)
    }
}

#[async_trait]
impl FavoriteRepo for SqliteRepository {
    async fn list_favorites(&self, user_id: &str) -> DbResult<Vec<Favorite>> {
        let favorites = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, created FROM favorites WHERE user_id = ? ORDER BY created, movie_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(favorites)
    }

    async fn add_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<Favorite> {
        sqlx::query(
            "INSERT INTO favorites (id, user_id, movie_id, created) VALUES (?, ?, ?, ?)
             ON CONFLICT (user_id, movie_id) DO NOTHING",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(user_id)
        .bind(movie_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        let favorite = sqlx::query_as::<_, Favorite>(
            "SELECT id, user_id, movie_id, created FROM favorites WHERE user_id = ? AND movie_id = ?",
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(favorite)
    }

    async fn delete_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM favorites WHERE movie_id = ? AND user_id = ?")
            .bind(movie_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        debug!(
            user_id = %user_id,
            movie_id = movie_id,
            rows = result.rows_affected(),
            "Deleted favorite"
        );
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_repo(dir: &tempfile::TempDir) -> SqliteRepository {
        let path = dir.path().join("test.db");
        SqliteRepository::new(path.to_str().unwrap()).await.unwrap()
    }

    #[tokio::test]
    async fn test_get_token_touches_lastused() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        sqlx::query("INSERT INTO accesstokens (token, userid, created) VALUES (?, ?, ?)")
            .bind("tok-1")
            .bind("user-a")
            .bind(Utc::now().to_rfc3339())
            .execute(&repo.pool)
            .await
            .unwrap();

        let token = repo.get_token("tok-1").await.unwrap();
        assert_eq!(token.userid, "user-a");
        assert!(token.lastused.is_none());

        let token = repo.get_token("tok-1").await.unwrap();
        assert!(token.lastused.is_some());

        assert!(matches!(
            repo.get_token("tok-2").await,
            Err(DbError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_add_favorite_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        let first = repo.add_favorite("user-a", 603).await.unwrap();
        let second = repo.add_favorite("user-a", 603).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(repo.list_favorites("user-a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_user() {
        let dir = tempfile::tempdir().unwrap();
        let repo = open_repo(&dir).await;

        repo.add_favorite("user-a", 123).await.unwrap();
        repo.add_favorite("user-b", 123).await.unwrap();
        repo.add_favorite("user-a", 456).await.unwrap();

        assert_eq!(repo.delete_favorite("user-a", 123).await.unwrap(), 1);
        assert_eq!(repo.delete_favorite("user-a", 123).await.unwrap(), 0);

        let remaining_a: Vec<i64> = repo
            .list_favorites("user-a")
            .await
            .unwrap()
            .iter()
            .map(|f| f.movie_id)
            .collect();
        assert_eq!(remaining_a, vec![456]);
        assert_eq!(repo.list_favorites("user-b").await.unwrap().len(), 1);
    }
}
