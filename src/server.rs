use axum::{
    extract::Request,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::api::{self, ApiError};
use crate::config::Config;
use crate::db::Repository;
use crate::tmdb::TmdbClient;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub tmdb: Arc<TmdbClient>,
    pub db: Arc<dyn Repository>,
}

impl AppState {
    pub fn new(config: Config, tmdb: Arc<TmdbClient>, db: Arc<dyn Repository>) -> Self {
        Self {
            config: Arc::new(config),
            tmdb,
            db,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let movie_routes = Router::new()
        .route("/api/movies", get(api::get_movies))
        .route("/api/genres", get(api::get_genres))
        .route("/api/movie/:id/images", get(api::get_movie_images))
        .route("/api/movie/:id/videos", get(api::get_movie_videos));

    let favorite_routes = Router::new()
        .route(
            "/api/favorites",
            get(api::list_favorites_handler)
                .post(api::add_favorite_handler)
                .delete(api::delete_favorite_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            api::session_middleware,
        ));

    let mut router = Router::new()
        .route("/robots.txt", get(robots_txt_handler))
        .merge(movie_routes)
        .merge(favorite_routes)
        .fallback(fallback_handler);

    if let Some(ref appdir) = state.config.appdir {
        router = router.fallback_service(ServeDir::new(appdir));
    }

    router
        .layer(axum::middleware::from_fn(crate::middleware::log_request))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn robots_txt_handler() -> &'static str {
    "User-agent: *\nDisallow: /\n"
}

async fn fallback_handler(req: Request) -> Response {
    if req.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    ApiError::NotFound(format!("No route for {}", req.uri().path())).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ErrorBody;
    use crate::config::TmdbConfig;
    use crate::db::{
        AccessToken, DbError, DbResult, Favorite, FavoriteRepo, SessionRepo,
    };
    use crate::models::{GenresResponse, ResultPage};
    use async_trait::async_trait;
    use axum::body::Body;
    use std::sync::Mutex;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_BODY: &str =
        r#"{"page":1,"results":[{"id":1,"title":"A"}],"total_pages":1,"total_results":1}"#;

    #[derive(Default)]
    struct StubRepo {
        favorite_calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SessionRepo for StubRepo {
        async fn get_token(&self, token: &str) -> DbResult<AccessToken> {
            if token == "good-token" {
                Ok(AccessToken {
                    token: token.to_string(),
                    userid: "user-42".to_string(),
                    created: None,
                    lastused: None,
                })
            } else {
                Err(DbError::NotFound("Token not found".to_string()))
            }
        }
    }

    #[async_trait]
    impl FavoriteRepo for StubRepo {
        async fn list_favorites(&self, user_id: &str) -> DbResult<Vec<Favorite>> {
            self.favorite_calls
                .lock()
                .unwrap()
                .push(format!("list {}", user_id));
            Ok(Vec::new())
        }

        async fn add_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<Favorite> {
            self.favorite_calls
                .lock()
                .unwrap()
                .push(format!("add {} {}", user_id, movie_id));
            Ok(Favorite {
                id: "fav-1".to_string(),
                user_id: user_id.to_string(),
                movie_id,
                created: "2024-01-01T00:00:00+00:00".to_string(),
            })
        }

        async fn delete_favorite(&self, user_id: &str, movie_id: i64) -> DbResult<u64> {
            self.favorite_calls
                .lock()
                .unwrap()
                .push(format!("delete {} {}", user_id, movie_id));
            Ok(1)
        }
    }

    fn test_config(base_url: String) -> Config {
        Config {
            listen: Default::default(),
            appdir: None,
            tmdb: TmdbConfig::new(base_url, "test-token"),
            database: Default::default(),
        }
    }

    fn test_app(server: &MockServer, repo: Arc<StubRepo>) -> Router {
        app_with_config(test_config(format!("{}/3/", server.uri())), repo)
    }

    fn app_with_config(config: Config, repo: Arc<StubRepo>) -> Router {
        let tmdb = Arc::new(TmdbClient::new(&config.tmdb).unwrap());
        build_router(AppState::new(config, tmdb, repo))
    }

    async fn send(app: Router, req: axum::http::Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(req).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    fn get(uri: &str) -> axum::http::Request<Body> {
        axum::http::Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn delete(uri: &str, token: Option<&str>) -> axum::http::Request<Body> {
        let mut builder = axum::http::Request::builder()
            .method(Method::DELETE)
            .uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_movies_without_query_uses_discover_sort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .and(query_param("sort_by", "vote_average.asc"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(
            app,
            get("/api/movies?page=2&query=&sort_by=vote_average.asc"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let page: ResultPage = serde_json::from_slice(&body).unwrap();
        assert_eq!(page.results[0].title, "A");
    }

    #[tokio::test]
    async fn test_movies_with_query_ignores_sort() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/search/movie"))
            .and(query_param("query", "batman"))
            .and(query_param_is_missing("sort_by"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE_BODY))
            .expect(1)
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, _) = send(
            app,
            get("/api/movies?query=batman&sort_by=vote_average.asc"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_genres_passthrough() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"genres":[{"id":28,"name":"Action"}]}"#),
            )
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/genres")).await;
        assert_eq!(status, StatusCode::OK);
        let genres: GenresResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(genres.genres[0].name, "Action");
    }

    #[tokio::test]
    async fn test_movies_body_is_not_rewritten() {
        let server = MockServer::start().await;
        let upstream = r#"{"page":1,"results":[{"id":1,"title":"A","original_language":"en","video":false}],"total_pages":1,"total_results":1}"#;
        Mock::given(method("GET"))
            .and(path("/3/discover/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_string(upstream))
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/movies")).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::from_str::<serde_json::Value>(upstream).unwrap());
        assert_eq!(value["results"][0]["original_language"], "en");
        assert!(value["results"][0].get("popularity").is_none());
    }

    #[tokio::test]
    async fn test_videos_keep_provider_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/5/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"id":5,"results":[{"id":"v1","key":"k","name":"Trailer","site":"YouTube",
                "type":"Trailer","iso_639_1":"en","iso_3166_1":"US"}]}"#,
            ))
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/movie/5/videos")).await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["results"][0]["iso_639_1"], "en");
        assert_eq!(value["results"][0]["iso_3166_1"], "US");
    }

    #[tokio::test]
    async fn test_upstream_timeout_is_500_with_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/genre/movie/list"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"genres":[]}"#)
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut config = test_config(format!("{}/3/", server.uri()));
        config.tmdb.timeout_secs = 1;
        let app = app_with_config(config, Arc::new(StubRepo::default()));

        let (status, body) = send(app, get("/api/genres")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"statusCode": 500, "message": "Failed to fetch genres"})
        );
    }

    #[tokio::test]
    async fn test_upstream_404_is_structured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/999999/images"))
            .respond_with(ResponseTemplate::new(404).set_body_string(
                r#"{"success":false,"status_code":34,"status_message":"The resource you requested could not be found."}"#,
            ))
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/movie/999999/images")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.status_code, 404);
        assert_eq!(
            error.message,
            "The resource you requested could not be found."
        );
    }

    #[tokio::test]
    async fn test_upstream_garbage_is_500_with_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/3/movie/7/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/movie/7/videos")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.message, "Failed to fetch movie videos");
    }

    #[tokio::test]
    async fn test_invalid_movie_path_id() {
        let server = MockServer::start().await;
        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, _) = send(app, get("/api/movie/abc/images")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_favorite_without_movie_id() {
        let server = MockServer::start().await;
        let repo = Arc::new(StubRepo::default());
        let app = test_app(&server, repo.clone());

        let (status, body) = send(app, delete("/api/favorites", Some("good-token"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.status_code, 400);
        assert!(repo.favorite_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_favorite_unauthenticated() {
        let server = MockServer::start().await;
        let repo = Arc::new(StubRepo::default());

        let (status, _) = send(
            test_app(&server, repo.clone()),
            delete("/api/favorites?movie_id=123", None),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            test_app(&server, repo.clone()),
            delete("/api/favorites?movie_id=123", Some("bad-token")),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(repo.favorite_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_favorite_scoped_to_session_user() {
        let server = MockServer::start().await;
        let repo = Arc::new(StubRepo::default());
        let app = test_app(&server, repo.clone());

        let (status, body) = send(
            app,
            delete("/api/favorites?movie_id=123", Some("good-token")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"success": true}));
        assert_eq!(
            *repo.favorite_calls.lock().unwrap(),
            vec!["delete user-42 123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_add_and_list_favorites_require_session() {
        let server = MockServer::start().await;
        let repo = Arc::new(StubRepo::default());

        let (status, _) = send(test_app(&server, repo.clone()), get("/api/favorites")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let req = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/favorites")
            .header("authorization", "Bearer good-token")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"movie_id":603}"#))
            .unwrap();
        let (status, body) = send(test_app(&server, repo.clone()), req).await;
        assert_eq!(status, StatusCode::OK);
        let favorite: Favorite = serde_json::from_slice(&body).unwrap();
        assert_eq!(favorite.movie_id, 603);
        assert_eq!(favorite.user_id, "user-42");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let server = MockServer::start().await;
        let app = test_app(&server, Arc::new(StubRepo::default()));
        let (status, body) = send(app, get("/api/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error: ErrorBody = serde_json::from_slice(&body).unwrap();
        assert_eq!(error.status_code, 404);
    }
}
