use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use super::error::{TmdbError, TmdbResult};
use crate::config::TmdbConfig;
use crate::models::{GenresResponse, ImagesResponse, MovieQuery, ResultPage, VideosResponse};

/// Upstream call resolved from a normalized movie listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub path: &'static str,
    pub params: Vec<(&'static str, String)>,
}

/// Free-text search when a query is present, sorted discovery otherwise.
/// The search endpoint takes no sort key.
pub fn resolve_movie_request(query: &MovieQuery, language: &str) -> UpstreamRequest {
    if query.is_search() {
        UpstreamRequest {
            path: "search/movie",
            params: vec![
                ("language", language.to_string()),
                ("page", query.page.to_string()),
                ("query", query.query.clone()),
            ],
        }
    } else {
        UpstreamRequest {
            path: "discover/movie",
            params: vec![
                ("language", language.to_string()),
                ("page", query.page.to_string()),
                ("sort_by", query.sort_key().to_string()),
            ],
        }
    }
}

pub struct TmdbClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    language: String,
}

impl TmdbClient {
    pub fn new(config: &TmdbConfig) -> TmdbResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(TmdbError::Client)?;

        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    pub async fn movies(&self, query: &MovieQuery) -> TmdbResult<Value> {
        let request = resolve_movie_request(query, &self.language);
        self.get_json::<ResultPage>(request.path, &request.params)
            .await
    }

    pub async fn genres(&self) -> TmdbResult<Value> {
        let params = [("language", self.language.clone())];
        self.get_json::<GenresResponse>("genre/movie/list", &params)
            .await
    }

    pub async fn movie_images(&self, movie_id: u64) -> TmdbResult<Value> {
        let path = format!("movie/{}/images", movie_id);
        self.get_json::<ImagesResponse>(&path, &[]).await
    }

    pub async fn movie_videos(&self, movie_id: u64) -> TmdbResult<Value> {
        let path = format!("movie/{}/videos", movie_id);
        let params = [("language", self.language.clone())];
        self.get_json::<VideosResponse>(&path, &params).await
    }

    /// Fetch `path` and hand back the provider's JSON untouched. The body
    /// must still have the shape of `T`, otherwise it is a decode error.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> TmdbResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "TMDB request");

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .query(params)
            .send()
            .await
            .map_err(|e| {
                error!(path = %path, error = %e, "TMDB request failed");
                TmdbError::Transport {
                    path: path.to_string(),
                    source: e,
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| TmdbError::Transport {
            path: path.to_string(),
            source: e,
        })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<TmdbErrorResponse>(&body)
                .ok()
                .map(|e| e.status_message);
            error!(
                path = %path,
                status = status.as_u16(),
                message = message.as_deref().unwrap_or("-"),
                "TMDB returned an error"
            );
            return Err(TmdbError::Status {
                path: path.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        let decode_error = |e: serde_json::Error| {
            error!(path = %path, error = %e, "TMDB response did not decode");
            TmdbError::Decode {
                path: path.to_string(),
                source: e,
            }
        };
        let value: Value = serde_json::from_slice(&body).map_err(decode_error)?;
        <T as serde::Deserialize>::deserialize(&value).map_err(decode_error)?;
        Ok(value)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TmdbErrorResponse {
    #[serde(default)]
    pub status_code: i64,
    pub status_message: String,
    #[serde(default)]
    pub success: bool,
}
