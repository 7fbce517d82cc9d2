use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::error::BrowseError;
use crate::api::ErrorBody;
use crate::models::{MovieQuery, ResultPage};

/// Where the browser gets its pages from.
#[async_trait]
pub trait MovieSource: Send + Sync {
    async fn fetch_movies(&self, query: &MovieQuery) -> Result<ResultPage, BrowseError>;
}

/// Talks to a running gateway's `/api/movies` route.
pub struct GatewayClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BrowseError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(BrowseError::Client)?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn movies_url(&self, query: &MovieQuery) -> String {
        let mut url = format!("{}/api/movies?page={}", self.base_url, query.page);
        if query.is_search() {
            url.push_str("&query=");
            url.push_str(&urlencoding::encode(&query.query));
        } else if let Some(sort_by) = query.sort_by.as_deref().filter(|s| !s.is_empty()) {
            url.push_str("&sort_by=");
            url.push_str(&urlencoding::encode(sort_by));
        }
        url
    }
}

#[async_trait]
impl MovieSource for GatewayClient {
    async fn fetch_movies(&self, query: &MovieQuery) -> Result<ResultPage, BrowseError> {
        let url = self.movies_url(query);
        debug!(url = %url, "Fetching movies");

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| BrowseError::Transport {
                url: url.clone(),
                source: e,
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| BrowseError::Transport { url, source: e })?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(BrowseError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_slice(&body)?)
    }
}
