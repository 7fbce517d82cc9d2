#[derive(Debug, thiserror::Error)]
pub enum BrowseError {
    #[error("Unknown sort field: {0}")]
    InvalidSortField(String),
    #[error("Unknown sort order: {0}")]
    InvalidSortOrder(String),
    #[error("Failed to create HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Gateway returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Failed to parse gateway response: {0}")]
    Decode(#[from] serde_json::Error),
}
