#[derive(Debug, thiserror::Error)]
pub enum TmdbError {
    #[error("Failed to create HTTP client: {0}")]
    Client(reqwest::Error),
    #[error("TMDB request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("TMDB {path} returned status {status}")]
    Status {
        path: String,
        status: u16,
        message: Option<String>,
    },
    #[error("Failed to parse TMDB response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TmdbError {
    /// HTTP status the provider answered with, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            TmdbError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The provider's `status_message`, when the error body carried one.
    pub fn provider_message(&self) -> Option<&str> {
        match self {
            TmdbError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

pub type TmdbResult<T> = Result<T, TmdbError>;
