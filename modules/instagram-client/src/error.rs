use thiserror::Error;

pub type Result<T> = std::result::Result<T, InstagramError>;

#[derive(Debug, Error)]
pub enum InstagramError {
    #[error("Instagram access token is not available")]
    CredentialsMissing,

    #[error("Could not fetch Instagram user (status {status})")]
    IdentityLookup { status: u16 },

    #[error(transparent)]
    Staging(#[from] uguu_client::UguuError),

    #[error("Could not create media container for {staged_url} (status {status})")]
    ContainerCreate { staged_url: String, status: u16 },

    #[error("Container {container_id} failed with status: {status}")]
    ContainerFailed {
        container_id: String,
        status: String,
    },

    #[error("Unknown status for container {container_id}: {status}")]
    ContainerUnknownState {
        container_id: String,
        status: String,
    },

    #[error("Container {container_id} did not become ready in time")]
    ContainerTimeout { container_id: String },

    #[error("Could not publish media container {container_id} (status {status})")]
    Publish { container_id: String, status: u16 },

    #[error("Carousel posts require 2 to 10 media items, got {0}")]
    InvalidCarouselSize(usize),

    #[error("{post_type} posts require exactly 1 media item, got {count}")]
    InvalidMediaCount { post_type: String, count: usize },

    #[error("Session error: {0}")]
    Session(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(i64),

    #[error("Invalid post id: {0}")]
    InvalidPostId(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl InstagramError {
    /// Caller-input errors the HTTP layer should report as 4xx.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            InstagramError::InvalidCarouselSize(_)
                | InstagramError::InvalidMediaCount { .. }
                | InstagramError::InvalidPostId(_)
        )
    }
}

impl From<reqwest::Error> for InstagramError {
    fn from(err: reqwest::Error) -> Self {
        InstagramError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for InstagramError {
    fn from(err: serde_json::Error) -> Self {
        InstagramError::Parse(err.to_string())
    }
}
