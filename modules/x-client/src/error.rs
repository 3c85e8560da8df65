use thiserror::Error;

pub type Result<T> = std::result::Result<T, XError>;

#[derive(Debug, Error)]
pub enum XError {
    #[error("X API credentials are not available")]
    CredentialsMissing,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to fetch media from URL: {status}")]
    MediaFetch { status: String },

    #[error("{kind} size exceeds {limit_mb}MB limit")]
    MediaSizeLimit { kind: &'static str, limit_mb: u64 },

    #[error("Media upload failed (status {status}): {message}")]
    MediaUpload { status: u16, message: String },

    #[error("Tweet posting failed (status {status}): {body}")]
    TweetCreate { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),
}

impl XError {
    /// Upstream HTTP status for failures that carry one. Lets the route
    /// layer translate platform auth/rate-limit responses.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            XError::MediaUpload { status, .. } | XError::TweetCreate { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

impl From<reqwest::Error> for XError {
    fn from(err: reqwest::Error) -> Self {
        XError::Network(err.to_string())
    }
}
