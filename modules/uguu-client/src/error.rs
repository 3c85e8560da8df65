use thiserror::Error;

pub type Result<T> = std::result::Result<T, UguuError>;

#[derive(Debug, Error)]
pub enum UguuError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to download file: {status}")]
    Download { status: String },

    #[error("Upload failed: {0}")]
    Upload(String),
}

impl From<reqwest::Error> for UguuError {
    fn from(err: reqwest::Error) -> Self {
        UguuError::Network(err.to_string())
    }
}
