pub mod error;

pub use error::{Result, UguuError};

use serde::Deserialize;
use url::Url;

const UPLOAD_URL: &str = "https://uguu.se/upload";

/// Fallback name when the source URL path has no usable segment.
const DEFAULT_FILENAME: &str = "downloaded-file";

#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Deserialize)]
pub struct UploadedFile {
    pub url: String,
}

/// Re-hosts files on uguu.se so platforms that cannot read the original
/// source (private CDNs, expiring signed URLs) get a plain public URL.
/// Uploads expire host-side; nothing here cleans them up.
pub struct UguuClient {
    client: reqwest::Client,
    upload_url: String,
}

impl Default for UguuClient {
    fn default() -> Self {
        Self::new()
    }
}

impl UguuClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: UPLOAD_URL.to_string(),
        }
    }

    /// Point the client at a different host (tests, self-hosted uguu).
    pub fn with_upload_url(upload_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url: upload_url.to_string(),
        }
    }

    /// Download `source_url` and re-upload it, returning the new public URL.
    ///
    /// No retries at this layer: the caller decides whether a failed stage
    /// aborts the whole publish.
    pub async fn stage(&self, source_url: &str) -> Result<String> {
        let resp = self.client.get(source_url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(UguuError::Download {
                status: status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
            });
        }

        let filename = filename_from_url(source_url);
        let payload = resp.bytes().await?;
        tracing::debug!(source_url, filename = %filename, size = payload.len(), "Downloaded file for staging");

        let part = reqwest::multipart::Part::bytes(payload.to_vec()).file_name(filename);
        let form = reqwest::multipart::Form::new().part("files[]", part);

        let upload_resp = self
            .client
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await?;

        let status = upload_resp.status();
        if !status.is_success() {
            return Err(UguuError::Upload(
                status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
            ));
        }

        let body: UploadResponse = upload_resp.json().await.map_err(|e| {
            UguuError::Upload(format!("unreadable host response: {e}"))
        })?;
        let url = first_file_url(body)?;
        tracing::info!(source_url, staged_url = %url, "File staged");
        Ok(url)
    }
}

/// Last path segment of the source URL, or a placeholder when there is none.
fn filename_from_url(source_url: &str) -> String {
    Url::parse(source_url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}

fn first_file_url(body: UploadResponse) -> Result<String> {
    if !body.success {
        return Err(UguuError::Upload(
            "host reported failure".to_string(),
        ));
    }
    body.files
        .into_iter()
        .next()
        .map(|f| f.url)
        .ok_or_else(|| UguuError::Upload("no URL returned for uploaded file".to_string()))
}
