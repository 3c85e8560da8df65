pub mod error;
pub mod oauth;

pub use error::{Result, XError};
pub use oauth::OauthSigner;

use serde::Deserialize;

const MEDIA_UPLOAD_URL: &str = "https://upload.twitter.com/1.1/media/upload.json";
const TWEET_URL: &str = "https://api.twitter.com/2/tweets";

const MAX_TWEET_CHARS: usize = 280;
const MB: u64 = 1024 * 1024;

/// A tweet as created, with its permalink.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct TweetResponse {
    data: TweetData,
}

#[derive(Debug, Deserialize)]
struct TweetData {
    id: String,
    text: String,
}

/// Media kinds the platform limits differently.
///
/// GIF is matched before the `image/` prefix so animated GIFs get their
/// own 15MB ceiling instead of the still-image one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaCategory {
    Image,
    Gif,
    Video,
}

impl MediaCategory {
    fn from_content_type(content_type: &str) -> Option<Self> {
        let ct = content_type.to_ascii_lowercase();
        if ct.contains("gif") {
            Some(MediaCategory::Gif)
        } else if ct.starts_with("image/") {
            Some(MediaCategory::Image)
        } else if ct.starts_with("video/") {
            Some(MediaCategory::Video)
        } else {
            None
        }
    }

    fn limit_mb(&self) -> u64 {
        match self {
            MediaCategory::Image => 5,
            MediaCategory::Gif => 15,
            MediaCategory::Video => 512,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MediaCategory::Image => "Image",
            MediaCategory::Gif => "GIF",
            MediaCategory::Video => "Video",
        }
    }
}

/// Posts tweets with optional media. One attempt end to end; a failed
/// step fails the whole call and the caller retries from the top.
pub struct XClient {
    client: reqwest::Client,
    signer: OauthSigner,
    upload_url: String,
    tweet_url: String,
}

impl XClient {
    pub fn new(signer: OauthSigner) -> Self {
        Self {
            client: reqwest::Client::new(),
            signer,
            upload_url: MEDIA_UPLOAD_URL.to_string(),
            tweet_url: TWEET_URL.to_string(),
        }
    }

    /// Validate, optionally upload media, then create the tweet.
    pub async fn post_tweet(&self, text: &str, media_url: Option<&str>) -> Result<PostedTweet> {
        validate_text(text)?;

        let mut media_ids: Vec<String> = Vec::new();
        if let Some(url) = media_url {
            tracing::info!(media_url = url, "Uploading tweet media");
            media_ids.push(self.upload_media(url).await?);
        }

        let mut payload = serde_json::json!({ "text": text });
        if !media_ids.is_empty() {
            payload["media"] = serde_json::json!({ "media_ids": media_ids });
        }

        let auth = self.signer.sign("POST", &self.tweet_url)?;
        let resp = self
            .client
            .post(&self.tweet_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(XError::TweetCreate {
                status: status.as_u16(),
                body,
            });
        }

        let tweet: TweetResponse = resp
            .json()
            .await
            .map_err(|e| XError::Network(format!("unreadable tweet response: {e}")))?;
        tracing::info!(tweet_id = %tweet.data.id, "Tweet posted");

        Ok(PostedTweet {
            url: format!("https://twitter.com/i/web/status/{}", tweet.data.id),
            id: tweet.data.id,
            text: tweet.data.text,
        })
    }

    /// Download the media and push it through the legacy v1.1 signed
    /// upload endpoint, returning the platform media id.
    async fn upload_media(&self, media_url: &str) -> Result<String> {
        let resp = self.client.get(media_url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(XError::MediaFetch {
                status: status
                    .canonical_reason()
                    .unwrap_or(status.as_str())
                    .to_string(),
            });
        }

        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/jpeg")
            .to_string();
        let content_length = resp.content_length();
        check_size_limit(&content_type, content_length)?;

        let payload = resp.bytes().await?;
        tracing::debug!(
            media_url,
            content_type = %content_type,
            size = payload.len(),
            "Media downloaded for upload"
        );

        let part = reqwest::multipart::Part::bytes(payload.to_vec())
            .mime_str(&content_type)
            .map_err(|e| XError::Network(format!("invalid media content type: {e}")))?;
        let form = reqwest::multipart::Form::new().part("media", part);

        let auth = self.signer.sign("POST", &self.upload_url)?;
        let upload_resp = self
            .client
            .post(&self.upload_url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .multipart(form)
            .send()
            .await?;

        let status = upload_resp.status();
        if !status.is_success() {
            let body = upload_resp.text().await.unwrap_or_default();
            return Err(XError::MediaUpload {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: serde_json::Value = upload_resp
            .json()
            .await
            .map_err(|e| XError::Network(format!("unreadable upload response: {e}")))?;
        media_id_from_response(&body)
    }
}

fn validate_text(text: &str) -> Result<()> {
    if text.is_empty() {
        return Err(XError::Validation("Text is required".to_string()));
    }
    if text.chars().count() > MAX_TWEET_CHARS {
        return Err(XError::Validation(
            "Text must be 280 characters or less".to_string(),
        ));
    }
    Ok(())
}

/// Enforce the platform's per-kind size ceilings from `content-length`.
/// A missing header skips the check: best-effort, the upload endpoint
/// still enforces its own limits.
fn check_size_limit(content_type: &str, content_length: Option<u64>) -> Result<()> {
    let Some(len) = content_length else {
        return Ok(());
    };
    let Some(category) = MediaCategory::from_content_type(content_type) else {
        return Ok(());
    };
    if len > category.limit_mb() * MB {
        return Err(XError::MediaSizeLimit {
            kind: category.label(),
            limit_mb: category.limit_mb(),
        });
    }
    Ok(())
}

/// `media_id_string` preferred; the numeric `media_id` loses precision
/// in some JSON decoders, which is why the string twin exists.
fn media_id_from_response(body: &serde_json::Value) -> Result<String> {
    body.get("media_id_string")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .or_else(|| body.get("media_id").map(|v| v.to_string()))
        .ok_or_else(|| XError::MediaUpload {
            status: 200,
            message: "upload succeeded but no media_id returned".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> OauthSigner {
        OauthSigner::new(
            Some("ck".into()),
            Some("cs".into()),
            Some("at".into()),
            Some("ats".into()),
        )
        .unwrap()
    }

    #[test]
    fn text_of_281_chars_is_rejected() {
        let text = "x".repeat(281);
        assert!(matches!(validate_text(&text), Err(XError::Validation(_))));
    }

    #[test]
    fn text_of_280_chars_passes_validation() {
        let text = "x".repeat(280);
        assert!(validate_text(&text).is_ok());
    }

    #[test]
    fn empty_text_is_rejected() {
        assert!(matches!(validate_text(""), Err(XError::Validation(_))));
    }

    #[tokio::test]
    async fn overlong_text_fails_before_any_network_call() {
        // Unroutable endpoints: reaching the network would error differently.
        let client = XClient::new(signer());
        let err = client.post_tweet(&"y".repeat(281), None).await.unwrap_err();
        assert!(matches!(err, XError::Validation(_)));
    }

    #[test]
    fn six_mb_jpeg_is_over_the_image_limit() {
        let err = check_size_limit("image/jpeg", Some(6_000_000)).unwrap_err();
        match err {
            XError::MediaSizeLimit { kind, limit_mb } => {
                assert_eq!(kind, "Image");
                assert_eq!(limit_mb, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn six_mb_mp4_is_fine() {
        assert!(check_size_limit("video/mp4", Some(6_000_000)).is_ok());
    }

    #[test]
    fn gif_gets_its_own_ceiling() {
        assert!(check_size_limit("image/gif", Some(14 * MB)).is_ok());
        let err = check_size_limit("image/gif", Some(16 * MB)).unwrap_err();
        assert!(matches!(err, XError::MediaSizeLimit { kind: "GIF", .. }));
    }

    #[test]
    fn missing_content_length_skips_the_check() {
        assert!(check_size_limit("image/jpeg", None).is_ok());
    }

    #[test]
    fn unknown_content_type_skips_the_check() {
        assert!(check_size_limit("application/octet-stream", Some(600 * MB)).is_ok());
    }

    #[test]
    fn media_id_string_wins_over_numeric_id() {
        let body = serde_json::json!({ "media_id": 12345, "media_id_string": "12345" });
        assert_eq!(media_id_from_response(&body).unwrap(), "12345");
    }

    #[test]
    fn numeric_media_id_is_a_fallback() {
        let body = serde_json::json!({ "media_id": 98765 });
        assert_eq!(media_id_from_response(&body).unwrap(), "98765");
    }

    #[test]
    fn missing_media_id_is_an_upload_error() {
        let body = serde_json::json!({ "expires_after_secs": 86400 });
        assert!(matches!(
            media_id_from_response(&body),
            Err(XError::MediaUpload { .. })
        ));
    }
}
