//! Raw wire models for the private Instagram API.
//!
//! Deliberately partial: only the fields the read paths consume, with
//! `default` everywhere the API is known to omit fields per item kind.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
pub struct RawUser {
    pub pk: i64,
    pub username: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawThread {
    pub thread_id: String,
    #[serde(default)]
    pub thread_title: Option<String>,
    #[serde(default)]
    pub users: Vec<RawUser>,
    #[serde(default)]
    pub items: Vec<RawDirectItem>,
}

/// One inbox item. `item_type` selects which payload field is present.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDirectItem {
    pub item_id: String,
    pub item_type: String,
    pub user_id: i64,
    /// Microseconds since the epoch; the API sends it as a string.
    #[serde(deserialize_with = "string_or_i64")]
    pub timestamp: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media_share: Option<RawMedia>,
    #[serde(default)]
    pub media: Option<RawMedia>,
    #[serde(default)]
    pub clip: Option<RawClip>,
    #[serde(default)]
    pub link: Option<RawLink>,
    #[serde(default)]
    pub story_share: Option<RawStoryShare>,
    #[serde(default)]
    pub voice_media: Option<RawVoiceMedia>,
    #[serde(default)]
    pub placeholder: Option<RawPlaceholder>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawClip {
    pub clip: RawMedia,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLink {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub link_context: Option<RawLinkContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawLinkContext {
    pub link_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStoryShare {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub media: Option<RawMedia>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVoiceMedia {
    pub media: RawVoiceMediaInner,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawVoiceMediaInner {
    pub audio: RawAudio,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAudio {
    pub audio_src: String,
    #[serde(default)]
    pub duration: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlaceholder {
    #[serde(default)]
    pub message: Option<String>,
}

/// A feed/shared media item. Also nested inside carousels, shares and
/// story shares, hence nearly every field is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawMedia {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub media_type: Option<i64>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub taken_at: Option<i64>,
    #[serde(default)]
    pub image_versions2: Option<RawImageVersions>,
    #[serde(default)]
    pub video_versions: Option<Vec<RawMediaUrl>>,
    #[serde(default)]
    pub carousel_media: Option<Vec<RawMedia>>,
    #[serde(default)]
    pub caption: Option<RawCaption>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub like_count: Option<i64>,
    #[serde(default)]
    pub comment_count: Option<i64>,
}

impl RawMedia {
    /// Best video URL, if this item has renditions.
    pub fn video_url(&self) -> Option<&str> {
        self.video_versions
            .as_ref()
            .and_then(|v| v.first())
            .map(|v| v.url.as_str())
    }

    /// Best still-image URL (also the thumbnail for videos).
    pub fn image_url(&self) -> Option<&str> {
        self.image_versions2
            .as_ref()
            .and_then(|iv| iv.candidates.first())
            .map(|c| c.url.as_str())
    }

    pub fn caption_text(&self) -> String {
        self.caption
            .as_ref()
            .and_then(|c| c.text.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawImageVersions {
    #[serde(default)]
    pub candidates: Vec<RawMediaUrl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawMediaUrl {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCaption {
    #[serde(default)]
    pub text: Option<String>,
}

/// One page of a user's feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFeedPage {
    #[serde(default)]
    pub items: Vec<RawMedia>,
    #[serde(default)]
    pub more_available: bool,
    #[serde(default)]
    pub next_max_id: Option<String>,
}

fn string_or_i64<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrI64 {
        Str(String),
        Num(i64),
    }

    match StringOrI64::deserialize(deserializer)? {
        StringOrI64::Str(s) => s.parse().map_err(serde::de::Error::custom),
        StringOrI64::Num(n) => Ok(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_item_timestamp_accepts_string_and_number() {
        let a: RawDirectItem = serde_json::from_str(
            r#"{"item_id":"1","item_type":"text","user_id":7,"timestamp":"1700000000000000","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(a.timestamp, 1_700_000_000_000_000);

        let b: RawDirectItem = serde_json::from_str(
            r#"{"item_id":"2","item_type":"like","user_id":7,"timestamp":1700000000000000}"#,
        )
        .unwrap();
        assert_eq!(b.timestamp, 1_700_000_000_000_000);
    }

    #[test]
    fn media_url_prefers_video_renditions() {
        let media: RawMedia = serde_json::from_str(
            r#"{
                "media_type": 2,
                "video_versions": [{"url": "https://v/1.mp4"}, {"url": "https://v/2.mp4"}],
                "image_versions2": {"candidates": [{"url": "https://i/thumb.jpg"}]}
            }"#,
        )
        .unwrap();
        assert_eq!(media.video_url(), Some("https://v/1.mp4"));
        assert_eq!(media.image_url(), Some("https://i/thumb.jpg"));
    }
}
