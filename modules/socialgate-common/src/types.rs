use serde::{Deserialize, Serialize};

/// One piece of media to publish. The URL must be fetchable by us;
/// it is re-staged to a public host before the platform sees it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaObject {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    Image,
    Video,
}

/// The shape of an Instagram post.
///
/// Single-media shapes (`Image`, `Video`, `Reels`, `Stories`) require
/// exactly one media item; `Carousel` requires 2 to 10.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostType {
    Image,
    Video,
    Reels,
    Stories,
    Carousel,
}

impl PostType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostType::Image => "IMAGE",
            PostType::Video => "VIDEO",
            PostType::Reels => "REELS",
            PostType::Stories => "STORIES",
            PostType::Carousel => "CAROUSEL",
        }
    }
}

/// Media-kind filter for profile peeks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PeekFilter {
    Videos,
    Photos,
    #[default]
    All,
}
