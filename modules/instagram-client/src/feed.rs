//! Public-facing view of feed posts, built from private-API media.

use serde::Serialize;
use tracing::debug;

use crate::error::{InstagramError, Result};
use crate::private::PrivateApi;
use crate::shortcode;
use crate::types::RawMedia;
use socialgate_common::PeekFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedMediaType {
    Image,
    Video,
    CarouselAlbum,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChildMediaItem {
    pub id: String,
    pub media_type: FeedMediaType,
    pub media_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaItem {
    pub id: String,
    pub media_type: FeedMediaType,
    pub media_url: String,
    pub permalink: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub timestamp: String,
    pub username: String,
    pub caption: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<ChildMediaItem>>,
    pub likes: i64,
    pub comments: i64,
}

fn feed_media_type(code: Option<i64>) -> Option<FeedMediaType> {
    match code {
        Some(1) => Some(FeedMediaType::Image),
        Some(2) => Some(FeedMediaType::Video),
        Some(8) => Some(FeedMediaType::CarouselAlbum),
        _ => None,
    }
}

/// `None` when the raw media carries a type this view does not model.
fn map_media(raw: &RawMedia) -> Option<MediaItem> {
    let media_type = feed_media_type(raw.media_type)?;

    let children = match (&media_type, &raw.carousel_media) {
        (FeedMediaType::CarouselAlbum, Some(children)) => Some(
            children
                .iter()
                .filter_map(|child| {
                    let kind = if child.media_type == Some(1) {
                        FeedMediaType::Image
                    } else {
                        FeedMediaType::Video
                    };
                    Some(ChildMediaItem {
                        id: child.id.clone()?,
                        media_type: kind,
                        media_url: best_media_url(child, kind)?,
                        thumbnail_url: child.image_url().map(str::to_string),
                    })
                })
                .collect(),
        ),
        _ => None,
    };

    Some(MediaItem {
        id: raw.id.clone()?,
        media_type,
        media_url: best_media_url(raw, media_type)?,
        permalink: format!(
            "https://www.instagram.com/p/{}/",
            raw.code.clone().unwrap_or_default()
        ),
        thumbnail_url: raw.image_url().map(str::to_string),
        timestamp: raw
            .taken_at
            .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
            .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
            .unwrap_or_default(),
        username: raw
            .user
            .as_ref()
            .map(|u| u.username.clone())
            .unwrap_or_default(),
        caption: raw.caption_text(),
        children,
        likes: raw.like_count.unwrap_or(0),
        comments: raw.comment_count.unwrap_or(0),
    })
}

/// Videos prefer a playable rendition, everything else the first still.
fn best_media_url(raw: &RawMedia, media_type: FeedMediaType) -> Option<String> {
    match media_type {
        FeedMediaType::Video => raw
            .video_url()
            .or_else(|| raw.image_url())
            .map(str::to_string),
        _ => raw.image_url().map(str::to_string),
    }
}

fn keep(item: &MediaItem, filter: PeekFilter) -> bool {
    match filter {
        PeekFilter::All => true,
        PeekFilter::Videos => item.media_type == FeedMediaType::Video,
        PeekFilter::Photos => matches!(
            item.media_type,
            FeedMediaType::Image | FeedMediaType::CarouselAlbum
        ),
    }
}

/// Walk a user's feed page by page until the limit is met or the feed
/// runs out. A non-positive limit means the whole feed.
pub async fn peek(
    api: &dyn PrivateApi,
    username: &str,
    filter: PeekFilter,
    limit: i64,
) -> Result<Vec<MediaItem>> {
    let user_id = api.user_id_by_username(username).await?;

    let mut media_items = Vec::new();
    let mut max_id: Option<String> = None;
    loop {
        let page = api.user_feed(&user_id, max_id.as_deref()).await?;
        debug!(username, page_items = page.items.len(), "fetched feed page");

        media_items.extend(
            page.items
                .iter()
                .filter_map(map_media)
                .filter(|item| keep(item, filter)),
        );

        if limit > 0 && media_items.len() as i64 >= limit {
            break;
        }
        if !page.more_available {
            break;
        }
        max_id = page.next_max_id;
        if max_id.is_none() {
            break;
        }
    }

    if limit > 0 {
        media_items.truncate(limit as usize);
    }
    Ok(media_items)
}

/// Look up one post by the segment from its permalink.
pub async fn peek_post(api: &dyn PrivateApi, post_id: &str) -> Result<MediaItem> {
    let media_id = shortcode::media_id_from_segment(post_id)?;
    let raw = api.media_info(media_id).await?;
    map_media(&raw).ok_or(InstagramError::UnsupportedMediaType(
        raw.media_type.unwrap_or(-1),
    ))
}
