//! Direct-inbox read path: decode raw items into a closed tagged union
//! and map threads into the response shape.
//!
//! Every known `item_type` gets its own decoder; anything else (or a
//! known type with a missing payload) lands in `Unsupported` rather
//! than a loosely typed blob.

use std::collections::HashMap;

use serde::{Serialize, Serializer};

use crate::types::{RawDirectItem, RawMedia, RawThread, RawUser};

/// Which inbox items to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageFilter {
    #[default]
    All,
    /// Reels shared into the thread.
    Clip,
}

#[derive(Debug, Serialize)]
pub struct DirectThread {
    #[serde(rename = "threadId")]
    pub thread_id: String,
    #[serde(rename = "threadTitle")]
    pub thread_title: Option<String>,
    pub users: Vec<String>,
    pub messages: Vec<DirectMessage>,
}

#[derive(Debug, Serialize)]
pub struct DirectMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub content: DirectItemContent,
    #[serde(rename = "senderId")]
    pub sender_id: String,
    pub sender: String,
    pub timestamp: String,
    pub media_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedMediaContent {
    pub caption: String,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CarouselShareContent {
    pub caption: String,
    pub children: Vec<SharedChild>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SharedChild {
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaContent {
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClipContent {
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub caption: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkContent {
    pub text: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoryShareContent {
    pub text: Option<String>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoiceContent {
    pub audio_url: String,
    pub duration: Option<i64>,
}

/// Closed union over direct-message kinds.
#[derive(Debug, Clone)]
pub enum DirectItemContent {
    Text(String),
    MediaShare(SharedMediaContent),
    CarouselShare(CarouselShareContent),
    Media(MediaContent),
    Clip(ClipContent),
    Link(LinkContent),
    Like,
    StoryShare(StoryShareContent),
    StoryUnavailable { username: String },
    VoiceMedia(VoiceContent),
    Placeholder(String),
    Unsupported { item_type: String },
}

impl DirectItemContent {
    /// Wire-facing type tag. Carousel shares get their own tag even
    /// though they arrive as `media_share`.
    pub fn kind(&self) -> String {
        match self {
            DirectItemContent::Text(_) => "text".to_string(),
            DirectItemContent::MediaShare(_) => "media_share".to_string(),
            DirectItemContent::CarouselShare(_) => "carousel_share".to_string(),
            DirectItemContent::Media(_) => "media".to_string(),
            DirectItemContent::Clip(_) => "clip".to_string(),
            DirectItemContent::Link(_) => "link".to_string(),
            DirectItemContent::Like => "like".to_string(),
            DirectItemContent::StoryShare(_) | DirectItemContent::StoryUnavailable { .. } => {
                "story_share".to_string()
            }
            DirectItemContent::VoiceMedia(_) => "voice_media".to_string(),
            DirectItemContent::Placeholder(_) => "placeholder".to_string(),
            DirectItemContent::Unsupported { item_type } => item_type.clone(),
        }
    }
}

impl Serialize for DirectItemContent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DirectItemContent::Text(text) => serializer.serialize_str(text),
            DirectItemContent::MediaShare(c) => c.serialize(serializer),
            DirectItemContent::CarouselShare(c) => c.serialize(serializer),
            DirectItemContent::Media(c) => c.serialize(serializer),
            DirectItemContent::Clip(c) => c.serialize(serializer),
            DirectItemContent::Link(c) => c.serialize(serializer),
            DirectItemContent::Like => serializer.serialize_str("❤️"),
            DirectItemContent::StoryShare(c) => c.serialize(serializer),
            DirectItemContent::StoryUnavailable { username } => {
                serializer.serialize_str(&format!("Story by {username} is unavailable."))
            }
            DirectItemContent::VoiceMedia(c) => c.serialize(serializer),
            DirectItemContent::Placeholder(message) => serializer.serialize_str(message),
            DirectItemContent::Unsupported { item_type } => {
                serializer.serialize_str(&format!("Unsupported message type: {item_type}"))
            }
        }
    }
}

/// Decode one raw item. Known types with a missing payload fall back
/// to `Unsupported`, mirroring how the inbox treats malformed items.
pub fn decode_item(item: &RawDirectItem) -> DirectItemContent {
    match item.item_type.as_str() {
        "text" => match &item.text {
            Some(text) => DirectItemContent::Text(text.clone()),
            None => unsupported(item),
        },
        "media_share" => decode_media_share(item),
        "media" => match &item.media {
            Some(media) => DirectItemContent::Media(MediaContent {
                media_url: best_url(media),
                thumbnail_url: media.image_url().map(str::to_string),
            }),
            None => unsupported(item),
        },
        "clip" => match &item.clip {
            Some(wrap) => DirectItemContent::Clip(ClipContent {
                media_url: wrap.clip.video_url().map(str::to_string),
                thumbnail_url: wrap.clip.image_url().map(str::to_string),
                caption: wrap.clip.caption_text(),
            }),
            None => unsupported(item),
        },
        "link" => match item.link.as_ref().and_then(|l| l.link_context.as_ref()) {
            Some(ctx) => DirectItemContent::Link(LinkContent {
                text: item.link.as_ref().and_then(|l| l.text.clone()),
                url: ctx.link_url.clone(),
            }),
            None => unsupported(item),
        },
        "like" => DirectItemContent::Like,
        "story_share" => decode_story_share(item),
        "voice_media" => match &item.voice_media {
            Some(voice) => DirectItemContent::VoiceMedia(VoiceContent {
                audio_url: voice.media.audio.audio_src.clone(),
                duration: voice.media.audio.duration,
            }),
            None => unsupported(item),
        },
        "placeholder" => match item.placeholder.as_ref().and_then(|p| p.message.clone()) {
            Some(message) => DirectItemContent::Placeholder(message),
            None => unsupported(item),
        },
        _ => unsupported(item),
    }
}

fn unsupported(item: &RawDirectItem) -> DirectItemContent {
    DirectItemContent::Unsupported {
        item_type: item.item_type.clone(),
    }
}

fn decode_media_share(item: &RawDirectItem) -> DirectItemContent {
    let Some(share) = &item.media_share else {
        return unsupported(item);
    };
    let username = owner_name(share);
    match &share.carousel_media {
        Some(children) if !children.is_empty() => {
            DirectItemContent::CarouselShare(CarouselShareContent {
                caption: share.caption_text(),
                children: children
                    .iter()
                    .map(|child| SharedChild {
                        kind: if child.video_url().is_some() {
                            "video"
                        } else {
                            "image"
                        },
                        media_url: best_url(child),
                        thumbnail_url: child.image_url().map(str::to_string),
                    })
                    .collect(),
                username,
            })
        }
        _ => DirectItemContent::MediaShare(SharedMediaContent {
            caption: share.caption_text(),
            media_url: best_url(share),
            thumbnail_url: share.image_url().map(str::to_string),
            username,
        }),
    }
}

fn decode_story_share(item: &RawDirectItem) -> DirectItemContent {
    let Some(media) = item.story_share.as_ref().and_then(|s| s.media.as_ref()) else {
        return unsupported(item);
    };
    match best_url(media) {
        Some(media_url) => DirectItemContent::StoryShare(StoryShareContent {
            text: item.story_share.as_ref().and_then(|s| s.text.clone()),
            media_url: Some(media_url),
            thumbnail_url: media.image_url().map(str::to_string),
        }),
        // Expired or restricted stories come back with no renditions.
        None => DirectItemContent::StoryUnavailable {
            username: owner_name(media),
        },
    }
}

fn best_url(media: &RawMedia) -> Option<String> {
    media
        .video_url()
        .or_else(|| media.image_url())
        .map(str::to_string)
}

fn owner_name(media: &RawMedia) -> String {
    media
        .user
        .as_ref()
        .map(|u| u.username.clone())
        .unwrap_or_default()
}

/// Map inbox threads to the response shape: allow-list filter, id to
/// username resolution, per-thread message limit, oldest first.
pub fn build_threads(
    current_user: &RawUser,
    threads: Vec<RawThread>,
    allowed_users: &[String],
    limit: usize,
    filter: MessageFilter,
) -> Vec<DirectThread> {
    threads
        .into_iter()
        .filter(|thread| {
            allowed_users.is_empty()
                || thread
                    .users
                    .iter()
                    .any(|u| allowed_users.iter().any(|a| a == &u.username))
        })
        .map(|thread| {
            let mut names: HashMap<i64, String> = thread
                .users
                .iter()
                .map(|u| (u.pk, u.username.clone()))
                .collect();
            names.insert(current_user.pk, current_user.username.clone());

            let mut messages: Vec<DirectMessage> = thread
                .items
                .iter()
                .take(limit)
                .filter(|item| match filter {
                    MessageFilter::All => true,
                    MessageFilter::Clip => item.item_type == "clip",
                })
                .map(|item| to_message(item, &names))
                .collect();
            // Inbox items arrive newest first; callers read top-down.
            messages.reverse();

            DirectThread {
                thread_id: thread.thread_id,
                thread_title: thread.thread_title,
                users: thread.users.iter().map(|u| u.username.clone()).collect(),
                messages,
            }
        })
        .collect()
}

fn to_message(item: &RawDirectItem, names: &HashMap<i64, String>) -> DirectMessage {
    let content = decode_item(item);
    DirectMessage {
        kind: content.kind(),
        sender_id: item.user_id.to_string(),
        sender: names
            .get(&item.user_id)
            .cloned()
            .unwrap_or_else(|| format!("User ID: {}", item.user_id)),
        timestamp: format_timestamp(item.timestamp),
        media_id: item.item_id.clone(),
        content,
    }
}

/// Item timestamps are epoch microseconds.
fn format_timestamp(micros: i64) -> String {
    chrono::DateTime::from_timestamp_micros(micros)
        .map(|dt| dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(json: serde_json::Value) -> RawDirectItem {
        serde_json::from_value(json).unwrap()
    }

    fn base(kind: &str, extra: serde_json::Value) -> serde_json::Value {
        let mut v = serde_json::json!({
            "item_id": "item-1",
            "item_type": kind,
            "user_id": 42,
            "timestamp": "1700000000000000"
        });
        v.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        v
    }

    #[test]
    fn text_items_decode_to_their_text() {
        let decoded = decode_item(&item(base("text", serde_json::json!({"text": "hello"}))));
        assert!(matches!(decoded, DirectItemContent::Text(t) if t == "hello"));
    }

    #[test]
    fn like_items_render_a_heart() {
        let decoded = decode_item(&item(base("like", serde_json::json!({}))));
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!("❤️")
        );
    }

    #[test]
    fn unknown_kinds_fall_back_to_unsupported() {
        let decoded = decode_item(&item(base("animated_media", serde_json::json!({}))));
        assert_eq!(decoded.kind(), "animated_media");
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!("Unsupported message type: animated_media")
        );
    }

    #[test]
    fn known_kind_with_missing_payload_is_unsupported() {
        let decoded = decode_item(&item(base("media_share", serde_json::json!({}))));
        assert!(matches!(decoded, DirectItemContent::Unsupported { .. }));
    }

    #[test]
    fn media_share_single_decodes_with_owner() {
        let decoded = decode_item(&item(base(
            "media_share",
            serde_json::json!({
                "media_share": {
                    "caption": {"text": "a post"},
                    "image_versions2": {"candidates": [{"url": "https://i/p.jpg"}]},
                    "user": {"pk": 7, "username": "poster"}
                }
            }),
        )));
        match decoded {
            DirectItemContent::MediaShare(c) => {
                assert_eq!(c.caption, "a post");
                assert_eq!(c.media_url.as_deref(), Some("https://i/p.jpg"));
                assert_eq!(c.username, "poster");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn media_share_with_carousel_becomes_carousel_share() {
        let decoded = decode_item(&item(base(
            "media_share",
            serde_json::json!({
                "media_share": {
                    "caption": {"text": "an album"},
                    "user": {"pk": 7, "username": "poster"},
                    "carousel_media": [
                        {"image_versions2": {"candidates": [{"url": "https://i/1.jpg"}]}},
                        {
                            "video_versions": [{"url": "https://v/2.mp4"}],
                            "image_versions2": {"candidates": [{"url": "https://i/2.jpg"}]}
                        }
                    ]
                }
            }),
        )));
        assert_eq!(decoded.kind(), "carousel_share");
        match decoded {
            DirectItemContent::CarouselShare(c) => {
                assert_eq!(c.children.len(), 2);
                assert_eq!(c.children[0].kind, "image");
                assert_eq!(c.children[1].kind, "video");
                assert_eq!(c.children[1].media_url.as_deref(), Some("https://v/2.mp4"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn clip_decodes_reel_payload() {
        let decoded = decode_item(&item(base(
            "clip",
            serde_json::json!({
                "clip": {"clip": {
                    "video_versions": [{"url": "https://v/reel.mp4"}],
                    "image_versions2": {"candidates": [{"url": "https://i/reel.jpg"}]},
                    "caption": {"text": "reel caption"}
                }}
            }),
        )));
        match decoded {
            DirectItemContent::Clip(c) => {
                assert_eq!(c.media_url.as_deref(), Some("https://v/reel.mp4"));
                assert_eq!(c.caption, "reel caption");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn link_without_context_is_unsupported() {
        let decoded = decode_item(&item(base(
            "link",
            serde_json::json!({"link": {"text": "see this"}}),
        )));
        assert!(matches!(decoded, DirectItemContent::Unsupported { .. }));
    }

    #[test]
    fn story_share_without_renditions_reports_unavailable() {
        let decoded = decode_item(&item(base(
            "story_share",
            serde_json::json!({
                "story_share": {"media": {"user": {"pk": 9, "username": "storyteller"}}}
            }),
        )));
        assert_eq!(decoded.kind(), "story_share");
        assert_eq!(
            serde_json::to_value(&decoded).unwrap(),
            serde_json::json!("Story by storyteller is unavailable.")
        );
    }

    #[test]
    fn voice_media_carries_audio_source() {
        let decoded = decode_item(&item(base(
            "voice_media",
            serde_json::json!({
                "voice_media": {"media": {"audio": {"audio_src": "https://a/v.m4a", "duration": 4500}}}
            }),
        )));
        match decoded {
            DirectItemContent::VoiceMedia(c) => {
                assert_eq!(c.audio_url, "https://a/v.m4a");
                assert_eq!(c.duration, Some(4500));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    fn sample_thread() -> RawThread {
        serde_json::from_value(serde_json::json!({
            "thread_id": "t1",
            "thread_title": "friends",
            "users": [{"pk": 42, "username": "alice"}],
            "items": [
                {"item_id": "m3", "item_type": "text", "user_id": 42, "timestamp": "1700000300000000", "text": "newest"},
                {"item_id": "m2", "item_type": "clip", "user_id": 42, "timestamp": "1700000200000000",
                 "clip": {"clip": {"video_versions": [{"url": "https://v/r.mp4"}]}}},
                {"item_id": "m1", "item_type": "text", "user_id": 99, "timestamp": "1700000100000000", "text": "oldest"}
            ]
        }))
        .unwrap()
    }

    fn me() -> RawUser {
        serde_json::from_value(serde_json::json!({"pk": 1, "username": "me"})).unwrap()
    }

    #[test]
    fn threads_filtered_by_allow_list() {
        let kept = build_threads(&me(), vec![sample_thread()], &["alice".to_string()], 10, MessageFilter::All);
        assert_eq!(kept.len(), 1);
        let dropped = build_threads(&me(), vec![sample_thread()], &["bob".to_string()], 10, MessageFilter::All);
        assert!(dropped.is_empty());
    }

    #[test]
    fn empty_allow_list_keeps_everything() {
        let kept = build_threads(&me(), vec![sample_thread()], &[], 10, MessageFilter::All);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn messages_are_limited_then_reversed_oldest_first() {
        let threads = build_threads(&me(), vec![sample_thread()], &[], 2, MessageFilter::All);
        let messages = &threads[0].messages;
        // Limit keeps the two newest, reversal puts the older of them first.
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].media_id, "m2");
        assert_eq!(messages[1].media_id, "m3");
    }

    #[test]
    fn clip_filter_keeps_only_clips() {
        let threads = build_threads(&me(), vec![sample_thread()], &[], 10, MessageFilter::Clip);
        let messages = &threads[0].messages;
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].kind, "clip");
    }

    #[test]
    fn unknown_sender_gets_id_fallback() {
        let threads = build_threads(&me(), vec![sample_thread()], &[], 10, MessageFilter::All);
        let oldest = &threads[0].messages[0];
        assert_eq!(oldest.sender, "User ID: 99");
        assert_eq!(oldest.sender_id, "99");
    }

    #[test]
    fn timestamps_render_rfc3339_millis() {
        let threads = build_threads(&me(), vec![sample_thread()], &[], 10, MessageFilter::All);
        let ts = &threads[0].messages.last().unwrap().timestamp;
        assert_eq!(ts, "2023-11-14T22:18:20.000Z");
    }
}
