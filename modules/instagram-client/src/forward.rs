//! Republish clip direct messages as feed posts: the newest clip in
//! each allowed thread goes back out through the publish pipeline.

use socialgate_common::{MediaKind, MediaObject, PostType};

use crate::error::Result;
use crate::inbox::{DirectItemContent, DirectMessage, MessageFilter};
use crate::publish::IgPublisher;
use crate::InstagramReader;

/// Media and post shape for a message, when it carries republishable
/// media. Clips go out as reels; plain media and shares as images.
fn forwardable(message: &DirectMessage) -> Option<(MediaObject, PostType, Option<String>)> {
    match &message.content {
        DirectItemContent::Clip(clip) => clip.media_url.as_ref().map(|url| {
            (
                MediaObject {
                    url: url.clone(),
                    kind: MediaKind::Video,
                },
                PostType::Reels,
                (!clip.caption.is_empty()).then(|| clip.caption.clone()),
            )
        }),
        DirectItemContent::MediaShare(share) => share.media_url.as_ref().map(|url| {
            (
                MediaObject {
                    url: url.clone(),
                    kind: MediaKind::Image,
                },
                PostType::Image,
                (!share.caption.is_empty()).then(|| share.caption.clone()),
            )
        }),
        DirectItemContent::Media(media) => media.media_url.as_ref().map(|url| {
            (
                MediaObject {
                    url: url.clone(),
                    kind: MediaKind::Image,
                },
                PostType::Image,
                None,
            )
        }),
        _ => None,
    }
}

/// Read the newest clip message per thread and publish each one.
/// Returns how many posts went out; an empty inbox forwards nothing.
pub async fn forward_clips(reader: &InstagramReader, publisher: &IgPublisher) -> Result<usize> {
    let threads = reader.direct_messages(1, MessageFilter::Clip).await?;

    let mut forwarded = 0;
    for thread in &threads {
        for message in &thread.messages {
            let Some((media, post_type, caption)) = forwardable(message) else {
                continue;
            };
            tracing::info!(
                media_id = %message.media_id,
                sender = %message.sender,
                post_type = post_type.as_str(),
                "Forwarding direct message"
            );
            publisher
                .publish(&[media], post_type, caption.as_deref())
                .await?;
            forwarded += 1;
        }
    }
    Ok(forwarded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::graph::{ContainerParams, GraphApi};
    use crate::publish::{ContainerStatus, MediaStager, PollSchedule};
    use crate::types::{RawFeedPage, RawMedia, RawThread, RawUser};
    use crate::PrivateApi;

    struct FixedInbox {
        threads: Vec<serde_json::Value>,
    }

    #[async_trait]
    impl PrivateApi for FixedInbox {
        async fn current_user(&self) -> Result<RawUser> {
            Ok(serde_json::from_value(serde_json::json!({"pk": 1, "username": "me"})).unwrap())
        }
        async fn user_id_by_username(&self, _username: &str) -> Result<String> {
            unimplemented!("not used by forwarding tests")
        }
        async fn direct_inbox(&self) -> Result<Vec<RawThread>> {
            Ok(self
                .threads
                .iter()
                .map(|t| serde_json::from_value(t.clone()).unwrap())
                .collect())
        }
        async fn user_feed(&self, _user_id: &str, _max_id: Option<&str>) -> Result<RawFeedPage> {
            unimplemented!("not used by forwarding tests")
        }
        async fn media_info(&self, _media_id: u64) -> Result<RawMedia> {
            unimplemented!("not used by forwarding tests")
        }
    }

    struct CountingGraph {
        created: Mutex<Vec<ContainerParams>>,
        published: AtomicU32,
    }

    impl CountingGraph {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                created: Mutex::new(Vec::new()),
                published: AtomicU32::new(0),
            })
        }
    }

    #[async_trait]
    impl GraphApi for CountingGraph {
        async fn current_user_id(&self) -> Result<String> {
            Ok("ig-user-1".to_string())
        }
        async fn create_container(
            &self,
            _user_id: &str,
            params: &ContainerParams,
        ) -> Result<String> {
            self.created.lock().unwrap().push(params.clone());
            Ok("container-1".to_string())
        }
        async fn container_status(&self, _container_id: &str) -> Result<ContainerStatus> {
            Ok(ContainerStatus::Finished)
        }
        async fn publish_container(
            &self,
            _user_id: &str,
            _container_id: &str,
        ) -> Result<serde_json::Value> {
            self.published.fetch_add(1, Ordering::SeqCst);
            Ok(serde_json::json!({ "id": "post-1" }))
        }
    }

    struct PassthroughStager;

    #[async_trait]
    impl MediaStager for PassthroughStager {
        async fn stage(&self, source_url: &str) -> Result<String> {
            Ok(source_url.to_string())
        }
    }

    struct NoWait;

    #[async_trait]
    impl PollSchedule for NoWait {
        fn max_attempts(&self) -> u32 {
            20
        }
        async fn wait(&self) {}
    }

    fn clip_thread() -> serde_json::Value {
        serde_json::json!({
            "thread_id": "t1",
            "users": [{"pk": 42, "username": "alice"}],
            "items": [
                {"item_id": "m1", "item_type": "clip", "user_id": 42,
                 "timestamp": "1700000000000000",
                 "clip": {"clip": {
                     "video_versions": [{"url": "https://v/reel.mp4"}],
                     "caption": {"text": "a reel"}
                 }}}
            ]
        })
    }

    fn fixtures(
        threads: Vec<serde_json::Value>,
    ) -> (InstagramReader, IgPublisher, Arc<CountingGraph>) {
        let reader = InstagramReader::new(Arc::new(FixedInbox { threads }), Vec::new());
        let graph = CountingGraph::new();
        let publisher = IgPublisher::new(graph.clone(), Arc::new(PassthroughStager))
            .with_schedule(Arc::new(NoWait));
        (reader, publisher, graph)
    }

    #[tokio::test]
    async fn newest_clip_goes_out_as_a_reel() {
        let (reader, publisher, graph) = fixtures(vec![clip_thread()]);

        let forwarded = forward_clips(&reader, &publisher).await.unwrap();

        assert_eq!(forwarded, 1);
        let created = graph.created.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].video_url.as_deref(), Some("https://v/reel.mp4"));
        assert_eq!(created[0].media_type.as_deref(), Some("REELS"));
        assert_eq!(created[0].caption.as_deref(), Some("a reel"));
        assert_eq!(graph.published.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn empty_inbox_forwards_nothing() {
        let (reader, publisher, graph) = fixtures(vec![]);

        let forwarded = forward_clips(&reader, &publisher).await.unwrap();

        assert_eq!(forwarded, 0);
        assert_eq!(graph.published.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn threads_whose_newest_message_is_not_a_clip_are_skipped() {
        let thread = serde_json::json!({
            "thread_id": "t1",
            "users": [{"pk": 42, "username": "alice"}],
            "items": [
                {"item_id": "m2", "item_type": "text", "user_id": 42,
                 "timestamp": "1700000100000000", "text": "newest"},
                {"item_id": "m1", "item_type": "clip", "user_id": 42,
                 "timestamp": "1700000000000000",
                 "clip": {"clip": {"video_versions": [{"url": "https://v/reel.mp4"}]}}}
            ]
        });
        let (reader, publisher, graph) = fixtures(vec![thread]);

        // Only the newest message per thread is considered, and it is
        // not a clip.
        let forwarded = forward_clips(&reader, &publisher).await.unwrap();

        assert_eq!(forwarded, 0);
        assert_eq!(graph.published.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clip_without_renditions_is_not_forwardable() {
        let message = DirectMessage {
            kind: "clip".to_string(),
            content: DirectItemContent::Clip(crate::inbox::ClipContent {
                media_url: None,
                thumbnail_url: None,
                caption: String::new(),
            }),
            sender_id: "42".to_string(),
            sender: "alice".to_string(),
            timestamp: String::new(),
            media_id: "m1".to_string(),
        };
        assert!(forwardable(&message).is_none());
    }
}
