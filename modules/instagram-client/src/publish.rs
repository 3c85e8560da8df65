//! Instagram publish pipeline: container state machine + orchestrator.
//!
//! Containers are server-side processing jobs. A post publishes in
//! stages: stage the media at a public URL, create a container per
//! item, poll video/carousel containers until terminal, then issue the
//! publish call. The transition function is pure; the schedule that
//! owns delay and attempt budget is injected, so tests drive the loop
//! with synthetic status sequences instead of elapsed time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use socialgate_common::{MediaKind, MediaObject, PostType};
use uguu_client::UguuClient;

use crate::error::{InstagramError, Result};
use crate::graph::{ContainerParams, GraphApi};

pub const CAROUSEL_MIN: usize = 2;
pub const CAROUSEL_MAX: usize = 10;

const POLL_DELAY: Duration = Duration::from_secs(3);
const POLL_MAX_ATTEMPTS: u32 = 20;

/// Remote processing status of a media container, as reported by the
/// `status_code` field. Never cached: every sample is a fresh fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerStatus {
    InProgress,
    Finished,
    Error,
    Expired,
    Published,
    Unknown(String),
}

impl ContainerStatus {
    pub fn parse(code: &str) -> Self {
        match code {
            "IN_PROGRESS" => ContainerStatus::InProgress,
            "FINISHED" => ContainerStatus::Finished,
            "ERROR" => ContainerStatus::Error,
            "EXPIRED" => ContainerStatus::Expired,
            "PUBLISHED" => ContainerStatus::Published,
            other => ContainerStatus::Unknown(other.to_string()),
        }
    }
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainerStatus::InProgress => write!(f, "IN_PROGRESS"),
            ContainerStatus::Finished => write!(f, "FINISHED"),
            ContainerStatus::Error => write!(f, "ERROR"),
            ContainerStatus::Expired => write!(f, "EXPIRED"),
            ContainerStatus::Published => write!(f, "PUBLISHED"),
            ContainerStatus::Unknown(s) => write!(f, "{s}"),
        }
    }
}

/// What the poll loop does with a fresh status sample.
#[derive(Debug)]
pub enum PollStep {
    /// Terminal success; `PUBLISHED` is a no-op success for containers
    /// that already went out.
    Ready,
    /// Still processing, sample again after the schedule's delay.
    Retry,
    /// Terminal failure, not retryable within this attempt.
    Failed(InstagramError),
}

/// Pure transition function of the container state machine.
pub fn advance(container_id: &str, status: ContainerStatus) -> PollStep {
    match status {
        ContainerStatus::Finished | ContainerStatus::Published => PollStep::Ready,
        ContainerStatus::InProgress => PollStep::Retry,
        ContainerStatus::Error | ContainerStatus::Expired => {
            PollStep::Failed(InstagramError::ContainerFailed {
                container_id: container_id.to_string(),
                status: status.to_string(),
            })
        }
        ContainerStatus::Unknown(other) => {
            PollStep::Failed(InstagramError::ContainerUnknownState {
                container_id: container_id.to_string(),
                status: other,
            })
        }
    }
}

/// Owns the poll loop's delay and attempt budget.
#[async_trait]
pub trait PollSchedule: Send + Sync {
    fn max_attempts(&self) -> u32;
    async fn wait(&self);
}

/// Production schedule: 20 attempts, 3 seconds apart (60s ceiling).
pub struct FixedDelay {
    delay: Duration,
    attempts: u32,
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self {
            delay: POLL_DELAY,
            attempts: POLL_MAX_ATTEMPTS,
        }
    }
}

#[async_trait]
impl PollSchedule for FixedDelay {
    fn max_attempts(&self) -> u32 {
        self.attempts
    }

    async fn wait(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Re-hosts a source URL somewhere the platform can fetch it.
#[async_trait]
pub trait MediaStager: Send + Sync {
    async fn stage(&self, source_url: &str) -> Result<String>;
}

#[async_trait]
impl MediaStager for UguuClient {
    async fn stage(&self, source_url: &str) -> Result<String> {
        Ok(UguuClient::stage(self, source_url).await?)
    }
}

/// Top-level publish orchestrator.
pub struct IgPublisher {
    graph: Arc<dyn GraphApi>,
    stager: Arc<dyn MediaStager>,
    schedule: Arc<dyn PollSchedule>,
}

impl IgPublisher {
    pub fn new(graph: Arc<dyn GraphApi>, stager: Arc<dyn MediaStager>) -> Self {
        Self {
            graph,
            stager,
            schedule: Arc::new(FixedDelay::default()),
        }
    }

    pub fn with_schedule(mut self, schedule: Arc<dyn PollSchedule>) -> Self {
        self.schedule = schedule;
        self
    }

    /// Publish a single post or a carousel. Returns the raw publish
    /// response from the platform.
    pub async fn publish(
        &self,
        media: &[MediaObject],
        post_type: PostType,
        caption: Option<&str>,
    ) -> Result<serde_json::Value> {
        // Cardinality checks come before any network call.
        match post_type {
            PostType::Carousel => {
                if !(CAROUSEL_MIN..=CAROUSEL_MAX).contains(&media.len()) {
                    return Err(InstagramError::InvalidCarouselSize(media.len()));
                }
            }
            _ => {
                if media.len() != 1 {
                    return Err(InstagramError::InvalidMediaCount {
                        post_type: post_type.as_str().to_string(),
                        count: media.len(),
                    });
                }
            }
        }

        let user_id = self.graph.current_user_id().await?;
        tracing::info!(user_id = %user_id, post_type = post_type.as_str(), items = media.len(), "Publishing");

        let final_container_id = match post_type {
            PostType::Carousel => {
                // Children are independent: create them concurrently.
                let children = try_join_all(
                    media
                        .iter()
                        .map(|item| self.create_media_container(&user_id, item, true, None, None)),
                )
                .await?;
                let carousel_id = self
                    .create_carousel_container(&user_id, &children, caption)
                    .await?;
                self.wait_until_ready(&carousel_id).await?;
                carousel_id
            }
            single => {
                let item = &media[0];
                let container_id = self
                    .create_media_container(&user_id, item, false, caption, Some(single))
                    .await?;
                // Images are synchronously ready; only video processing is polled.
                if item.kind == MediaKind::Video {
                    self.wait_until_ready(&container_id).await?;
                }
                container_id
            }
        };

        let result = self
            .graph
            .publish_container(&user_id, &final_container_id)
            .await?;
        tracing::info!(container_id = %final_container_id, "Published");
        Ok(result)
    }

    async fn create_media_container(
        &self,
        user_id: &str,
        media: &MediaObject,
        carousel_child: bool,
        caption: Option<&str>,
        single_post_type: Option<PostType>,
    ) -> Result<String> {
        let staged_url = self.stager.stage(&media.url).await?;

        let mut params = ContainerParams::default();
        match media.kind {
            MediaKind::Video => params.video_url = Some(staged_url),
            MediaKind::Image => params.image_url = Some(staged_url),
        }
        if carousel_child {
            // Children never carry a caption; the carousel does.
            params.is_carousel_item = true;
        } else {
            if let Some(pt @ (PostType::Reels | PostType::Stories | PostType::Video)) =
                single_post_type
            {
                params.media_type = Some(pt.as_str().to_string());
            }
            params.caption = caption.map(str::to_string);
        }

        let container_id = self.graph.create_container(user_id, &params).await?;
        tracing::debug!(container_id = %container_id, carousel_child, "Container created");
        Ok(container_id)
    }

    async fn create_carousel_container(
        &self,
        user_id: &str,
        children: &[String],
        caption: Option<&str>,
    ) -> Result<String> {
        // The orchestrator validated already, but do not assume the caller did.
        if !(CAROUSEL_MIN..=CAROUSEL_MAX).contains(&children.len()) {
            return Err(InstagramError::InvalidCarouselSize(children.len()));
        }

        let params = ContainerParams {
            media_type: Some("CAROUSEL".to_string()),
            children: Some(children.to_vec()),
            caption: caption.map(str::to_string),
            ..Default::default()
        };
        self.graph.create_container(user_id, &params).await
    }

    /// Bounded poll until the container reaches a terminal state.
    pub async fn wait_until_ready(&self, container_id: &str) -> Result<()> {
        let max_attempts = self.schedule.max_attempts();
        for attempt in 1..=max_attempts {
            let status = self.graph.container_status(container_id).await?;
            match advance(container_id, status) {
                PollStep::Ready => {
                    tracing::debug!(container_id, attempt, "Container ready");
                    return Ok(());
                }
                PollStep::Failed(err) => return Err(err),
                PollStep::Retry => {
                    tracing::debug!(container_id, attempt, max_attempts, "Container processing");
                    self.schedule.wait().await;
                }
            }
        }
        Err(InstagramError::ContainerTimeout {
            container_id: container_id.to_string(),
        })
    }
}
