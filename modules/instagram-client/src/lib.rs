//! Instagram integration: Graph API publishing and private-API reads.
//!
//! Publishing goes through the official Graph container flow
//! ([`IgPublisher`]); inbox and profile reads use the private mobile
//! API behind a cached session ([`InstagramReader`]).

mod error;
pub mod feed;
pub mod forward;
pub mod graph;
pub mod inbox;
pub mod private;
pub mod publish;
pub mod session;
pub mod shortcode;
pub mod types;

use std::sync::Arc;

pub use error::{InstagramError, Result};
pub use feed::{ChildMediaItem, FeedMediaType, MediaItem};
pub use forward::forward_clips;
pub use graph::{GraphApi, GraphClient};
pub use inbox::{DirectItemContent, DirectMessage, DirectThread, MessageFilter};
pub use private::{PrivateApi, PrivateApiClient};
pub use publish::{ContainerStatus, FixedDelay, IgPublisher, MediaStager, PollSchedule, PollStep};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};

use socialgate_common::PeekFilter;

/// Read-side facade over the private API.
pub struct InstagramReader {
    api: Arc<dyn PrivateApi>,
    allowed_users: Vec<String>,
}

impl InstagramReader {
    pub fn new(api: Arc<dyn PrivateApi>, allowed_users: Vec<String>) -> Self {
        Self { api, allowed_users }
    }

    /// Direct-inbox threads, restricted to the allow-list when one is
    /// configured, with up to `limit` messages per thread.
    pub async fn direct_messages(
        &self,
        limit: usize,
        filter: MessageFilter,
    ) -> Result<Vec<DirectThread>> {
        let current_user = self.api.current_user().await?;
        let threads = self.api.direct_inbox().await?;
        Ok(inbox::build_threads(
            &current_user,
            threads,
            &self.allowed_users,
            limit,
            filter,
        ))
    }

    /// Recent posts from a profile.
    pub async fn peek(
        &self,
        username: &str,
        filter: PeekFilter,
        limit: i64,
    ) -> Result<Vec<MediaItem>> {
        feed::peek(self.api.as_ref(), username, filter, limit).await
    }

    /// One post, addressed by the segment from its permalink.
    pub async fn peek_post(&self, post_id: &str) -> Result<MediaItem> {
        feed::peek_post(self.api.as_ref(), post_id).await
    }
}
