//! Wire-level client for the Instagram Graph API publish endpoints.
//!
//! The publish orchestrator talks to this through the [`GraphApi`]
//! trait so tests can drive the container state machine with synthetic
//! status sequences.

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{InstagramError, Result};
use crate::publish::ContainerStatus;

const API_VERSION: &str = "v20.0";

/// Parameters for a container-create call. `children` set means a
/// carousel container; otherwise exactly one of `image_url`/`video_url`
/// is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContainerParams {
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub media_type: Option<String>,
    pub is_carousel_item: bool,
    pub caption: Option<String>,
    pub children: Option<Vec<String>>,
}

impl ContainerParams {
    fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(url) = &self.image_url {
            query.push(("image_url", url.clone()));
        }
        if let Some(url) = &self.video_url {
            query.push(("video_url", url.clone()));
        }
        if let Some(mt) = &self.media_type {
            query.push(("media_type", mt.clone()));
        }
        if self.is_carousel_item {
            query.push(("is_carousel_item", "true".to_string()));
        }
        if let Some(caption) = &self.caption {
            query.push(("caption", caption.clone()));
        }
        if let Some(children) = &self.children {
            query.push(("children", children.join(",")));
        }
        query
    }

    /// The staged URL this container wraps, for error reporting.
    fn staged_url(&self) -> String {
        self.image_url
            .clone()
            .or_else(|| self.video_url.clone())
            .unwrap_or_else(|| "<carousel>".to_string())
    }
}

/// The Graph API calls the publish pipeline needs.
#[async_trait]
pub trait GraphApi: Send + Sync {
    /// Resolve the acting account id from the access token.
    async fn current_user_id(&self) -> Result<String>;

    /// Create a media or carousel container, returning its id.
    async fn create_container(&self, user_id: &str, params: &ContainerParams) -> Result<String>;

    /// Sample a container's processing status. Remote truth, never cached.
    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus>;

    /// Publish a finished container.
    async fn publish_container(
        &self,
        user_id: &str,
        container_id: &str,
    ) -> Result<serde_json::Value>;
}

#[derive(Debug, Deserialize)]
struct IdResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_code: String,
}

pub struct GraphClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl GraphClient {
    pub fn new(access_token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: format!("https://graph.instagram.com/{API_VERSION}"),
            access_token,
        }
    }

    fn token(&self) -> Result<&str> {
        self.access_token
            .as_deref()
            .ok_or(InstagramError::CredentialsMissing)
    }
}

#[async_trait]
impl GraphApi for GraphClient {
    async fn current_user_id(&self) -> Result<String> {
        let token = self.token()?;
        let url = format!("{}/me", self.base_url);
        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "id"), ("access_token", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body, "Identity lookup failed");
            return Err(InstagramError::IdentityLookup {
                status: status.as_u16(),
            });
        }

        let user: IdResponse = resp.json().await.map_err(|e| {
            InstagramError::Parse(format!("unreadable identity response: {e}"))
        })?;
        Ok(user.id)
    }

    async fn create_container(&self, user_id: &str, params: &ContainerParams) -> Result<String> {
        let token = self.token()?;
        let url = format!("{}/{}/media", self.base_url, user_id);
        let mut query = params.to_query();
        query.push(("access_token", token.to_string()));

        let resp = self.client.post(&url).query(&query).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body, "Container create failed");
            return Err(InstagramError::ContainerCreate {
                staged_url: params.staged_url(),
                status: status.as_u16(),
            });
        }

        let created: IdResponse = resp.json().await.map_err(|e| {
            InstagramError::Parse(format!("unreadable container response: {e}"))
        })?;
        Ok(created.id)
    }

    async fn container_status(&self, container_id: &str) -> Result<ContainerStatus> {
        let token = self.token()?;
        let url = format!("{}/{}", self.base_url, container_id);
        let resp = self
            .client
            .get(&url)
            .query(&[("fields", "status_code"), ("access_token", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                container_id,
                status = status.as_u16(),
                body,
                "Status check failed"
            );
            return Err(InstagramError::Api {
                status: status.as_u16(),
                message: format!("failed to check status of container {container_id}"),
            });
        }

        let body: StatusResponse = resp.json().await.map_err(|e| {
            InstagramError::Parse(format!("unreadable status response: {e}"))
        })?;
        Ok(ContainerStatus::parse(&body.status_code))
    }

    async fn publish_container(
        &self,
        user_id: &str,
        container_id: &str,
    ) -> Result<serde_json::Value> {
        let token = self.token()?;
        let url = format!("{}/{}/media_publish", self.base_url, user_id);
        let resp = self
            .client
            .post(&url)
            .query(&[("creation_id", container_id), ("access_token", token)])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(
                container_id,
                status = status.as_u16(),
                body,
                "Publish failed"
            );
            return Err(InstagramError::Publish {
                container_id: container_id.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(resp.json().await.map_err(|e| {
            InstagramError::Parse(format!("unreadable publish response: {e}"))
        })?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carousel_params_serialize_children_comma_joined() {
        let params = ContainerParams {
            media_type: Some("CAROUSEL".to_string()),
            children: Some(vec!["11".to_string(), "22".to_string()]),
            caption: Some("hi".to_string()),
            ..Default::default()
        };
        let query = params.to_query();
        assert!(query.contains(&("children", "11,22".to_string())));
        assert!(query.contains(&("media_type", "CAROUSEL".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "is_carousel_item"));
    }

    #[test]
    fn child_params_omit_caption_and_carry_flag() {
        let params = ContainerParams {
            video_url: Some("https://staged/v.mp4".to_string()),
            is_carousel_item: true,
            ..Default::default()
        };
        let query = params.to_query();
        assert!(query.contains(&("is_carousel_item", "true".to_string())));
        assert!(query.contains(&("video_url", "https://staged/v.mp4".to_string())));
        assert!(!query.iter().any(|(k, _)| *k == "caption"));
    }

    #[test]
    fn missing_token_is_a_precondition_failure() {
        let client = GraphClient::new(None);
        assert!(matches!(
            client.token(),
            Err(InstagramError::CredentialsMissing)
        ));
    }
}
