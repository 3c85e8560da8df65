//! Private mobile-API client used by the inbox and feed read paths.
//!
//! Sessions are cookie-based. On first use the client restores a
//! serialized session from the [`SessionStore`], verifies it with a
//! cheap authenticated call, and only falls back to a credential login
//! when the cached session is missing or rejected.

use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::error::{InstagramError, Result};
use crate::session::SessionStore;
use crate::types::{RawFeedPage, RawMedia, RawThread, RawUser};

const BASE_URL: &str = "https://i.instagram.com/api/v1";
const USER_AGENT: &str =
    "Instagram 361.0.0.46.88 Android (30/11; 420dpi; 1080x2220; samsung; SM-G973F; beyond1; exynos9820; en_US)";

/// Authenticated read surface of the private API.
#[async_trait]
pub trait PrivateApi: Send + Sync {
    async fn current_user(&self) -> Result<RawUser>;
    async fn user_id_by_username(&self, username: &str) -> Result<String>;
    async fn direct_inbox(&self) -> Result<Vec<RawThread>>;
    async fn user_feed(&self, user_id: &str, max_id: Option<&str>) -> Result<RawFeedPage>;
    async fn media_info(&self, media_id: u64) -> Result<RawMedia>;
}

/// What gets persisted between restarts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub cookies: HashMap<String, String>,
    pub user_id: Option<String>,
    pub device_id: String,
}

impl SessionState {
    fn cookie_header(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct PrivateApiClient {
    client: reqwest::Client,
    username: Option<String>,
    password: Option<String>,
    store: Arc<dyn SessionStore>,
    base_url: String,
    session: Mutex<Option<SessionState>>,
}

impl PrivateApiClient {
    pub fn new(
        username: Option<String>,
        password: Option<String>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            username,
            password,
            store,
            base_url: BASE_URL.to_string(),
            session: Mutex::new(None),
        }
    }

    /// Return a usable session, restoring from the store or logging in.
    async fn ensure_session(&self) -> Result<SessionState> {
        let mut guard = self.session.lock().await;
        if let Some(state) = guard.as_ref() {
            return Ok(state.clone());
        }

        if let Some(raw) = self.store.load() {
            match serde_json::from_str::<SessionState>(&raw) {
                Ok(state) => {
                    if self.fetch_current_user(&state).await.is_ok() {
                        *guard = Some(state.clone());
                        return Ok(state);
                    }
                    // The only swallowed failure: a stale cache just
                    // means we log in again.
                    info!("cached instagram session rejected, logging in again");
                }
                Err(err) => {
                    info!(error = %err, "cached instagram session unreadable, logging in again");
                }
            }
        }

        let state = self.login().await?;
        self.store.save(&serde_json::to_string(&state)?)?;
        *guard = Some(state.clone());
        Ok(state)
    }

    async fn login(&self) -> Result<SessionState> {
        let (Some(username), Some(password)) = (&self.username, &self.password) else {
            return Err(InstagramError::CredentialsMissing);
        };
        let device_id = device_id_for(username);

        let resp = self
            .client
            .post(format!("{}/accounts/login/", self.base_url))
            .header("User-Agent", USER_AGENT)
            .form(&[
                ("username", username.as_str()),
                ("password", password.as_str()),
                ("device_id", device_id.as_str()),
                ("login_attempt_count", "0"),
            ])
            .send()
            .await?;

        let mut cookies = HashMap::new();
        collect_cookies(resp.headers(), &mut cookies);
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Session(format!(
                "login failed with status {status}: {message}"
            )));
        }

        let body: LoginResponse = resp.json().await?;
        Ok(SessionState {
            cookies,
            user_id: Some(body.logged_in_user.pk.to_string()),
            device_id,
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        state: &SessionState,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(format!("{}{path}", self.base_url))
            .header("User-Agent", USER_AGENT)
            .header("Cookie", state.cookie_header())
            .query(query)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(InstagramError::Api { status, message });
        }
        Ok(resp.json().await?)
    }

    async fn fetch_current_user(&self, state: &SessionState) -> Result<RawUser> {
        let body: CurrentUserResponse = self
            .get_json(state, "/accounts/current_user/", &[])
            .await?;
        Ok(body.user)
    }
}

/// Stable per-account device identity, kept across logins so the
/// account does not look like a new device every restart.
fn device_id_for(username: &str) -> String {
    let mut hasher = DefaultHasher::new();
    username.hash(&mut hasher);
    format!("android-{:016x}", hasher.finish())
}

fn collect_cookies(headers: &reqwest::header::HeaderMap, cookies: &mut HashMap<String, String>) {
    for value in headers.get_all(reqwest::header::SET_COOKIE) {
        let Ok(raw) = value.to_str() else { continue };
        let pair = raw.split(';').next().unwrap_or(raw);
        if let Some((name, value)) = pair.split_once('=') {
            cookies.insert(name.trim().to_string(), value.trim().to_string());
        }
    }
}

#[derive(Deserialize)]
struct LoginResponse {
    logged_in_user: RawUser,
}

#[derive(Deserialize)]
struct CurrentUserResponse {
    user: RawUser,
}

#[derive(Deserialize)]
struct UsernameInfoResponse {
    user: RawUser,
}

#[derive(Deserialize)]
struct InboxResponse {
    inbox: InboxPayload,
}

#[derive(Deserialize)]
struct InboxPayload {
    threads: Vec<RawThread>,
}

#[derive(Deserialize)]
struct MediaInfoResponse {
    items: Vec<RawMedia>,
}

#[async_trait]
impl PrivateApi for PrivateApiClient {
    async fn current_user(&self) -> Result<RawUser> {
        let state = self.ensure_session().await?;
        self.fetch_current_user(&state).await
    }

    async fn user_id_by_username(&self, username: &str) -> Result<String> {
        let state = self.ensure_session().await?;
        let body: UsernameInfoResponse = self
            .get_json(&state, &format!("/users/{username}/usernameinfo/"), &[])
            .await?;
        Ok(body.user.pk.to_string())
    }

    async fn direct_inbox(&self) -> Result<Vec<RawThread>> {
        let state = self.ensure_session().await?;
        let body: InboxResponse = self.get_json(&state, "/direct_v2/inbox/", &[]).await?;
        Ok(body.inbox.threads)
    }

    async fn user_feed(&self, user_id: &str, max_id: Option<&str>) -> Result<RawFeedPage> {
        let state = self.ensure_session().await?;
        let mut query: Vec<(&str, &str)> = Vec::new();
        if let Some(max_id) = max_id {
            query.push(("max_id", max_id));
        }
        self.get_json(&state, &format!("/feed/user/{user_id}/"), &query)
            .await
    }

    async fn media_info(&self, media_id: u64) -> Result<RawMedia> {
        let state = self.ensure_session().await?;
        let body: MediaInfoResponse = self
            .get_json(&state, &format!("/media/{media_id}/info/"), &[])
            .await?;
        body.items
            .into_iter()
            .next()
            .ok_or_else(|| InstagramError::Parse("media info returned no items".to_string()))
    }
}
