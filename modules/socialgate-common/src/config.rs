use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables.
///
/// Platform credentials load as `Option` — a missing credential is a
/// request-time precondition failure surfaced by the client that needs
/// it, not a boot-time panic. The server should come up even when only
/// one platform is configured.
#[derive(Debug, Clone)]
pub struct Config {
    // Instagram account (private-session read paths)
    pub ig_username: Option<String>,
    pub ig_password: Option<String>,

    /// Usernames whose inbox threads may be read. Empty means no
    /// restriction.
    pub ig_allowed_users: Vec<String>,

    // Instagram Graph API (publish pipeline)
    pub ig_access_token: Option<String>,

    // X / Twitter (OAuth 1.0a user context)
    pub x_api_key: Option<String>,
    pub x_api_secret: Option<String>,
    pub x_access_token: Option<String>,
    pub x_access_token_secret: Option<String>,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    /// Where the serialized Instagram session cache lives.
    pub session_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            ig_username: env::var("IG_USERNAME").ok(),
            ig_password: env::var("IG_PASSWORD").ok(),
            ig_allowed_users: env::var("IG_ALLOWED_USERS")
                .map(|raw| {
                    raw.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            ig_access_token: env::var("IG_ACCESS_TOKEN").ok(),
            x_api_key: env::var("X_API_KEY").ok(),
            x_api_secret: env::var("X_API_SECRET").ok(),
            x_access_token: env::var("X_ACCESS_TOKEN").ok(),
            x_access_token_secret: env::var("X_ACCESS_TOKEN_SECRET").ok(),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env::var("WEB_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("WEB_PORT must be a number"),
            session_path: env::var("IG_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("ig-session.json")),
        }
    }
}
