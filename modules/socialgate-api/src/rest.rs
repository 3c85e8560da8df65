use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use instagram_client::MessageFilter;
use socialgate_common::{MediaObject, PeekFilter, PostType};
use x_client::{OauthSigner, XClient, XError};

use crate::AppState;

// --- Request bodies ---

#[derive(Deserialize)]
pub struct FileRequest {
    url: Option<String>,
}

#[derive(Deserialize)]
pub struct MessagesQuery {
    limit: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Deserialize)]
pub struct PeekRequest {
    username: Option<String>,
    filter: Option<PeekFilter>,
    limit: Option<i64>,
    #[serde(rename = "postId")]
    post_id: Option<String>,
}

#[derive(Deserialize)]
pub struct PublishRequest {
    media: Option<Vec<MediaObject>>,
    #[serde(rename = "postType")]
    post_type: Option<PostType>,
    caption: Option<String>,
}

/// Fields stay raw JSON so wrong-typed values surface as 400
/// validation errors rather than a body-extractor rejection.
#[derive(Deserialize)]
pub struct TweetRequest {
    text: Option<serde_json::Value>,
    #[serde(rename = "mediaUrl")]
    media_url: Option<serde_json::Value>,
}

fn parse_tweet_request(
    body: TweetRequest,
) -> std::result::Result<(String, Option<String>), &'static str> {
    let text = match body.text {
        Some(serde_json::Value::String(text)) if !text.is_empty() => text,
        _ => return Err("Text is required and must be a string"),
    };
    if text.chars().count() > 280 {
        return Err("Text must be 280 characters or less");
    }
    let media_url = match body.media_url {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(url)) => Some(url),
        Some(_) => return Err("Media URL must be a string"),
    };
    Ok((text, media_url))
}

// --- Handlers ---

pub async fn api_file_upload(
    State(state): State<Arc<AppState>>,
    Json(body): Json<FileRequest>,
) -> impl IntoResponse {
    let Some(url) = body.url.filter(|u| !u.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "URL is required" })),
        )
            .into_response();
    };

    match state.stager.stage(&url).await {
        Ok(file_url) => Json(serde_json::json!({
            "success": true,
            "file": file_url,
            "message": "File uploaded successfully to uguu.se"
        }))
        .into_response(),
        Err(e) => {
            warn!(error = %e, "File upload failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "success": false,
                    "error": "Failed to upload file",
                    "details": e.to_string()
                })),
            )
                .into_response()
        }
    }
}

pub async fn api_instagram_messages(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MessagesQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(10);
    let filter = match params.kind.as_deref() {
        Some("clip") => MessageFilter::Clip,
        _ => MessageFilter::All,
    };

    match state.reader.direct_messages(limit, filter).await {
        Ok(threads) => Json(threads).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load direct messages");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

pub async fn api_instagram_forward(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match instagram_client::forward_clips(&state.reader, &state.publisher).await {
        Ok(forwarded) => {
            tracing::info!(forwarded, "Forwarded clip messages");
            Json(serde_json::json!({ "message": "ok" })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to forward messages");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to forward messages" })),
            )
                .into_response()
        }
    }
}

pub async fn api_instagram_peek(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PeekRequest>,
) -> impl IntoResponse {
    // A post id addresses one post; otherwise walk a profile's feed.
    if let Some(post_id) = &body.post_id {
        return match state.reader.peek_post(post_id).await {
            Ok(item) => Json(item).into_response(),
            Err(e) => instagram_error_response(e, "Failed to peek post"),
        };
    }

    let Some(username) = body.username.filter(|u| !u.is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "username is required" })),
        )
            .into_response();
    };
    let filter = body.filter.unwrap_or_default();
    let limit = body.limit.unwrap_or(10);

    match state.reader.peek(&username, filter, limit).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => instagram_error_response(e, "Failed to peek profile"),
    }
}

pub async fn api_instagram_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<PublishRequest>,
) -> impl IntoResponse {
    let (Some(media), Some(post_type)) = (body.media, body.post_type) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "message": "media and postType are required" })),
        )
            .into_response();
    };

    match state
        .publisher
        .publish(&media, post_type, body.caption.as_deref())
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(e) => instagram_error_response(e, "Failed to publish post"),
    }
}

pub async fn api_x_post(
    State(state): State<Arc<AppState>>,
    Json(body): Json<TweetRequest>,
) -> impl IntoResponse {
    let (text, media_url) = match parse_tweet_request(body) {
        Ok(parsed) => parsed,
        Err(message) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response();
        }
    };

    let signer = match OauthSigner::new(
        state.config.x_api_key.clone(),
        state.config.x_api_secret.clone(),
        state.config.x_access_token.clone(),
        state.config.x_access_token_secret.clone(),
    ) {
        Ok(signer) => signer,
        Err(e) => {
            warn!(error = %e, "X credentials missing");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "X API configuration error" })),
            )
                .into_response();
        }
    };

    match XClient::new(signer)
        .post_tweet(&text, media_url.as_deref())
        .await
    {
        Ok(tweet) => Json(serde_json::json!({ "success": true, "data": tweet })).into_response(),
        Err(e) => x_error_response(e),
    }
}

pub async fn api_x_post_info() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "X Post API endpoint - use POST method to post tweets"
    }))
}

// --- Error mapping ---

fn instagram_error_response(
    err: instagram_client::InstagramError,
    context: &'static str,
) -> axum::response::Response {
    let status = if err.is_caller_error() {
        StatusCode::BAD_REQUEST
    } else {
        warn!(error = %err, "{context}");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (
        status,
        Json(serde_json::json!({ "message": err.to_string() })),
    )
        .into_response()
}

fn x_error_response(err: XError) -> axum::response::Response {
    let (status, message) = match &err {
        XError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
        XError::CredentialsMissing => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "X API configuration error".to_string(),
        ),
        _ => match err.upstream_status() {
            Some(401) | Some(403) => (
                StatusCode::UNAUTHORIZED,
                "X API authentication failed".to_string(),
            ),
            Some(429) => (
                StatusCode::TOO_MANY_REQUESTS,
                "Rate limit exceeded".to_string(),
            ),
            _ => {
                warn!(error = %err, "Failed to post tweet");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to post tweet".to_string(),
                )
            }
        },
    };
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
