use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use instagram_client::{
    FileSessionStore, GraphClient, IgPublisher, InstagramReader, PrivateApiClient,
};
use socialgate_common::Config;
use uguu_client::UguuClient;

mod rest;

pub struct AppState {
    pub config: Config,
    pub stager: Arc<UguuClient>,
    pub publisher: IgPublisher,
    pub reader: InstagramReader,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("socialgate=info".parse()?))
        .init();

    let config = Config::from_env();

    let stager = Arc::new(UguuClient::new());
    let graph = Arc::new(GraphClient::new(config.ig_access_token.clone()));
    let publisher = IgPublisher::new(graph, stager.clone());

    let session_store = Arc::new(FileSessionStore::new(config.session_path.clone()));
    let private_api = Arc::new(PrivateApiClient::new(
        config.ig_username.clone(),
        config.ig_password.clone(),
        session_store,
    ));
    let reader = InstagramReader::new(private_api, config.ig_allowed_users.clone());

    let addr = format!("{}:{}", config.web_host, config.web_port);

    let state = Arc::new(AppState {
        config,
        stager,
        publisher,
        reader,
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // File staging
        .route("/file", post(rest::api_file_upload))
        // Instagram
        .route("/instagram/message", get(rest::api_instagram_messages))
        .route("/instagram/forward", get(rest::api_instagram_forward))
        .route("/instagram/peek", post(rest::api_instagram_peek))
        .route("/instagram/post", post(rest::api_instagram_post))
        // X
        .route("/x/post", get(rest::api_x_post_info).post(rest::api_x_post))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path only (no query params, no bodies)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    info!("Socialgate API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
