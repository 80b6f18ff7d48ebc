use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::document::images::ImageLimits;
use crate::file_store::FileStore;
use crate::rag::RagClient;
use crate::search::BraveClient;

pub mod handlers;
pub mod models;

/// Shared by every handler.
pub struct AppState {
    pub config: Config,
    pub brave: BraveClient,
    pub rag: RagClient,
    /// Image downloads; timeouts are set per request from `image_limits`.
    pub fetcher: reqwest::Client,
    pub image_limits: ImageLimits,
    pub files: Arc<FileStore>,
}

impl AppState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut upstream = reqwest::Client::builder();
        if let Some(timeout) = config.upstream_timeout {
            upstream = upstream.timeout(timeout);
        }
        let upstream = upstream.build()?;
        let fetcher = reqwest::Client::builder().build()?;

        Ok(AppState {
            brave: BraveClient::new(upstream.clone(), config.brave_search_url.clone()),
            rag: RagClient::new(upstream),
            fetcher,
            image_limits: ImageLimits {
                timeout: config.image_fetch_timeout,
                max_bytes: config.max_image_bytes,
            },
            files: Arc::new(FileStore::new(config.output_dir.clone(), config.file_ttl)),
            config,
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    // Answers every OPTIONS request, preflight or not.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/brave_search", post(handlers::brave_search))
        .route("/vectorize-rag-retrieve", post(handlers::rag_retrieve))
        .route("/generate_docx", post(handlers::generate_docx))
        .route("/download/:file_id", get(handlers::download))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
