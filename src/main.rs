use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tower_http::LatencyUnit;
use tracing::Level;

mod config;
mod crop;
mod face;
mod fetch;
mod models;
mod process;
#[cfg(test)]
mod test_support;

use config::Config;
use crop::JpegCropper;
use face::AzureFaceClient;
use fetch::HttpImageFetcher;
use models::ProcessQuery;
use process::ImagePipeline;

const FUNCTION_NAME: &str = "TraiterImages";
const USER_AGENT: &str = "face-crop-function/1.0";

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    if config.uses_placeholder_credentials() {
        tracing::warn!("FACE_APIKEY or FACE_ENDPOINT is unset; face detection calls will fail");
    }

    let client = reqwest::ClientBuilder::new()
        .user_agent(USER_AGENT)
        .build()
        .map_err(std::io::Error::other)?;
    let pipeline = ImagePipeline::new(
        Arc::new(AzureFaceClient::new(
            client.clone(),
            &config.face_endpoint,
            &config.face_api_key,
        )),
        Arc::new(HttpImageFetcher::new(client)),
        Arc::new(JpegCropper::new(config.jpeg_quality)),
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(pipeline)).await
}

fn app(pipeline: ImagePipeline) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            &format!("/api/{}", FUNCTION_NAME),
            get(process_images).post(process_images),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .latency_unit(LatencyUnit::Millis),
                ),
        )
        .with_state(pipeline)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn process_images(
    State(pipeline): State<ImagePipeline>,
    Query(query): Query<ProcessQuery>,
) -> Response {
    match pipeline.run(query.image_url.as_deref()).await {
        Ok(jpeg) => (StatusCode::OK, [(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response(),
        Err(e) => e.into_response(),
    }
}
