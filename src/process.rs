use std::sync::Arc;

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use url::Url;

use crate::crop::{CropError, ImageCropper};
use crate::face::{FaceApiError, FaceDetector};
use crate::fetch::{FetchError, ImageFetcher};

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Please pass a imageUrl on the query string")]
    MissingImageUrl,
    #[error("imageUrl must be a well-formed absolute URL")]
    InvalidImageUrl,
    #[error("No faces detected in the image")]
    NoFaces,
    #[error("Multiple faces detected in the image")]
    MultipleFaces,
    #[error("The image quality is too low for recognition")]
    LowQuality,
    #[error(transparent)]
    Detection(#[from] FaceApiError),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Crop(#[from] CropError),
    #[error("crop worker failed: {0}")]
    Worker(String),
}

impl ProcessError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProcessError::MissingImageUrl
            | ProcessError::InvalidImageUrl
            | ProcessError::NoFaces
            | ProcessError::MultipleFaces
            | ProcessError::LowQuality => StatusCode::BAD_REQUEST,
            ProcessError::Detection(_)
            | ProcessError::Fetch(_)
            | ProcessError::Crop(_)
            | ProcessError::Worker(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ProcessError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "image processing failed");
        } else {
            tracing::info!(reason = %self, "rejected image");
        }
        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.to_string(),
        )
            .into_response()
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────────────

/// Detect, validate, fetch, crop. Every step either hands on to the next or ends the request.
#[derive(Clone)]
pub struct ImagePipeline {
    detector: Arc<dyn FaceDetector>,
    fetcher: Arc<dyn ImageFetcher>,
    cropper: Arc<dyn ImageCropper>,
}

impl ImagePipeline {
    pub fn new(
        detector: Arc<dyn FaceDetector>,
        fetcher: Arc<dyn ImageFetcher>,
        cropper: Arc<dyn ImageCropper>,
    ) -> Self {
        Self {
            detector,
            fetcher,
            cropper,
        }
    }

    pub async fn run(&self, image_url: Option<&str>) -> Result<Vec<u8>, ProcessError> {
        let raw = image_url
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(ProcessError::MissingImageUrl)?;
        let url = Url::parse(raw).map_err(|_| ProcessError::InvalidImageUrl)?;

        let faces = self.detector.detect(&url).await?;
        tracing::debug!(url = %url, faces = faces.len(), "face detection finished");

        let face = match faces.as_slice() {
            [] => return Err(ProcessError::NoFaces),
            [face] => face.clone(),
            _ => return Err(ProcessError::MultipleFaces),
        };
        if face.is_low_quality() {
            return Err(ProcessError::LowQuality);
        }

        let bytes = self.fetcher.fetch(&url).await?;
        tracing::debug!(
            bytes = bytes.len(),
            left = face.rectangle.left,
            top = face.rectangle.top,
            width = face.rectangle.width,
            height = face.rectangle.height,
            "cropping face"
        );

        let cropper = Arc::clone(&self.cropper);
        let rect = face.rectangle;
        let jpeg = tokio::task::spawn_blocking(move || cropper.crop_to_jpeg(&bytes, rect))
            .await
            .map_err(|e| ProcessError::Worker(e.to_string()))??;
        Ok(jpeg)
    }
}
