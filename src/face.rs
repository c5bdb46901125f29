use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::models::{DetectedFace, FaceRectangle, QualityForRecognition};

// ── Constants ────────────────────────────────────────────────────────────────

const DETECT_PATH: &str = "/face/v1.2/detect";
const DETECTION_MODEL: &str = "detection_03";
const RECOGNITION_MODEL: &str = "recognition_04";
const QUALITY_ATTRIBUTE: &str = "qualityForRecognition";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum FaceApiError {
    #[error("face API request failed: {0}")]
    Request(String),
    #[error("face API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed face API response: {0}")]
    Decode(String),
}

// ── Capability ───────────────────────────────────────────────────────────────

/// Detects faces in a remote image, asking only for the recognition quality attribute.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, image_url: &Url) -> Result<Vec<DetectedFace>, FaceApiError>;
}

// ── Azure Face API client ────────────────────────────────────────────────────

pub struct AzureFaceClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl AzureFaceClient {
    pub fn new(client: reqwest::Client, endpoint: &str, api_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn detect_url(&self) -> String {
        format!("{}{}", self.endpoint, DETECT_PATH)
    }
}

#[async_trait]
impl FaceDetector for AzureFaceClient {
    async fn detect(&self, image_url: &Url) -> Result<Vec<DetectedFace>, FaceApiError> {
        let response = self
            .client
            .post(self.detect_url())
            .query(&[
                ("detectionModel", DETECTION_MODEL),
                ("recognitionModel", RECOGNITION_MODEL),
                ("returnFaceId", "false"),
                ("returnFaceLandmarks", "false"),
                ("returnFaceAttributes", QUALITY_ATTRIBUTE),
            ])
            .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
            .json(&serde_json::json!({ "url": image_url.as_str() }))
            .send()
            .await
            .map_err(|e| FaceApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FaceApiError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FaceApiError::Request(e.to_string()))?;
        parse_detect_response(&body)
    }
}

// ── Wire format ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireFace {
    face_rectangle: FaceRectangle,
    face_attributes: Option<WireAttributes>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttributes {
    quality_for_recognition: Option<QualityForRecognition>,
}

impl WireFace {
    fn into_detected_face(self) -> DetectedFace {
        DetectedFace {
            rectangle: self.face_rectangle,
            quality: self
                .face_attributes
                .and_then(|attrs| attrs.quality_for_recognition),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireErrorEnvelope {
    error: WireError,
}

#[derive(Debug, Deserialize)]
struct WireError {
    code: Option<String>,
    message: String,
}

fn parse_detect_response(body: &[u8]) -> Result<Vec<DetectedFace>, FaceApiError> {
    let faces: Vec<WireFace> =
        serde_json::from_slice(body).map_err(|e| FaceApiError::Decode(e.to_string()))?;
    Ok(faces.into_iter().map(WireFace::into_detected_face).collect())
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<WireErrorEnvelope>(body) {
        Ok(WireErrorEnvelope {
            error: WireError {
                code: Some(code),
                message,
            },
        }) => format!("{} ({})", message, code),
        Ok(envelope) => envelope.error.message,
        Err(_) => body.trim().to_string(),
    }
}
