//! Stubs and fixtures shared by the unit tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use url::Url;

use crate::face::{FaceApiError, FaceDetector};
use crate::fetch::{FetchError, ImageFetcher};
use crate::models::{DetectedFace, FaceRectangle, QualityForRecognition};

/// Serves `router` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

pub fn face(
    left: u32,
    top: u32,
    width: u32,
    height: u32,
    quality: Option<QualityForRecognition>,
) -> DetectedFace {
    DetectedFace {
        rectangle: FaceRectangle {
            left,
            top,
            width,
            height,
        },
        quality,
    }
}

/// PNG that is pure red left of `split_x` and pure blue from there on.
pub fn split_png(width: u32, height: u32, split_x: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < split_x {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// PNG with a half-transparent lower half.
pub fn split_rgba_png(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |_, y| {
        if y < height / 2 {
            Rgba([0, 255, 0, 255])
        } else {
            Rgba([0, 255, 0, 128])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

pub struct StubDetector {
    result: Result<Vec<DetectedFace>, u16>,
    calls: AtomicUsize,
    last_url: Mutex<Option<String>>,
}

impl StubDetector {
    pub fn faces(faces: Vec<DetectedFace>) -> Self {
        Self::with_result(Ok(faces))
    }

    pub fn failing(status: u16) -> Self {
        Self::with_result(Err(status))
    }

    fn with_result(result: Result<Vec<DetectedFace>, u16>) -> Self {
        Self {
            result,
            calls: AtomicUsize::new(0),
            last_url: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_url(&self) -> Option<String> {
        self.last_url.lock().unwrap().clone()
    }
}

#[async_trait]
impl FaceDetector for StubDetector {
    async fn detect(&self, image_url: &Url) -> Result<Vec<DetectedFace>, FaceApiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(image_url.to_string());
        match &self.result {
            Ok(faces) => Ok(faces.clone()),
            Err(status) => Err(FaceApiError::Api {
                status: *status,
                message: "stubbed failure".to_string(),
            }),
        }
    }
}

pub struct StubFetcher {
    bytes: Vec<u8>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for StubFetcher {
    async fn fetch(&self, _url: &Url) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.bytes.clone())
    }
}
