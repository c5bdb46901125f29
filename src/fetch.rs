use async_trait::async_trait;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("image request failed: {0}")]
    Request(String),
    #[error("image host returned {0}")]
    Status(u16),
}

/// Downloads the raw bytes behind an image URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Request(format!("TimeoutError: {}", e))
                } else if e.is_connect() {
                    FetchError::Request(format!("ConnectError: {}", e))
                } else {
                    FetchError::Request(format!("RequestError: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
