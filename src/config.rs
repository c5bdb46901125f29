//! Process-wide configuration, read from the environment once at startup.
//!
//! - `FACE_APIKEY` / `FACE_ENDPOINT` - Face API credentials. When unset, the
//!   literal placeholders `<apikey>` and `<endpoint>` are used, so a
//!   misconfigured deployment still starts and fails on the first call.
//! - `FUNCTIONS_CUSTOMHANDLER_PORT` - Port assigned by the Functions host (default: 8000)
//! - `JPEG_QUALITY` - Output JPEG quality, 1-100 (default: 75)
//! - `RUST_LOG` - Log filter (default: `info`)

use std::env;

pub const API_KEY_PLACEHOLDER: &str = "<apikey>";
pub const ENDPOINT_PLACEHOLDER: &str = "<endpoint>";

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_JPEG_QUALITY: u8 = 75;

#[derive(Debug, Clone)]
pub struct Config {
    pub face_api_key: String,
    pub face_endpoint: String,
    pub listen_addr: String,
    pub jpeg_quality: u8,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let face_api_key =
            lookup("FACE_APIKEY").unwrap_or_else(|| API_KEY_PLACEHOLDER.to_string());
        let face_endpoint =
            lookup("FACE_ENDPOINT").unwrap_or_else(|| ENDPOINT_PLACEHOLDER.to_string());

        let port = lookup("FUNCTIONS_CUSTOMHANDLER_PORT")
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let jpeg_quality = lookup("JPEG_QUALITY")
            .and_then(|v| v.parse::<u8>().ok())
            .filter(|q| (1..=100).contains(q))
            .unwrap_or(DEFAULT_JPEG_QUALITY);

        Self {
            face_api_key,
            face_endpoint,
            listen_addr: format!("0.0.0.0:{}", port),
            jpeg_quality,
        }
    }

    pub fn uses_placeholder_credentials(&self) -> bool {
        self.face_api_key == API_KEY_PLACEHOLDER || self.face_endpoint == ENDPOINT_PLACEHOLDER
    }
}
