use crate::error::{Result, SpeakerError};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://192.168.1.50";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const MIN_REQUEST_TIMEOUT_SECS: u64 = 1;
pub const MAX_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_STREAM_STORE_PATH: &str = "App_Data/streams.json";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;

/// Speaker connection settings
///
/// Deserializes from a camelCase JSON section, with every field optional:
///
/// ```json
/// { "baseUrl": "http://192.168.1.50", "requestTimeoutSecs": 10, "useMock": false }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeakerConfig {
    /// Absolute URL of the speaker, e.g. `http://192.168.1.50`
    pub base_url: String,

    /// Per-request timeout in seconds, clamped into `[1, 120]`
    pub request_timeout_secs: u64,

    /// Use the in-process mock instead of a real device
    pub use_mock: bool,

    /// JSON file holding saved streams
    pub stream_store_path: PathBuf,

    /// Delay between status polls, in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for SpeakerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            use_mock: false,
            stream_store_path: PathBuf::from(DEFAULT_STREAM_STORE_PATH),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl SpeakerConfig {
    /// Parse and validate a JSON configuration section
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read settings from `SPEAKER_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(base_url) = std::env::var("SPEAKER_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("SPEAKER_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout
                .trim()
                .parse()
                .map_err(|_| SpeakerError::Config(format!("invalid SPEAKER_TIMEOUT_SECS: {timeout}")))?;
        }
        if let Ok(use_mock) = std::env::var("SPEAKER_USE_MOCK") {
            config.use_mock = matches!(use_mock.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Ok(path) = std::env::var("SPEAKER_STREAM_STORE") {
            config.stream_store_path = PathBuf::from(path);
        }
        if let Ok(interval) = std::env::var("SPEAKER_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval.trim().parse().map_err(|_| {
                SpeakerError::Config(format!("invalid SPEAKER_POLL_INTERVAL_MS: {interval}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the live client cannot work with
    ///
    /// The base URL is only checked when the live backend is selected.
    pub fn validate(&self) -> Result<()> {
        if !self.use_mock {
            self.device_url()?;
        }
        if self.poll_interval_ms == 0 {
            return Err(SpeakerError::Config("poll interval must be positive".to_string()));
        }
        Ok(())
    }

    /// The base URL, parsed and normalized with a trailing slash
    pub fn device_url(&self) -> Result<Url> {
        if self.base_url.trim().is_empty() {
            return Err(SpeakerError::Config("speaker base URL is missing".to_string()));
        }
        let url = crate::protocol::normalize_base_url(&self.base_url)
            .map_err(|e| SpeakerError::Config(format!("speaker base URL must be absolute: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(SpeakerError::Config(format!(
                "unsupported scheme for speaker base URL: {other}"
            ))),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS),
        )
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}
