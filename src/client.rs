use crate::api::SpeakerApi;
use crate::config::SpeakerConfig;
use crate::error::{Result, SpeakerError};
use crate::protocol::{is_acknowledged, normalize_base_url, Command};
use crate::status::{PlayerStatus, StatusPayload};
use crate::types::{source_mode_code, ControlAction};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Longest response excerpt included in log lines
const LOG_BODY_LIMIT: usize = 120;

/// Client for a speaker's HTTP command channel
///
/// Every operation is a single `GET <base>/httpapi.asp?command=...`. Requests
/// are bounded by the configured timeout and abandoned as soon as the shutdown
/// token is cancelled.
///
/// # Example
///
/// ```no_run
/// use linkplay_remote::{SpeakerApi, SpeakerClient};
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = SpeakerClient::new("http://192.168.1.50", Duration::from_secs(5))?;
///     if let Some(status) = client.get_status().await {
///         println!("{} - {} ({})", status.artist(), status.title(), status.status_label());
///     }
///     client.set_volume(30).await;
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SpeakerClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    shutdown: CancellationToken,
}

impl SpeakerClient {
    /// Create a client for the speaker at `base_url`
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(request_timeout).build()?;
        Self::with_client(http, base_url, request_timeout)
    }

    /// Create a client from validated configuration
    pub fn from_config(config: &SpeakerConfig) -> Result<Self> {
        let base_url = config.device_url()?;
        Self::new(base_url.as_str(), config.request_timeout())
    }

    /// Create a client around an existing `reqwest::Client`
    pub fn with_client(http: reqwest::Client, base_url: &str, request_timeout: Duration) -> Result<Self> {
        let base_url = normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout: request_timeout,
            shutdown: CancellationToken::new(),
        })
    }

    /// Abandon in-flight and future requests once `shutdown` is cancelled
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a command and return the raw response body
    async fn send(&self, command: &Command) -> Result<String> {
        if self.shutdown.is_cancelled() {
            return Err(SpeakerError::Cancelled);
        }

        let url = command.url(&self.base_url)?;
        tracing::debug!("Sending: {}", command);

        let request = async {
            let response = self.http.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SpeakerError::Status(status.as_u16()));
            }
            Ok(response.text().await?)
        };

        tokio::select! {
            _ = self.shutdown.cancelled() => Err(SpeakerError::Cancelled),
            result = timeout(self.timeout, request) => match result {
                Ok(Ok(body)) => {
                    tracing::debug!("Received: {}", excerpt(&body));
                    Ok(body)
                }
                Ok(Err(SpeakerError::Http(e))) if e.is_timeout() => Err(SpeakerError::Timeout),
                Ok(Err(e)) => Err(e),
                Err(_) => Err(SpeakerError::Timeout),
            },
        }
    }

    /// Query and decode the player status, surfacing the failure reason
    pub async fn fetch_status(&self) -> Result<PlayerStatus> {
        let body = self.send(&Command::GetPlayerStatus).await?;
        Ok(StatusPayload::from_json(&body)?.into_status())
    }

    /// Send a command and report whether the device acknowledged it
    pub async fn execute(&self, command: Command) -> bool {
        match self.send(&command).await {
            Ok(body) if is_acknowledged(&body) => true,
            Ok(body) => {
                tracing::warn!("Speaker command {} was not acknowledged: {}", command, excerpt(&body));
                false
            }
            Err(SpeakerError::Status(code)) => {
                tracing::warn!("Speaker command {} failed with HTTP {}", command, code);
                false
            }
            Err(e) => {
                tracing::error!("Speaker command {} failed: {}", command, e);
                false
            }
        }
    }
}

#[async_trait]
impl SpeakerApi for SpeakerClient {
    async fn get_status(&self) -> Option<PlayerStatus> {
        match self.fetch_status().await {
            Ok(status) => Some(status),
            Err(SpeakerError::Status(code)) => {
                tracing::warn!("Speaker status request failed with HTTP {}", code);
                None
            }
            Err(e) => {
                tracing::error!("Unable to retrieve player status: {}", e);
                None
            }
        }
    }

    async fn switch_mode(&self, source: &str) -> bool {
        if source_mode_code(source).is_none() {
            tracing::warn!("Unknown input source {:?}", source);
            return false;
        }
        self.execute(Command::SwitchMode(source.trim().to_string())).await
    }

    async fn play_url(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            tracing::warn!("Refusing to play an empty URL");
            return false;
        }
        self.execute(Command::Play(url.trim().to_string())).await
    }

    async fn play_playlist(&self, url: &str) -> bool {
        if url.trim().is_empty() {
            tracing::warn!("Refusing to play an empty playlist URL");
            return false;
        }
        self.execute(Command::PlayPlaylist(url.trim().to_string())).await
    }

    async fn play_index(&self, index: i32) -> bool {
        self.execute(Command::PlayIndex(index)).await
    }

    async fn set_loop_mode(&self, code: u8) -> bool {
        self.execute(Command::LoopMode(code)).await
    }

    async fn control(&self, action: &str) -> bool {
        match action.parse::<ControlAction>() {
            Ok(action) => self.execute(Command::Control(action)).await,
            Err(e) => {
                tracing::warn!("{}", e);
                false
            }
        }
    }

    async fn seek(&self, position: Duration) -> bool {
        self.execute(Command::seek(position)).await
    }

    async fn set_volume(&self, volume: i32) -> bool {
        self.execute(Command::volume(volume)).await
    }

    async fn adjust_volume(&self, increase: bool) -> bool {
        let command = if increase { Command::VolumeUp } else { Command::VolumeDown };
        self.execute(command).await
    }

    async fn set_mute(&self, mute: bool) -> bool {
        self.execute(Command::Mute(mute)).await
    }
}

fn excerpt(body: &str) -> &str {
    let body = body.trim();
    match body.char_indices().nth(LOG_BODY_LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let client = SpeakerClient::new("http://192.168.1.50", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url().as_str(), "http://192.168.1.50/");
    }

    #[test]
    fn relative_base_url_is_rejected() {
        assert!(SpeakerClient::new("speaker", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let long = "é".repeat(LOG_BODY_LIMIT + 10);
        assert_eq!(excerpt(&long).chars().count(), LOG_BODY_LIMIT);
        assert_eq!(excerpt("  OK \n"), "OK");
    }

    #[tokio::test]
    async fn cancelled_client_fails_without_network() {
        let shutdown = CancellationToken::new();
        shutdown.cancel();
        // Port 9 (discard) is never contacted because the token is already cancelled.
        let client = SpeakerClient::new("http://127.0.0.1:9", Duration::from_secs(1))
            .unwrap()
            .with_shutdown(shutdown);
        assert!(client.get_status().await.is_none());
        assert!(!client.set_mute(true).await);
        assert!(matches!(client.fetch_status().await, Err(SpeakerError::Cancelled)));
    }

    #[tokio::test]
    async fn invalid_arguments_fail_locally() {
        let client = SpeakerClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
        assert!(!client.control("bogus").await);
        assert!(!client.switch_mode("  ").await);
        assert!(!client.switch_mode("hdmi").await);
        assert!(!client.play_url("").await);
    }
}
