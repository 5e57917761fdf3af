use crate::client::SpeakerClient;
use crate::config::SpeakerConfig;
use crate::error::Result;
use crate::mock::MockSpeaker;
use crate::status::PlayerStatus;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Capability set shared by the live speaker client and the in-process mock
///
/// No operation returns an error. A status query that fails for any reason
/// yields `None`, and a command yields `true` only when the device
/// acknowledged it. Failures are logged by the implementation.
#[async_trait]
pub trait SpeakerApi: Send + Sync {
    /// Query the current player status
    async fn get_status(&self) -> Option<PlayerStatus>;

    /// Switch the input source by key (`"wifi"`, `"bluetooth"`, `"line-in"`, ...)
    async fn switch_mode(&self, source: &str) -> bool;

    /// Play a single stream URL
    async fn play_url(&self, url: &str) -> bool;

    /// Play an m3u playlist URL
    async fn play_playlist(&self, url: &str) -> bool;

    /// Jump to a 1-based playlist position
    async fn play_index(&self, index: i32) -> bool;

    /// Set the repeat/shuffle mode by its numeric code
    async fn set_loop_mode(&self, code: u8) -> bool;

    /// Transport control: pause, resume, onepause, stop, prev or next
    async fn control(&self, action: &str) -> bool;

    async fn seek(&self, position: Duration) -> bool;

    /// Set the volume, clamped into `[0, 100]`
    async fn set_volume(&self, volume: i32) -> bool;

    /// Step the volume up or down by a fixed amount
    async fn adjust_volume(&self, increase: bool) -> bool;

    async fn set_mute(&self, mute: bool) -> bool;
}

/// Build the speaker backend selected by `config.use_mock`
///
/// The live client ties every request to `shutdown`.
pub fn connect(config: &SpeakerConfig, shutdown: CancellationToken) -> Result<Arc<dyn SpeakerApi>> {
    if config.use_mock {
        tracing::info!("Using mock speaker backend");
        return Ok(Arc::new(MockSpeaker::new()));
    }

    let client = SpeakerClient::from_config(config)?.with_shutdown(shutdown);
    tracing::info!("Using speaker at {}", client.base_url());
    Ok(Arc::new(client))
}
