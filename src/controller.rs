use crate::api::SpeakerApi;
use crate::cache::StatusCache;
use crate::poller::refresh_status;
use crate::protocol::clamp_volume;
use crate::status::PlayerStatus;
use crate::streams::{StreamInfo, StreamStore};
use crate::types::ControlAction;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

pub const NOT_ACKNOWLEDGED_MESSAGE: &str = "Speaker did not acknowledge the command.";
pub const UNSUPPORTED_SCHEME_MESSAGE: &str = "Saved stream has unsupported URL scheme.";
pub const STATUS_UNAVAILABLE_MESSAGE: &str = "Speaker status is unavailable.";
pub const BUSY_MESSAGE: &str = "Another command is still in progress.";

/// Result of a command issued through the [`SpeakerController`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// The device replied "OK"; carries a short confirmation
    Acknowledged(String),

    /// The device was reached but did not acknowledge, or was unreachable
    NotAcknowledged,

    /// The command was refused before anything was sent
    Rejected(String),
}

impl CommandOutcome {
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, CommandOutcome::Acknowledged(_))
    }

    /// Text suitable for showing to a user
    pub fn message(&self) -> &str {
        match self {
            CommandOutcome::Acknowledged(msg) | CommandOutcome::Rejected(msg) => msg,
            CommandOutcome::NotAcknowledged => NOT_ACKNOWLEDGED_MESSAGE,
        }
    }
}

/// What a status display should render
#[derive(Debug, Clone)]
pub enum StatusView {
    Available(Arc<PlayerStatus>),
    Unavailable,
}

impl StatusView {
    pub fn status(&self) -> Option<&PlayerStatus> {
        match self {
            StatusView::Available(status) => Some(status.as_ref()),
            StatusView::Unavailable => None,
        }
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            StatusView::Available(_) => None,
            StatusView::Unavailable => Some(STATUS_UNAVAILABLE_MESSAGE),
        }
    }
}

/// Issues commands on behalf of one interactive session
///
/// Only one command runs at a time; a command issued while another is in
/// flight is rejected rather than queued. Every acknowledged command is
/// followed by an immediate status refresh so the cache reflects its effect.
///
/// # Example
///
/// ```no_run
/// use linkplay_remote::{MockSpeaker, SpeakerController, StatusCache};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let controller = SpeakerController::new(
///         Arc::new(MockSpeaker::new()),
///         Arc::new(StatusCache::new()),
///     );
///
///     let outcome = controller.set_volume(30).await;
///     println!("{}", outcome.message());
/// }
/// ```
pub struct SpeakerController {
    api: Arc<dyn SpeakerApi>,
    cache: Arc<StatusCache>,
    busy: Mutex<()>,
}

impl SpeakerController {
    pub fn new(api: Arc<dyn SpeakerApi>, cache: Arc<StatusCache>) -> Self {
        Self {
            api,
            cache,
            busy: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    /// Run a boolean speaker command and refresh the cache on success
    pub async fn execute<F>(&self, success: impl Into<String>, command: F) -> CommandOutcome
    where
        F: Future<Output = bool>,
    {
        let Ok(_busy) = self.busy.try_lock() else {
            tracing::debug!("Command ignored, another one is in progress");
            return CommandOutcome::Rejected(BUSY_MESSAGE.to_string());
        };

        if !command.await {
            return CommandOutcome::NotAcknowledged;
        }

        refresh_status(&self.api, &self.cache).await;
        CommandOutcome::Acknowledged(success.into())
    }

    pub async fn set_volume(&self, volume: i32) -> CommandOutcome {
        let level = clamp_volume(volume);
        self.execute(format!("Volume set to {level}"), self.api.set_volume(level))
            .await
    }

    pub async fn volume_up(&self) -> CommandOutcome {
        self.execute("Volume increased", self.api.adjust_volume(true))
            .await
    }

    pub async fn volume_down(&self) -> CommandOutcome {
        self.execute("Volume decreased", self.api.adjust_volume(false))
            .await
    }

    pub async fn stop(&self) -> CommandOutcome {
        self.control(ControlAction::Stop).await
    }

    pub async fn control(&self, action: ControlAction) -> CommandOutcome {
        let message = match action {
            ControlAction::Pause => "Paused",
            ControlAction::Resume => "Resumed",
            ControlAction::OnePause => "Playback toggled",
            ControlAction::Stop => "Playback stopped",
            ControlAction::Prev => "Previous track",
            ControlAction::Next => "Next track",
        };
        self.execute(message, self.api.control(action.as_str()))
            .await
    }

    /// Flip mute relative to the cached status
    ///
    /// With nothing cached the speaker is assumed unmuted.
    pub async fn toggle_mute(&self) -> CommandOutcome {
        let mute = !self.cache.get().is_some_and(|s| s.is_muted());
        let message = if mute { "Muted" } else { "Unmuted" };
        self.execute(message, self.api.set_mute(mute)).await
    }

    pub async fn switch_source(&self, source: &str) -> CommandOutcome {
        self.execute(
            format!("Switched to {}", source.trim()),
            self.api.switch_mode(source),
        )
        .await
    }

    /// Play a saved stream; only `http` and `https` URLs are sent
    pub async fn play_stream(&self, stream: &StreamInfo) -> CommandOutcome {
        let playable = Url::parse(stream.url.trim())
            .is_ok_and(|url| matches!(url.scheme(), "http" | "https"));
        if !playable {
            tracing::warn!("Refusing to play {} ({})", stream.name, stream.url);
            return CommandOutcome::Rejected(UNSUPPORTED_SCHEME_MESSAGE.to_string());
        }

        self.execute(
            format!("Playing {}", stream.name),
            self.api.play_url(stream.url.trim()),
        )
        .await
    }

    /// Look up a saved stream by name and play it
    pub async fn play_named(&self, store: &StreamStore, name: &str) -> CommandOutcome {
        match store.find_by_name(name).await {
            Ok(Some(stream)) => self.play_stream(&stream).await,
            Ok(None) => CommandOutcome::Rejected(format!("No saved stream named \"{}\".", name.trim())),
            Err(e) => {
                tracing::error!("Failed to load saved streams: {}", e);
                CommandOutcome::Rejected("Saved streams could not be loaded.".to_string())
            }
        }
    }

    /// Current cached status, never touching the network
    ///
    /// Unavailable before the first successful poll and whenever the latest
    /// poll failed.
    pub fn status_view(&self) -> StatusView {
        match self.cache.snapshot().current() {
            Some(status) => StatusView::Available(status),
            None => StatusView::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockSpeaker, MockState};

    fn controller(speaker: Arc<MockSpeaker>) -> SpeakerController {
        SpeakerController::new(speaker, Arc::new(StatusCache::new()))
    }

    #[tokio::test]
    async fn acknowledged_command_refreshes_cache() {
        let speaker = Arc::new(MockSpeaker::new());
        let controller = controller(speaker.clone());
        assert!(matches!(controller.status_view(), StatusView::Unavailable));

        let outcome = controller.set_volume(150).await;
        assert_eq!(outcome, CommandOutcome::Acknowledged("Volume set to 100".into()));
        assert_eq!(speaker.snapshot().volume, 100);

        let view = controller.status_view();
        assert_eq!(view.status().unwrap().volume(), 100);
        assert!(view.message().is_none());
    }

    #[tokio::test]
    async fn failed_poll_makes_status_unavailable() {
        let controller = controller(Arc::new(MockSpeaker::new()));
        assert!(controller.volume_up().await.is_acknowledged());
        assert!(matches!(controller.status_view(), StatusView::Available(_)));

        controller.cache().record_failure();
        let view = controller.status_view();
        assert!(view.status().is_none());
        assert_eq!(view.message(), Some(STATUS_UNAVAILABLE_MESSAGE));
        assert!(controller.cache().get().is_some());

        assert!(controller.volume_down().await.is_acknowledged());
        assert!(matches!(controller.status_view(), StatusView::Available(_)));
    }

    #[tokio::test]
    async fn unacknowledged_command_leaves_cache_alone() {
        let controller = controller(Arc::new(MockSpeaker::new()));
        let outcome = controller.switch_source("cassette").await;
        assert_eq!(outcome, CommandOutcome::NotAcknowledged);
        assert_eq!(outcome.message(), NOT_ACKNOWLEDGED_MESSAGE);
        assert!(controller.cache().get().is_none());
    }

    #[tokio::test]
    async fn toggle_mute_follows_cached_state() {
        let speaker = Arc::new(MockSpeaker::new());
        let controller = controller(speaker.clone());

        assert_eq!(controller.toggle_mute().await.message(), "Muted");
        assert!(speaker.snapshot().muted);
        assert_eq!(controller.toggle_mute().await.message(), "Unmuted");
        assert!(!speaker.snapshot().muted);
    }

    #[tokio::test]
    async fn play_stream_refuses_other_schemes() {
        let speaker = Arc::new(MockSpeaker::new());
        let controller = controller(speaker.clone());

        let outcome = controller
            .play_stream(&StreamInfo::new("Local", "file:///music/a.mp3"))
            .await;
        assert_eq!(outcome, CommandOutcome::Rejected(UNSUPPORTED_SCHEME_MESSAGE.into()));
        assert!(speaker.snapshot().last_stream_url.is_none());

        let outcome = controller
            .play_stream(&StreamInfo::new("Radio", "https://radio.example/live"))
            .await;
        assert!(outcome.is_acknowledged());
        assert_eq!(
            speaker.snapshot().last_stream_url.as_deref(),
            Some("https://radio.example/live")
        );
    }

    #[tokio::test]
    async fn stop_uses_control_path() {
        let speaker = Arc::new(MockSpeaker::with_state(MockState {
            raw_status: "play".into(),
            ..MockState::default()
        }));
        let controller = controller(speaker.clone());

        assert_eq!(controller.stop().await.message(), "Playback stopped");
        assert_eq!(speaker.snapshot().raw_status, "stop");
        assert!(!controller.status_view().status().unwrap().is_playing());
    }

    #[tokio::test]
    async fn concurrent_command_is_rejected() {
        let controller = controller(Arc::new(MockSpeaker::new()));
        let (release, wait) = tokio::sync::oneshot::channel::<()>();

        let slow = controller.execute("slow", async {
            let _ = wait.await;
            true
        });
        let fast = async {
            let outcome = controller.volume_up().await;
            let _ = release.send(());
            outcome
        };

        let (slow, fast) = tokio::join!(slow, fast);
        assert!(slow.is_acknowledged());
        assert_eq!(fast, CommandOutcome::Rejected(BUSY_MESSAGE.into()));
    }
}
