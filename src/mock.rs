use crate::api::SpeakerApi;
use crate::protocol::{clamp_volume, VOLUME_STEP};
use crate::status::{PlayerStatus, StatusFields};
use crate::types::{source_mode_code, ControlAction};
use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use url::Url;

const MOCK_ARTIST: &str = "Mock Artist";
const MOCK_ALBUM: &str = "Mock Album";
const MOCK_TRACK_LENGTH: Duration = Duration::from_secs(5 * 60);

/// State of the simulated device
///
/// Every command replaces the whole value under one lock and bumps `version`,
/// so readers never see a half-applied change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockState {
    pub version: u64,
    pub mode_code: String,
    pub loop_code: String,
    pub raw_status: String,
    pub playlist_count: i32,
    /// Zero-based
    pub playlist_index: i32,
    pub position: Duration,
    pub total_length: Option<Duration>,
    pub volume: i32,
    pub muted: bool,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub last_stream_url: Option<String>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            version: 0,
            mode_code: "10".to_string(),
            loop_code: "4".to_string(),
            raw_status: "stop".to_string(),
            playlist_count: 5,
            playlist_index: 0,
            position: Duration::ZERO,
            total_length: Some(MOCK_TRACK_LENGTH),
            volume: 42,
            muted: false,
            title: "Welcome Track".to_string(),
            artist: MOCK_ARTIST.to_string(),
            album: MOCK_ALBUM.to_string(),
            last_stream_url: None,
        }
    }
}

impl MockState {
    fn to_status(&self) -> PlayerStatus {
        PlayerStatus::new(StatusFields {
            device_type: Some("0".to_string()),
            channel: Some("0".to_string()),
            mode: Some(self.mode_code.clone()),
            loop_code: Some(self.loop_code.clone()),
            equalizer: Some(0),
            status: Some(self.raw_status.clone()),
            position: Some(self.position),
            playlist_offset: Some(self.position),
            total_length: self.total_length,
            playlist_count: Some(self.playlist_count),
            playlist_index: Some(self.playlist_index),
            volume: Some(self.volume),
            muted: Some(self.muted),
            title: Some(self.title.clone()),
            artist: Some(self.artist.clone()),
            album: Some(self.album.clone()),
        })
    }
}

/// In-process speaker that applies commands to local state
///
/// Implements the same contract as [`SpeakerClient`](crate::SpeakerClient) and
/// is selected with `use_mock` for offline use and tests.
#[derive(Debug, Default)]
pub struct MockSpeaker {
    state: Mutex<MockState>,
}

impl MockSpeaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a specific state
    pub fn with_state(state: MockState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> MockState {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `transition` atomically; `None` leaves the state untouched
    fn transition<F>(&self, transition: F) -> bool
    where
        F: FnOnce(&MockState) -> Option<MockState>,
    {
        let mut state = self.lock();
        match transition(&state) {
            Some(mut next) => {
                next.version = state.version + 1;
                *state = next;
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl SpeakerApi for MockSpeaker {
    async fn get_status(&self) -> Option<PlayerStatus> {
        Some(self.lock().to_status())
    }

    async fn switch_mode(&self, source: &str) -> bool {
        let Some(code) = source_mode_code(source) else {
            tracing::warn!("Mock received unknown input source {:?}", source);
            return false;
        };
        self.transition(|s| {
            Some(MockState {
                mode_code: code.to_string(),
                ..s.clone()
            })
        });
        tracing::info!("Mock switched mode to {}", source.trim());
        true
    }

    async fn play_url(&self, url: &str) -> bool {
        let title = track_name(url);
        self.transition(|s| {
            Some(MockState {
                title,
                artist: MOCK_ARTIST.to_string(),
                album: MOCK_ALBUM.to_string(),
                raw_status: "play".to_string(),
                position: Duration::ZERO,
                total_length: Some(MOCK_TRACK_LENGTH),
                last_stream_url: Some(url.to_string()),
                ..s.clone()
            })
        });
        tracing::info!("Mock started playing URL {}", url);
        true
    }

    async fn play_playlist(&self, url: &str) -> bool {
        self.play_url(url).await
    }

    async fn play_index(&self, index: i32) -> bool {
        let index = index.saturating_sub(1).max(0);
        self.transition(|s| {
            Some(MockState {
                playlist_index: index,
                raw_status: "play".to_string(),
                ..s.clone()
            })
        });
        tracing::info!("Mock switched to playlist index {}", index);
        true
    }

    async fn set_loop_mode(&self, code: u8) -> bool {
        self.transition(|s| {
            Some(MockState {
                loop_code: code.to_string(),
                ..s.clone()
            })
        });
        tracing::info!("Mock loop mode set to {}", code);
        true
    }

    async fn control(&self, action: &str) -> bool {
        let action = match action.parse::<ControlAction>() {
            Ok(action) => action,
            Err(_) => {
                tracing::warn!("Mock received unsupported control {:?}", action);
                return false;
            }
        };

        self.transition(|s| {
            let next = match action {
                ControlAction::Pause => MockState {
                    raw_status: "pause".to_string(),
                    ..s.clone()
                },
                ControlAction::Resume => MockState {
                    raw_status: "play".to_string(),
                    ..s.clone()
                },
                ControlAction::OnePause => MockState {
                    raw_status: if s.raw_status == "play" { "pause" } else { "play" }.to_string(),
                    ..s.clone()
                },
                ControlAction::Stop => MockState {
                    raw_status: "stop".to_string(),
                    position: Duration::ZERO,
                    ..s.clone()
                },
                ControlAction::Prev => MockState {
                    playlist_index: (s.playlist_index - 1).max(0),
                    raw_status: "play".to_string(),
                    ..s.clone()
                },
                ControlAction::Next => {
                    let last = (s.playlist_count - 1).max(0);
                    MockState {
                        playlist_index: (s.playlist_index + 1).min(last),
                        raw_status: "play".to_string(),
                        ..s.clone()
                    }
                }
            };
            Some(next)
        });
        tracing::info!("Mock control executed: {}", action);
        true
    }

    async fn seek(&self, position: Duration) -> bool {
        let mut target = position;
        self.transition(|s| {
            if let Some(total) = s.total_length {
                target = position.min(total);
            }
            Some(MockState {
                position: target,
                ..s.clone()
            })
        });
        tracing::info!("Mock seek performed: {:?}", target);
        true
    }

    async fn set_volume(&self, volume: i32) -> bool {
        let volume = clamp_volume(volume);
        self.transition(|s| {
            Some(MockState {
                volume,
                ..s.clone()
            })
        });
        tracing::info!("Mock volume set to {}", volume);
        true
    }

    async fn adjust_volume(&self, increase: bool) -> bool {
        let delta = if increase { VOLUME_STEP } else { -VOLUME_STEP };
        let mut volume = 0;
        self.transition(|s| {
            volume = clamp_volume(s.volume.saturating_add(delta));
            Some(MockState {
                volume,
                ..s.clone()
            })
        });
        tracing::info!("Mock volume adjusted by {} to {}", delta, volume);
        true
    }

    async fn set_mute(&self, mute: bool) -> bool {
        self.transition(|s| {
            Some(MockState {
                muted: mute,
                ..s.clone()
            })
        });
        tracing::info!("Mock mute toggled to {}", mute);
        true
    }
}

/// Display name for a stream: last path segment, else host, else the input
fn track_name(url: &str) -> String {
    if url.trim().is_empty() {
        return "Stream".to_string();
    }
    let Ok(parsed) = Url::parse(url.trim()) else {
        return url.to_string();
    };
    parsed
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(str::to_string)
        .or_else(|| parsed.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
