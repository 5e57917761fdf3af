//! Rust library for monitoring and controlling LinkPlay-based networked speakers
//!
//! This library provides an async client for the speaker's HTTP command API
//! together with the pieces a remote-control service needs around it:
//!
//! - Player status queries with human-readable labels
//! - Playback, source, loop mode, seek, volume and mute commands
//! - An in-process mock speaker for offline use and tests
//! - A shared status cache with change subscriptions
//! - A background poller that keeps the cache fresh
//! - A JSON-file store of named streaming URLs
//! - Health probes for the speaker and the store
//!
//! # Quick Start
//!
//! ```no_run
//! use linkplay_remote::{connect, SpeakerConfig, SpeakerController, StatusCache, StatusPoller};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SpeakerConfig::from_env()?;
//!     let shutdown = CancellationToken::new();
//!
//!     // Live client or mock, depending on SPEAKER_USE_MOCK
//!     let api = connect(&config, shutdown.clone())?;
//!     let cache = Arc::new(StatusCache::new());
//!
//!     // Keep the cache fresh in the background
//!     let mut poller = StatusPoller::new(api.clone(), cache.clone())
//!         .with_interval(config.poll_interval());
//!     poller.start(&shutdown);
//!
//!     // Issue a command; the cache is refreshed when it is acknowledged
//!     let controller = SpeakerController::new(api, cache.clone());
//!     println!("{}", controller.set_volume(25).await.message());
//!
//!     let mut updates = cache.subscribe();
//!     if let Ok(update) = updates.recv().await {
//!         println!("Status update: {:?}", update);
//!     }
//!
//!     shutdown.cancel();
//!     poller.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! # Direct Connection
//!
//! If you know the address of a speaker, you can talk to it directly:
//!
//! ```no_run
//! use linkplay_remote::{SpeakerApi, SpeakerClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SpeakerClient::new("http://192.168.1.50", Duration::from_secs(5))?;
//!     if let Some(status) = client.get_status().await {
//!         println!("{} - {} ({})", status.artist(), status.title(), status.status_label());
//!     }
//!     client.set_volume(30).await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The library is organized into several layers:
//!
//! - **Api**: The capability trait shared by the live client and the mock
//! - **Client**: HTTP requests against `httpapi.asp`
//! - **Mock**: Simulated device state
//! - **Cache / Poller**: Last known status and the loop that refreshes it
//! - **Controller**: Command mediation for interactive sessions
//! - **Streams**: Saved stream persistence
//! - **Protocol**: Command encoding and acknowledgment
//! - **Status / Types**: Status decoding, domain types and label tables

mod api;
mod cache;
mod client;
mod config;
mod controller;
mod error;
pub mod health;
mod mock;
mod poller;
pub mod protocol;
mod status;
mod streams;
mod subscription;
mod types;

// Public exports
pub use api::{connect, SpeakerApi};
pub use cache::{CachedStatus, StatusCache};
pub use client::SpeakerClient;
pub use config::SpeakerConfig;
pub use controller::{
    CommandOutcome, SpeakerController, StatusView, NOT_ACKNOWLEDGED_MESSAGE,
    STATUS_UNAVAILABLE_MESSAGE, UNSUPPORTED_SCHEME_MESSAGE,
};
pub use error::{Result, SpeakerError};
pub use health::{HealthReport, HealthStatus};
pub use mock::{MockSpeaker, MockState};
pub use poller::{refresh_status, StatusPoller};
pub use protocol::Command;
pub use status::{
    decode_hex_text, format_mmss, PlayerStatus, StatusFields, StatusPayload, NOT_AVAILABLE,
    NO_METADATA,
};
pub use streams::{StreamInfo, StreamStore};
pub use subscription::{StatusReceiver, StatusUpdate};
pub use types::{
    channel_label, device_type_label, loop_label, mode_label, source_mode_code, ControlAction,
    LoopMode, PlayerMode,
};
