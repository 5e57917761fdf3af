//! Print speaker status changes until Ctrl-C
//!
//! Configure with `SPEAKER_BASE_URL`, `SPEAKER_USE_MOCK=true`, and friends.
//! Log verbosity follows `RUST_LOG` (default `info`).

use linkplay_remote::health::{check_speaker, check_stream_store};
use linkplay_remote::{
    connect, SpeakerConfig, SpeakerError, StatusCache, StatusPoller, StatusUpdate, StreamStore,
    STATUS_UNAVAILABLE_MESSAGE,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = SpeakerConfig::from_env()?;
    let shutdown = CancellationToken::new();

    let api = connect(&config, shutdown.clone())?;
    let store = StreamStore::open(&config.stream_store_path).await?;

    let speaker_health = check_speaker(api.as_ref()).await;
    let store_health = check_stream_store(&store).await;
    println!("speaker: {:?} ({})", speaker_health.status, speaker_health.description);
    println!("streams: {:?} ({})", store_health.status, store_health.description);

    let cache = Arc::new(StatusCache::new());
    let mut updates = cache.subscribe();
    let mut poller = StatusPoller::new(api, cache.clone()).with_interval(config.poll_interval());
    poller.start(&shutdown);

    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    loop {
        let update = tokio::select! {
            _ = shutdown.cancelled() => break,
            update = updates.recv() => update,
        };

        match update {
            Ok(StatusUpdate::Available(status)) => println!(
                "[{}] {} - {} | {} | vol {}{} | {} | {}",
                status.status_label(),
                status.artist(),
                status.title(),
                status.mode_label(),
                status.volume(),
                if status.is_muted() { " (muted)" } else { "" },
                status.position_display(),
                status.playlist_display(),
            ),
            Ok(StatusUpdate::Unavailable) => println!("{STATUS_UNAVAILABLE_MESSAGE}"),
            Err(SpeakerError::Lagged(n)) => tracing::warn!("Skipped {} status updates", n),
            Err(_) => break,
        }
    }

    poller.stop().await;
    Ok(())
}
