use crate::api::SpeakerApi;
use crate::cache::StatusCache;
use crate::config::DEFAULT_POLL_INTERVAL_MS;
use crate::status::PlayerStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// How long `stop` waits for the polling task to wind down
const STOP_GRACE: Duration = Duration::from_millis(500);

/// Background task that keeps the [`StatusCache`] fresh
///
/// Each cycle queries the speaker, publishes the result, then waits a fixed
/// delay measured from the end of the cycle. A failed cycle is logged and the
/// loop carries on; only cancellation ends it.
///
/// # Example
///
/// ```no_run
/// use linkplay_remote::{MockSpeaker, StatusCache, StatusPoller};
/// use std::sync::Arc;
/// use tokio_util::sync::CancellationToken;
///
/// #[tokio::main]
/// async fn main() {
///     let cache = Arc::new(StatusCache::new());
///     let shutdown = CancellationToken::new();
///
///     let mut poller = StatusPoller::new(Arc::new(MockSpeaker::new()), cache.clone());
///     poller.start(&shutdown);
///
///     tokio::time::sleep(std::time::Duration::from_secs(3)).await;
///     if let Some(status) = cache.get() {
///         println!("{} at volume {}", status.title(), status.volume());
///     }
///
///     shutdown.cancel();
///     poller.stop().await;
/// }
/// ```
pub struct StatusPoller {
    api: Arc<dyn SpeakerApi>,
    cache: Arc<StatusCache>,
    interval: Duration,
    stop_token: Option<CancellationToken>,
    task_handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    pub fn new(api: Arc<dyn SpeakerApi>, cache: Arc<StatusCache>) -> Self {
        Self {
            api,
            cache,
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            stop_token: None,
            task_handle: None,
        }
    }

    /// Override the delay between cycles
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    pub fn is_running(&self) -> bool {
        self.task_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Spawn the polling loop
    ///
    /// The loop ends when `shutdown` is cancelled or [`stop`](Self::stop) is
    /// called. Starting an already running poller restarts it.
    pub fn start(&mut self, shutdown: &CancellationToken) {
        if let Some(token) = self.stop_token.take() {
            token.cancel();
        }

        let token = shutdown.child_token();
        self.stop_token = Some(token.clone());

        let api = self.api.clone();
        let cache = self.cache.clone();
        let interval = self.interval;

        self.task_handle = Some(tokio::spawn(async move {
            run_polling_loop(api, cache, interval, token).await;
        }));
    }

    /// Stop the polling loop, waiting briefly for it to exit
    ///
    /// The cached status is preserved.
    pub async fn stop(&mut self) {
        if let Some(token) = self.stop_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.task_handle.take() {
            let _ = tokio::time::timeout(STOP_GRACE, handle).await;
        }
    }

    /// Query the speaker immediately and publish the result
    ///
    /// Used after a command so callers see its effect without waiting for the
    /// next cycle. A scheduled poll in flight may still overwrite this result
    /// with older data; the cache keeps whichever write lands last.
    pub async fn refresh_now(&self) -> Option<Arc<PlayerStatus>> {
        refresh_status(&self.api, &self.cache).await
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        if let Some(token) = self.stop_token.take() {
            token.cancel();
        }
    }
}

async fn run_polling_loop(
    api: Arc<dyn SpeakerApi>,
    cache: Arc<StatusCache>,
    interval: Duration,
    token: CancellationToken,
) {
    tracing::info!("Status polling started (every {:?})", interval);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = refresh_status(&api, &cache) => {}
        }

        tokio::select! {
            _ = token.cancelled() => break,
            _ = sleep(interval) => {}
        }
    }

    tracing::info!("Status polling stopped");
}

/// Aborts the wrapped task when dropped
struct AbortOnDrop<T>(JoinHandle<T>);

impl<T> Drop for AbortOnDrop<T> {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Query the speaker once and publish the result into `cache`
///
/// A status is stored; no status is recorded as a failure, which marks the
/// device unreachable while keeping the last snapshot. The query runs on its
/// own task so a panicking backend costs one cycle, not the loop. Dropping
/// the returned future aborts the query.
pub async fn refresh_status(
    api: &Arc<dyn SpeakerApi>,
    cache: &StatusCache,
) -> Option<Arc<PlayerStatus>> {
    let api = api.clone();
    let mut query = AbortOnDrop(tokio::spawn(async move { api.get_status().await }));
    match (&mut query.0).await {
        Ok(Some(status)) => {
            cache.set(Some(status));
            cache.get()
        }
        Ok(None) => {
            tracing::debug!("Speaker reported no status, marking it unavailable");
            cache.record_failure();
            None
        }
        Err(e) => {
            tracing::warn!("Status polling failed: {}", e);
            cache.record_failure();
            None
        }
    }
}
