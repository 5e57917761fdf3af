use crate::status::PlayerStatus;
use crate::subscription::{StatusReceiver, StatusUpdate};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const UPDATE_CHANNEL_CAPACITY: usize = 16;

/// Contents of the status cache at one instant
#[derive(Debug, Clone, Default)]
pub struct CachedStatus {
    /// Latest snapshot, `None` before the first successful poll
    pub status: Option<Arc<PlayerStatus>>,

    /// When `status` was last written
    pub last_updated: Option<DateTime<Utc>>,

    /// When the latest poll failed; cleared by the next successful write
    pub last_failure: Option<DateTime<Utc>>,
}

impl CachedStatus {
    /// Whether the last poll reached the device
    ///
    /// After a failed poll `status` is only the last known state of an
    /// unreachable device.
    pub fn is_reachable(&self) -> bool {
        self.status.is_some() && self.last_failure.is_none()
    }

    /// The snapshot, only while the device is reachable
    pub fn current(&self) -> Option<Arc<PlayerStatus>> {
        if self.is_reachable() {
            self.status.clone()
        } else {
            None
        }
    }
}

/// Process-wide holder of the last known player status
///
/// Single slot, no history and no expiry. Writers are the poller and explicit
/// refreshes; readers only copy an `Arc` under the lock and never wait on the
/// network.
pub struct StatusCache {
    entry: Mutex<CachedStatus>,
    updates: broadcast::Sender<StatusUpdate>,
}

impl StatusCache {
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);
        Self {
            entry: Mutex::new(CachedStatus::default()),
            updates,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CachedStatus> {
        self.entry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Overwrite the snapshot and its timestamp
    pub fn set(&self, status: Option<PlayerStatus>) {
        let status = status.map(Arc::new);
        {
            let mut entry = self.lock();
            entry.status = status.clone();
            entry.last_updated = Some(Utc::now());
            entry.last_failure = None;
        }

        let update = match status {
            Some(status) => StatusUpdate::Available(status),
            None => StatusUpdate::Unavailable,
        };
        // No subscribers is fine.
        let _ = self.updates.send(update);
    }

    /// Note a failed poll without discarding the last known snapshot
    pub fn record_failure(&self) {
        self.lock().last_failure = Some(Utc::now());
        let _ = self.updates.send(StatusUpdate::Unavailable);
    }

    /// Latest snapshot, if any, even if the device has since gone away
    pub fn get(&self) -> Option<Arc<PlayerStatus>> {
        self.lock().status.clone()
    }

    /// Time of the last write, `None` if nothing was ever stored
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.lock().last_updated
    }

    /// Consistent copy of the whole entry
    pub fn snapshot(&self) -> CachedStatus {
        self.lock().clone()
    }

    /// Subscribe to every subsequent write
    pub fn subscribe(&self) -> StatusReceiver {
        StatusReceiver::new(self.updates.subscribe())
    }
}

impl Default for StatusCache {
    fn default() -> Self {
        Self::new()
    }
}
