use crate::error::{Result, SpeakerError};
use crate::status::PlayerStatus;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Change published by the status cache
#[derive(Debug, Clone)]
pub enum StatusUpdate {
    /// A fresh snapshot was stored
    Available(Arc<PlayerStatus>),

    /// The device could not be reached or reported nothing
    Unavailable,
}

/// Receiver for status cache updates
pub struct StatusReceiver {
    rx: broadcast::Receiver<StatusUpdate>,
}

impl StatusReceiver {
    pub(crate) fn new(rx: broadcast::Receiver<StatusUpdate>) -> Self {
        Self { rx }
    }

    /// Receive the next status update
    ///
    /// Fails with [`SpeakerError::Closed`] once the cache is dropped.
    pub async fn recv(&mut self) -> Result<StatusUpdate> {
        self.rx.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Closed => SpeakerError::Closed,
            broadcast::error::RecvError::Lagged(n) => SpeakerError::Lagged(n),
        })
    }

    /// Try to receive a status update without blocking
    ///
    /// Returns `None` if no update is waiting.
    pub fn try_recv(&mut self) -> Result<Option<StatusUpdate>> {
        match self.rx.try_recv() {
            Ok(update) => Ok(Some(update)),
            Err(broadcast::error::TryRecvError::Empty) => Ok(None),
            Err(broadcast::error::TryRecvError::Closed) => Err(SpeakerError::Closed),
            Err(broadcast::error::TryRecvError::Lagged(n)) => Err(SpeakerError::Lagged(n)),
        }
    }
}
