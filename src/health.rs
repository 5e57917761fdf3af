use crate::api::SpeakerApi;
use crate::streams::StreamStore;
use serde::Serialize;

/// Coarse health of one dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Outcome of a health probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub description: String,
}

impl HealthReport {
    pub fn healthy(description: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Healthy, description)
    }

    pub fn degraded(description: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Degraded, description)
    }

    pub fn unhealthy(description: impl Into<String>) -> Self {
        Self::with_status(HealthStatus::Unhealthy, description)
    }

    fn with_status(status: HealthStatus, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Probe the speaker with one live status query
///
/// An unreachable speaker only degrades the service; the cache still serves
/// the last known state.
pub async fn check_speaker(api: &dyn SpeakerApi) -> HealthReport {
    match api.get_status().await {
        Some(_) => HealthReport::healthy("Speaker reachable"),
        None => HealthReport::degraded("Speaker unreachable or returned null status"),
    }
}

/// Probe the saved stream store by reading it
pub async fn check_stream_store(store: &StreamStore) -> HealthReport {
    match store.get_all().await {
        Ok(items) => HealthReport::healthy(format!("{} streams loaded", items.len())),
        Err(e) => {
            tracing::warn!("Stream store health check failed: {}", e);
            HealthReport::unhealthy(format!("Failed to read stream store: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockSpeaker;
    use crate::streams::StreamInfo;

    #[tokio::test]
    async fn mock_speaker_is_healthy() {
        let report = check_speaker(&MockSpeaker::new()).await;
        assert!(report.is_healthy());
        assert_eq!(report.description, "Speaker reachable");
    }

    #[tokio::test]
    async fn stream_store_reports_count() {
        let dir = tempfile::tempdir().unwrap();
        let store = StreamStore::open(dir.path().join("streams.json")).await.unwrap();
        store
            .upsert(StreamInfo::new("Jazz", "http://radio.example/jazz"))
            .await
            .unwrap();

        let report = check_stream_store(&store).await;
        assert_eq!(report, HealthReport::healthy("1 streams loaded"));
    }

    #[tokio::test]
    async fn unreadable_store_is_unhealthy() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be cannot be read as text.
        let path = dir.path().join("streams.json");
        std::fs::create_dir(&path).unwrap();
        let store = StreamStore::open(&path).await.unwrap();

        let report = check_stream_store(&store).await;
        assert_eq!(report.status, HealthStatus::Unhealthy);
    }

    #[test]
    fn serializes_status_in_lowercase() {
        let json = serde_json::to_string(&HealthReport::degraded("slow")).unwrap();
        assert_eq!(json, r#"{"status":"degraded","description":"slow"}"#);
    }
}
