use crate::error::{Result, SpeakerError};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use url::Url;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 80;
pub const MAX_DESCRIPTION_LEN: usize = 240;

/// A saved, named streaming URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamInfo {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Uuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl StreamInfo {
    /// New record with a fresh id
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            url: url.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trim fields and check them, assigning an id if the record has none
    pub fn normalized(&self) -> Result<Self> {
        let name = self.name.trim();
        let url = self.url.trim();
        let description = self
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty());

        if name.is_empty() {
            return Err(SpeakerError::Validation("Stream name cannot be empty.".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(SpeakerError::Validation(format!(
                "Name is too long ({MAX_NAME_LEN} characters max)."
            )));
        }
        if Url::parse(url).is_err() {
            return Err(SpeakerError::Validation(
                "Stream URL must be an absolute URI.".to_string(),
            ));
        }
        if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
            return Err(SpeakerError::Validation(format!(
                "Description is too long ({MAX_DESCRIPTION_LEN} characters max)."
            )));
        }

        Ok(Self {
            id: if self.id.is_nil() { Uuid::new_v4() } else { self.id },
            name: name.to_string(),
            url: url.to_string(),
            description: description.map(str::to_string),
        })
    }
}

/// Missing, empty or malformed ids read as nil and are replaced on load
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Uuid, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .unwrap_or_else(Uuid::nil))
}

/// JSON-file store of saved streams
///
/// All reads and writes go through one async gate, so a request never sees a
/// half-written file. A missing file is created empty; a corrupt one is reset.
pub struct StreamStore {
    path: PathBuf,
    gate: Mutex<()>,
}

impl StreamStore {
    /// Open the store at `path`, creating parent directories as needed
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        Ok(Self {
            path,
            gate: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved streams, ordered by name (case-insensitive)
    pub async fn get_all(&self) -> Result<Vec<StreamInfo>> {
        let _guard = self.gate.lock().await;
        let items = self.read().await?;
        Ok(sorted(items))
    }

    /// Insert or replace a stream by id
    ///
    /// Fails with [`SpeakerError::Validation`] before touching the file if the
    /// record is invalid.
    pub async fn upsert(&self, stream: StreamInfo) -> Result<Vec<StreamInfo>> {
        let normalized = stream.normalized()?;

        let _guard = self.gate.lock().await;
        let mut items = self.read().await?;
        match items.iter_mut().find(|s| s.id == normalized.id) {
            Some(existing) => *existing = normalized,
            None => items.push(normalized),
        }
        self.write(&items).await?;
        Ok(sorted(items))
    }

    /// Remove a stream by id; unknown ids leave the file untouched
    pub async fn delete(&self, id: Uuid) -> Result<Vec<StreamInfo>> {
        let _guard = self.gate.lock().await;
        let mut items = self.read().await?;
        let before = items.len();
        items.retain(|s| s.id != id);
        if items.len() != before {
            self.write(&items).await?;
        }
        Ok(sorted(items))
    }

    /// Look up a stream by name, ignoring case and surrounding whitespace
    pub async fn find_by_name(&self, name: &str) -> Result<Option<StreamInfo>> {
        let name = name.trim().to_lowercase();
        let items = self.get_all().await?;
        Ok(items.into_iter().find(|s| s.name.trim().to_lowercase() == name))
    }

    async fn read(&self) -> Result<Vec<StreamInfo>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("Creating stream storage at {}", self.path.display());
                self.write(&[]).await?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        match serde_json::from_str::<Vec<StreamInfo>>(&contents) {
            Ok(mut items) => {
                let mut assigned = false;
                for item in items.iter_mut().filter(|s| s.id.is_nil()) {
                    item.id = Uuid::new_v4();
                    assigned = true;
                }
                if assigned {
                    self.write(&items).await?;
                }
                Ok(items)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to read stream storage at {}, resetting it: {}",
                    self.path.display(),
                    e
                );
                self.write(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn write(&self, items: &[StreamInfo]) -> Result<()> {
        let json = serde_json::to_string_pretty(items)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

/// Case-insensitive order comparing upper-cased names
fn sorted(mut items: Vec<StreamInfo>) -> Vec<StreamInfo> {
    items.sort_by_cached_key(|s| s.name.to_uppercase());
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_trims_and_assigns_id() {
        let stream = StreamInfo {
            id: Uuid::nil(),
            name: "  Radio One ".into(),
            url: " http://radio.example/one ".into(),
            description: Some("   ".into()),
        };
        let normalized = stream.normalized().unwrap();
        assert!(!normalized.id.is_nil());
        assert_eq!(normalized.name, "Radio One");
        assert_eq!(normalized.url, "http://radio.example/one");
        assert_eq!(normalized.description, None);
    }

    #[test]
    fn normalization_rejects_bad_records() {
        let cases = [
            StreamInfo::new("   ", "http://radio.example"),
            StreamInfo::new("Relative", "/streams/one"),
            StreamInfo::new("Garbage", "not a url"),
            StreamInfo::new("x".repeat(MAX_NAME_LEN + 1), "http://radio.example"),
            StreamInfo::new("Long", "http://radio.example").with_description("d".repeat(241)),
        ];
        for case in cases {
            assert!(
                matches!(case.normalized(), Err(SpeakerError::Validation(_))),
                "{case:?} should be rejected"
            );
        }
    }

    #[test]
    fn name_limit_counts_characters() {
        let name = "é".repeat(MAX_NAME_LEN);
        assert!(StreamInfo::new(name, "http://radio.example").normalized().is_ok());
    }

    #[test]
    fn deserializes_with_empty_id() {
        let items: Vec<StreamInfo> =
            serde_json::from_str(r#"[{"id": "", "name": "A", "url": "http://a"}]"#).unwrap();
        assert!(items[0].id.is_nil());
        assert_eq!(items[0].description, None);
    }

    #[test]
    fn sorts_case_insensitively() {
        let items = sorted(vec![
            StreamInfo::new("beta", "http://b"),
            StreamInfo::new("Alpha", "http://a"),
            StreamInfo::new("Gamma", "http://g"),
        ]);
        let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn punctuation_sorts_after_letters() {
        let items = sorted(vec![
            StreamInfo::new("_underscore", "http://u"),
            StreamInfo::new("[bracket]", "http://b"),
            StreamInfo::new("beta", "http://beta"),
            StreamInfo::new("Alpha", "http://a"),
        ]);
        let names: Vec<_> = items.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "beta", "[bracket]", "_underscore"]);
    }
}
