use crate::types::{self, LoopMode, PlayerMode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Placeholder used for blank track metadata
pub const NO_METADATA: &str = "(none)";

/// Placeholder used for display strings with nothing to show
pub const NOT_AVAILABLE: &str = "N/A";

/// Decoded inputs for a [`PlayerStatus`]
///
/// Every field is optional; [`PlayerStatus::new`] fills in safe defaults.
#[derive(Debug, Clone, Default)]
pub struct StatusFields {
    pub device_type: Option<String>,
    pub channel: Option<String>,
    pub mode: Option<String>,
    pub loop_code: Option<String>,
    pub equalizer: Option<i32>,
    pub status: Option<String>,
    pub position: Option<Duration>,
    pub playlist_offset: Option<Duration>,
    pub total_length: Option<Duration>,
    pub playlist_count: Option<i32>,
    pub playlist_index: Option<i32>,
    pub volume: Option<i32>,
    pub muted: Option<bool>,
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

/// Immutable snapshot of the speaker's player state
///
/// Construction never fails: missing or malformed upstream values degrade to
/// defaults, and the display strings are computed once here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    device_type_code: String,
    channel_code: String,
    mode_code: String,
    loop_code: String,
    mode: PlayerMode,
    loop_mode: LoopMode,
    equalizer: Option<i32>,
    raw_status: String,
    position: Option<Duration>,
    playlist_offset: Option<Duration>,
    total_length: Option<Duration>,
    playlist_count: Option<i32>,
    playlist_index: Option<i32>,
    volume: i32,
    muted: bool,
    title: String,
    artist: String,
    album: String,

    status_label: String,
    position_display: String,
    playlist_display: String,
}

impl PlayerStatus {
    pub fn new(fields: StatusFields) -> Self {
        let device_type_code = fields.device_type.unwrap_or_default();
        let channel_code = fields.channel.unwrap_or_default();
        let mode_code = fields.mode.unwrap_or_default();
        let loop_code = fields.loop_code.unwrap_or_default();
        let raw_status = fields.status.unwrap_or_default();

        let status_label = title_case(&raw_status);
        let position_display = position_display(fields.position, fields.total_length);
        let playlist_display = playlist_display(fields.playlist_count, fields.playlist_index);

        Self {
            mode: PlayerMode::from_code(&mode_code),
            loop_mode: LoopMode::from_code(&loop_code),
            device_type_code,
            channel_code,
            mode_code,
            loop_code,
            equalizer: fields.equalizer,
            raw_status,
            position: fields.position,
            playlist_offset: fields.playlist_offset,
            total_length: fields.total_length,
            playlist_count: fields.playlist_count,
            playlist_index: fields.playlist_index,
            volume: fields.volume.unwrap_or(0),
            muted: fields.muted.unwrap_or(false),
            title: metadata_or_placeholder(fields.title),
            artist: metadata_or_placeholder(fields.artist),
            album: metadata_or_placeholder(fields.album),
            status_label,
            position_display,
            playlist_display,
        }
    }

    pub fn device_type_code(&self) -> &str {
        &self.device_type_code
    }

    /// "Standalone", "Multiroom Guest", or a fallback label
    pub fn device_type(&self) -> String {
        types::device_type_label(&self.device_type_code)
    }

    pub fn channel_code(&self) -> &str {
        &self.channel_code
    }

    /// "Stereo", "Left", "Right", or a fallback label
    pub fn channel(&self) -> String {
        types::channel_label(&self.channel_code)
    }

    pub fn mode_code(&self) -> &str {
        &self.mode_code
    }

    pub fn mode(&self) -> PlayerMode {
        self.mode
    }

    pub fn mode_label(&self) -> String {
        types::mode_label(&self.mode_code)
    }

    pub fn loop_code(&self) -> &str {
        &self.loop_code
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn loop_label(&self) -> String {
        types::loop_label(&self.loop_code)
    }

    pub fn equalizer(&self) -> Option<i32> {
        self.equalizer
    }

    /// Playback keyword as reported by the device ("play", "pause", "stop", ...)
    pub fn raw_status(&self) -> &str {
        &self.raw_status
    }

    pub fn is_playing(&self) -> bool {
        self.raw_status.eq_ignore_ascii_case("play")
    }

    pub fn position(&self) -> Option<Duration> {
        self.position
    }

    pub fn playlist_offset(&self) -> Option<Duration> {
        self.playlist_offset
    }

    pub fn total_length(&self) -> Option<Duration> {
        self.total_length
    }

    pub fn playlist_count(&self) -> Option<i32> {
        self.playlist_count
    }

    /// Zero-based index into the current playlist
    pub fn playlist_index(&self) -> Option<i32> {
        self.playlist_index
    }

    pub fn volume(&self) -> i32 {
        self.volume
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artist(&self) -> &str {
        &self.artist
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    /// Capitalized playback state, "Unknown" when the device sent none
    pub fn status_label(&self) -> &str {
        &self.status_label
    }

    /// "mm:ss", "mm:ss / mm:ss" or "N/A"
    pub fn position_display(&self) -> &str {
        &self.position_display
    }

    /// "Track {n} of {count}" or "N/A"
    pub fn playlist_display(&self) -> &str {
        &self.playlist_display
    }
}

/// `getPlayerStatus` response body
///
/// The firmware sends every field as a string, but some variants emit bare
/// numbers, so each field is read leniently.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusPayload {
    #[serde(default, deserialize_with = "lenient_string", rename = "type")]
    pub device_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub ch: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mode: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "loop")]
    pub loop_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub eq: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub curpos: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub offset_pts: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub totlen: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "Title")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "Artist")]
    pub artist: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", rename = "Album")]
    pub album: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub alarmflag: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plicount: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub plicurr: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub vol: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mute: Option<String>,
}

impl StatusPayload {
    /// Parse a raw response body, tolerating lower-case metadata keys
    pub fn from_json(body: &str) -> crate::error::Result<Self> {
        let mut value: Value = serde_json::from_str(body)?;
        if let Some(obj) = value.as_object_mut() {
            // Older firmware uses lower-case keys for the hex metadata.
            for (lower, upper) in [("title", "Title"), ("artist", "Artist"), ("album", "Album")] {
                if !obj.contains_key(upper) {
                    if let Some(v) = obj.remove(lower) {
                        obj.insert(upper.to_string(), v);
                    }
                }
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn into_status(self) -> PlayerStatus {
        PlayerStatus::new(StatusFields {
            device_type: self.device_type,
            channel: self.ch,
            mode: self.mode,
            loop_code: self.loop_code,
            equalizer: parse_int(self.eq.as_deref()),
            status: self.status,
            position: parse_millis(self.curpos.as_deref()),
            playlist_offset: parse_millis(self.offset_pts.as_deref()),
            total_length: parse_millis(self.totlen.as_deref()),
            playlist_count: parse_int(self.plicount.as_deref()),
            playlist_index: parse_int(self.plicurr.as_deref()),
            volume: parse_int(self.vol.as_deref()),
            muted: parse_flag(self.mute.as_deref()),
            title: decode_hex_text(self.title.as_deref()),
            artist: decode_hex_text(self.artist.as_deref()),
            album: decode_hex_text(self.album.as_deref()),
        })
    }
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(if b { "1" } else { "0" }.to_string()),
        _ => None,
    })
}

/// Lenient integer parse; anything unparsable is `None`
pub fn parse_int(value: Option<&str>) -> Option<i32> {
    value.and_then(|v| v.trim().parse().ok())
}

/// Millisecond count to a duration, negatives clamp to zero
pub fn parse_millis(value: Option<&str>) -> Option<Duration> {
    let millis: i64 = value.and_then(|v| v.trim().parse().ok())?;
    Some(Duration::from_millis(millis.max(0) as u64))
}

/// `"1"` is true, any other non-blank value false, blank is `None`
pub fn parse_flag(value: Option<&str>) -> Option<bool> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    Some(value == "1")
}

/// Decode hex-encoded UTF-8 text, passing the raw value through if it is not hex
pub fn decode_hex_text(value: Option<&str>) -> Option<String> {
    let value = value?;
    if value.trim().is_empty() {
        return None;
    }
    match hex::decode(value.trim()) {
        Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
        Err(_) => Some(value.to_string()),
    }
}

fn metadata_or_placeholder(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NO_METADATA.to_string(),
    }
}

fn title_case(raw: &str) -> String {
    if raw.trim().is_empty() {
        return "Unknown".to_string();
    }
    raw.split(' ')
        .map(|word| {
            // All-caps words are kept as acronyms
            if !word.chars().any(char::is_lowercase) {
                return word.to_string();
            }
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format as minutes and seconds; minutes are not wrapped at the hour
pub fn format_mmss(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn position_display(position: Option<Duration>, length: Option<Duration>) -> String {
    match (position, length) {
        (None, None) => NOT_AVAILABLE.to_string(),
        (pos, Some(len)) => format!(
            "{} / {}",
            format_mmss(pos.unwrap_or_default()),
            format_mmss(len)
        ),
        (Some(pos), None) => format_mmss(pos),
    }
}

fn playlist_display(count: Option<i32>, index: Option<i32>) -> String {
    match (count, index) {
        (Some(count), Some(index)) if count > 0 => {
            let current = index.saturating_add(1).clamp(1, count);
            format!("Track {current} of {count}")
        }
        _ => NOT_AVAILABLE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_with(f: impl FnOnce(&mut StatusFields)) -> PlayerStatus {
        let mut fields = StatusFields::default();
        f(&mut fields);
        PlayerStatus::new(fields)
    }

    #[test]
    fn empty_fields_yield_a_complete_snapshot() {
        let status = PlayerStatus::new(StatusFields::default());
        assert_eq!(status.volume(), 0);
        assert!(!status.is_muted());
        assert_eq!(status.title(), NO_METADATA);
        assert_eq!(status.artist(), NO_METADATA);
        assert_eq!(status.album(), NO_METADATA);
        assert_eq!(status.status_label(), "Unknown");
        assert_eq!(status.position_display(), "N/A");
        assert_eq!(status.playlist_display(), "N/A");
        assert_eq!(status.mode(), PlayerMode::Unknown);
        assert_eq!(status.mode_label(), "Unknown");
        assert_eq!(status.device_type(), "Unknown");
    }

    #[test]
    fn whitespace_metadata_becomes_placeholder() {
        let status = status_with(|f| {
            f.title = Some("   ".into());
            f.artist = Some(String::new());
            f.album = Some("Kind of Blue".into());
        });
        assert_eq!(status.title(), "(none)");
        assert_eq!(status.artist(), "(none)");
        assert_eq!(status.album(), "Kind of Blue");
    }

    #[test]
    fn position_display_variants() {
        let only_pos = status_with(|f| f.position = Some(Duration::from_secs(125)));
        assert_eq!(only_pos.position_display(), "02:05");

        let both = status_with(|f| {
            f.position = Some(Duration::from_secs(125));
            f.total_length = Some(Duration::from_secs(300));
        });
        assert_eq!(both.position_display(), "02:05 / 05:00");

        let only_len = status_with(|f| f.total_length = Some(Duration::from_secs(300)));
        assert_eq!(only_len.position_display(), "00:00 / 05:00");
    }

    #[test]
    fn playlist_display_clamps_index() {
        let first = status_with(|f| {
            f.playlist_count = Some(5);
            f.playlist_index = Some(0);
        });
        assert_eq!(first.playlist_display(), "Track 1 of 5");

        let past_end = status_with(|f| {
            f.playlist_count = Some(5);
            f.playlist_index = Some(9);
        });
        assert_eq!(past_end.playlist_display(), "Track 5 of 5");

        let negative = status_with(|f| {
            f.playlist_count = Some(3);
            f.playlist_index = Some(-4);
        });
        assert_eq!(negative.playlist_display(), "Track 1 of 3");

        let empty = status_with(|f| {
            f.playlist_count = Some(0);
            f.playlist_index = Some(0);
        });
        assert_eq!(empty.playlist_display(), "N/A");

        let no_index = status_with(|f| f.playlist_count = Some(4));
        assert_eq!(no_index.playlist_display(), "N/A");
    }

    #[test]
    fn status_label_is_capitalized() {
        assert_eq!(status_with(|f| f.status = Some("play".into())).status_label(), "Play");
        assert_eq!(status_with(|f| f.status = Some("load".into())).status_label(), "Load");
        assert_eq!(status_with(|f| f.status = Some(" ".into())).status_label(), "Unknown");
        assert_eq!(status_with(|f| f.status = Some("pLAY".into())).status_label(), "Play");
        assert_eq!(status_with(|f| f.status = Some("STOP".into())).status_label(), "STOP");
        assert_eq!(
            status_with(|f| f.status = Some("buffering NOW".into())).status_label(),
            "Buffering NOW"
        );
    }

    #[test]
    fn hex_metadata_round_trips() {
        for text in ["Hello", "Café del Mar", "東京", "Motörhead ♫"] {
            let encoded = hex::encode(text.as_bytes());
            assert_eq!(decode_hex_text(Some(&encoded)).as_deref(), Some(text));
            assert_eq!(decode_hex_text(Some(&encoded.to_uppercase())).as_deref(), Some(text));
        }
    }

    #[test]
    fn invalid_hex_passes_through() {
        assert_eq!(decode_hex_text(Some("Not hex")).as_deref(), Some("Not hex"));
        assert_eq!(decode_hex_text(Some("abc")).as_deref(), Some("abc"));
        assert_eq!(decode_hex_text(Some("zz11")).as_deref(), Some("zz11"));
        assert_eq!(decode_hex_text(Some("  ")), None);
        assert_eq!(decode_hex_text(None), None);
    }

    #[test]
    fn numeric_parsers_are_lenient() {
        assert_eq!(parse_int(Some("42")), Some(42));
        assert_eq!(parse_int(Some(" 7 ")), Some(7));
        assert_eq!(parse_int(Some("x")), None);
        assert_eq!(parse_int(None), None);
        assert_eq!(parse_millis(Some("125000")), Some(Duration::from_secs(125)));
        assert_eq!(parse_millis(Some("-5")), Some(Duration::ZERO));
        assert_eq!(parse_millis(Some("soon")), None);
        assert_eq!(parse_flag(Some("1")), Some(true));
        assert_eq!(parse_flag(Some("0")), Some(false));
        assert_eq!(parse_flag(Some("")), None);
    }

    #[test]
    fn payload_decodes_device_response() {
        let body = r#"{
            "type": "0", "ch": "0", "mode": "10", "loop": "3", "eq": "0",
            "status": "play", "curpos": "125000", "offset_pts": "125000",
            "totlen": "300000", "Title": "536f2057686174", "Artist": "4d696c6573204461766973",
            "Album": "", "alarmflag": "0", "plicount": "5", "plicurr": "2",
            "vol": "37", "mute": "0"
        }"#;
        let status = StatusPayload::from_json(body).unwrap().into_status();
        assert_eq!(status.mode(), PlayerMode::NetworkStream);
        assert_eq!(status.loop_mode(), LoopMode::Shuffle);
        assert_eq!(status.title(), "So What");
        assert_eq!(status.artist(), "Miles Davis");
        assert_eq!(status.album(), "(none)");
        assert_eq!(status.volume(), 37);
        assert!(!status.is_muted());
        assert!(status.is_playing());
        assert_eq!(status.position_display(), "02:05 / 05:00");
        assert_eq!(status.playlist_display(), "Track 3 of 5");
        assert_eq!(status.equalizer(), Some(0));
    }

    #[test]
    fn payload_tolerates_numbers_and_missing_fields() {
        let body = r#"{"mode": 31, "vol": 12, "mute": "1", "title": "4142"}"#;
        let status = StatusPayload::from_json(body).unwrap().into_status();
        assert_eq!(status.mode_code(), "31");
        assert_eq!(status.mode(), PlayerMode::SpotifyConnect);
        assert_eq!(status.volume(), 12);
        assert!(status.is_muted());
        assert_eq!(status.title(), "AB");
        assert_eq!(status.position_display(), "N/A");
    }

    #[test]
    fn malformed_payload_is_an_error() {
        assert!(StatusPayload::from_json("OK").is_err());
        assert!(StatusPayload::from_json("42").is_err());
    }
}
