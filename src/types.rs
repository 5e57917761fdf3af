use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Playback source the device reports in the `mode` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PlayerMode {
    Idle,
    AirPlay,
    Dlna,
    NetworkStream,
    UsbDisk,
    HttpApi,
    SpotifyConnect,
    LineIn,
    Bluetooth,
    Optical,
    LineIn2,
    UsbDac,
    MultiroomGuest,
    Unknown,
}

/// Repeat/shuffle setting the device reports in the `loop` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoopMode {
    RepeatAll,
    RepeatOne,
    ShuffleRepeat,
    Shuffle,
    NoRepeat,
    ShuffleRepeatOne,
    Unknown,
}

/// Firmware mode codes. New firmware variants only need a row here.
const MODE_CODES: &[(&str, PlayerMode, &str)] = &[
    ("0", PlayerMode::Idle, "Idle"),
    ("1", PlayerMode::AirPlay, "AirPlay"),
    ("2", PlayerMode::Dlna, "DLNA"),
    ("10", PlayerMode::NetworkStream, "Network Stream"),
    ("11", PlayerMode::UsbDisk, "USB Disk"),
    ("20", PlayerMode::HttpApi, "HTTP API"),
    ("31", PlayerMode::SpotifyConnect, "Spotify Connect"),
    ("40", PlayerMode::LineIn, "Line-In"),
    ("41", PlayerMode::Bluetooth, "Bluetooth"),
    ("43", PlayerMode::Optical, "Optical"),
    ("47", PlayerMode::LineIn2, "Line-In 2"),
    ("51", PlayerMode::UsbDac, "USB DAC"),
    ("99", PlayerMode::MultiroomGuest, "Multiroom Guest"),
];

const LOOP_CODES: &[(&str, LoopMode, &str)] = &[
    ("0", LoopMode::RepeatAll, "Repeat All"),
    ("1", LoopMode::RepeatOne, "Repeat One"),
    ("2", LoopMode::ShuffleRepeat, "Shuffle+Repeat"),
    ("3", LoopMode::Shuffle, "Shuffle"),
    ("4", LoopMode::NoRepeat, "No Repeat"),
    ("5", LoopMode::ShuffleRepeatOne, "Shuffle+Repeat One"),
];

const DEVICE_TYPE_LABELS: &[(&str, &str)] = &[("0", "Standalone"), ("1", "Multiroom Guest")];

const CHANNEL_LABELS: &[(&str, &str)] = &[("0", "Stereo"), ("1", "Left"), ("2", "Right")];

/// Input source keys accepted by `switchmode`, mapped to the mode code they select
const SOURCE_KEYS: &[(&str, &str)] = &[
    ("wifi", "10"),
    ("line-in", "40"),
    ("bluetooth", "41"),
    ("optical", "43"),
    ("co-axial", "47"),
    ("coaxial", "47"),
    ("line-in2", "47"),
    ("udisk", "11"),
    ("pcusb", "51"),
    ("pc-usb", "51"),
];

/// Resolve a code against a label table.
///
/// Empty codes are "Unknown"; codes missing from the table become "{category} {code}".
fn label_for<'a>(
    table: impl IntoIterator<Item = (&'a str, &'static str)>,
    category: &str,
    code: &str,
) -> String {
    let code = code.trim();
    if code.is_empty() {
        return "Unknown".to_string();
    }
    table
        .into_iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("{category} {code}"))
}

impl PlayerMode {
    /// Map a raw `mode` code to its variant, `Unknown` if the code is not in the table
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        MODE_CODES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, mode, _)| *mode)
            .unwrap_or(PlayerMode::Unknown)
    }

    /// The wire code for this mode
    pub fn code(&self) -> Option<&'static str> {
        MODE_CODES
            .iter()
            .find(|(_, mode, _)| mode == self)
            .map(|(code, _, _)| *code)
    }

    pub fn label(&self) -> &'static str {
        MODE_CODES
            .iter()
            .find(|(_, mode, _)| mode == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for PlayerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl LoopMode {
    /// Map a raw `loop` code to its variant, `Unknown` if the code is not in the table
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        LOOP_CODES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, mode, _)| *mode)
            .unwrap_or(LoopMode::Unknown)
    }

    /// The numeric code sent with `loopmode:<code>`
    pub fn code(&self) -> Option<u8> {
        LOOP_CODES
            .iter()
            .find(|(_, mode, _)| mode == self)
            .and_then(|(code, _, _)| code.parse().ok())
    }

    pub fn label(&self) -> &'static str {
        LOOP_CODES
            .iter()
            .find(|(_, mode, _)| mode == self)
            .map(|(_, _, label)| *label)
            .unwrap_or("Unknown")
    }
}

impl fmt::Display for LoopMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Human label for a raw `mode` code ("Mode {code}" when unrecognized)
pub fn mode_label(code: &str) -> String {
    label_for(MODE_CODES.iter().map(|(c, _, l)| (*c, *l)), "Mode", code)
}

/// Human label for a raw `loop` code ("Loop {code}" when unrecognized)
pub fn loop_label(code: &str) -> String {
    label_for(LOOP_CODES.iter().map(|(c, _, l)| (*c, *l)), "Loop", code)
}

/// Human label for a raw `type` code ("Device {code}" when unrecognized)
pub fn device_type_label(code: &str) -> String {
    label_for(DEVICE_TYPE_LABELS.iter().copied(), "Device", code)
}

/// Human label for a raw `ch` code ("Channel {code}" when unrecognized)
pub fn channel_label(code: &str) -> String {
    label_for(CHANNEL_LABELS.iter().copied(), "Channel", code)
}

/// Mode code selected by an input source key such as `"bluetooth"` or `"line-in"`
///
/// Lookup is case-insensitive and ignores surrounding whitespace. Blank or
/// unknown keys yield `None`.
pub fn source_mode_code(key: &str) -> Option<&'static str> {
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    SOURCE_KEYS
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, code)| *code)
}

/// Transport actions accepted by `setPlayerCmd:<action>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlAction {
    Pause,
    Resume,
    /// Toggle between play and pause
    OnePause,
    Stop,
    Prev,
    Next,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::OnePause => "onepause",
            ControlAction::Stop => "stop",
            ControlAction::Prev => "prev",
            ControlAction::Next => "next",
        }
    }
}

impl FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "pause" => Ok(ControlAction::Pause),
            "resume" => Ok(ControlAction::Resume),
            "onepause" => Ok(ControlAction::OnePause),
            "stop" => Ok(ControlAction::Stop),
            "prev" => Ok(ControlAction::Prev),
            "next" => Ok(ControlAction::Next),
            other => Err(format!("unsupported control action: {other}")),
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
