use crate::error::Result;
use crate::types::ControlAction;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Path of the device command channel, relative to the base URL
pub const COMMAND_PATH: &str = "httpapi.asp";

/// Step applied by `vol++` / `vol--`
pub const VOLUME_STEP: i32 = 6;

pub const MIN_VOLUME: i32 = 0;
pub const MAX_VOLUME: i32 = 100;

/// A single request on the device command channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `getPlayerStatus`
    GetPlayerStatus,
    /// `setPlayerCmd:switchmode:<key>`
    SwitchMode(String),
    /// `setPlayerCmd:play:<url>`
    Play(String),
    /// `setPlayerCmd:m3u:play:<url>`
    PlayPlaylist(String),
    /// `setPlayerCmd:playindex:<n>`
    PlayIndex(i32),
    /// `setPlayerCmd:loopmode:<code>`
    LoopMode(u8),
    /// `setPlayerCmd:<action>`
    Control(ControlAction),
    /// `setPlayerCmd:seek:<seconds>`
    Seek(u64),
    /// `setPlayerCmd:vol:<0-100>`
    Volume(u8),
    /// `setPlayerCmd:vol++`
    VolumeUp,
    /// `setPlayerCmd:vol--`
    VolumeDown,
    /// `setPlayerCmd:mute:<0|1>`
    Mute(bool),
}

impl Command {
    /// Seek command, rounded to whole seconds
    pub fn seek(position: Duration) -> Self {
        Command::Seek(position.as_secs_f64().round() as u64)
    }

    /// Volume command with the level clamped into `[0, 100]`
    pub fn volume(level: i32) -> Self {
        Command::Volume(clamp_volume(level) as u8)
    }

    /// Render the value of the `command` query parameter
    ///
    /// URL arguments are percent-escaped so they survive as a single query value.
    pub fn as_query(&self) -> String {
        match self {
            Command::GetPlayerStatus => "getPlayerStatus".to_string(),
            Command::SwitchMode(key) => format!("setPlayerCmd:switchmode:{key}"),
            Command::Play(url) => format!("setPlayerCmd:play:{}", urlencoding::encode(url)),
            Command::PlayPlaylist(url) => {
                format!("setPlayerCmd:m3u:play:{}", urlencoding::encode(url))
            }
            Command::PlayIndex(index) => format!("setPlayerCmd:playindex:{index}"),
            Command::LoopMode(code) => format!("setPlayerCmd:loopmode:{code}"),
            Command::Control(action) => format!("setPlayerCmd:{}", action.as_str()),
            Command::Seek(seconds) => format!("setPlayerCmd:seek:{seconds}"),
            Command::Volume(level) => format!("setPlayerCmd:vol:{level}"),
            // '+' would read as a space on the device side
            Command::VolumeUp => "setPlayerCmd:vol%2b%2b".to_string(),
            Command::VolumeDown => "setPlayerCmd:vol--".to_string(),
            Command::Mute(mute) => format!("setPlayerCmd:mute:{}", u8::from(*mute)),
        }
    }

    /// Full request URL against the device base URL
    pub fn url(&self, base: &Url) -> Result<Url> {
        let mut url = base.join(COMMAND_PATH)?;
        url.set_query(Some(&format!("command={}", self.as_query())));
        Ok(url)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_query())
    }
}

/// Whether a command response body is the device's acknowledgment
pub fn is_acknowledged(body: &str) -> bool {
    body.trim().eq_ignore_ascii_case("OK")
}

pub fn clamp_volume(level: i32) -> i32 {
    level.clamp(MIN_VOLUME, MAX_VOLUME)
}

/// Ensure the base URL ends with a slash so `join` keeps its path
pub fn normalize_base_url(base: &str) -> Result<Url> {
    let trimmed = base.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    Ok(Url::parse(&with_slash)?)
}
