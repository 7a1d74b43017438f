//! Player controller interface.
//!
//! The protocol drives an external playback process through
//! [`PlayerController`]; a [`PlayerLauncher`] starts fresh instances so that
//! only one player is ever open at a time.

use crate::error::{MoovError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use strum::{Display, EnumString};

/// Paused flag as it is written in chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlayState {
    Paused,
    Playing,
}

impl PlayState {
    pub fn from_paused(paused: bool) -> Self {
        if paused { Self::Paused } else { Self::Playing }
    }

    pub fn is_paused(self) -> bool {
        self == Self::Paused
    }
}

/// Point-in-time report from the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackStatus {
    /// 0-based playlist entry
    pub playlist_position: usize,
    pub playlist_count: usize,
    pub paused: bool,
    /// Seconds into the current entry
    pub time: f64,
}

impl PlaybackStatus {
    pub fn canonical(&self) -> CanonicalState {
        CanonicalState {
            position: self.playlist_position,
            paused: self.paused,
            time: self.time,
        }
    }
}

/// The state both peers' players converge to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanonicalState {
    /// 0-based playlist entry
    pub position: usize,
    pub paused: bool,
    pub time: f64,
}

/// An RGB colour for overlay messages, written `#RRGGBB` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(0xff, 0xff, 0xff);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const YELLOW: Rgb = Rgb::new(0xff, 0xff, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = MoovError;

    fn from_str(s: &str) -> Result<Self> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(MoovError::config(format!("invalid colour '{s}'")));
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| MoovError::config(format!("invalid colour '{s}'")))
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl TryFrom<String> for Rgb {
    type Error = MoovError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}

/// Operations the protocol needs from a running playback process.
///
/// Every method may be called concurrently with the synchronization loop;
/// implementations must not block the caller beyond queuing a request and
/// awaiting its reply.
#[async_trait]
pub trait PlayerController: Send + Sync {
    /// Replaces the playlist with `url` and starts playing it.
    async fn open(&self, url: &str) -> Result<()>;

    /// Appends `url` to the playlist.
    async fn append(&self, url: &str) -> Result<()>;

    /// Seeks to an absolute position in seconds.
    async fn seek(&self, seconds: f64) -> Result<()>;

    /// Seeks by `delta` seconds (negative goes back).
    async fn relative_seek(&self, delta: f64) -> Result<()>;

    /// Applies playlist position, paused flag and time together.
    async fn set_canonical(&self, state: CanonicalState) -> Result<()>;

    async fn status(&self) -> Result<PlaybackStatus>;

    async fn toggle_paused(&self) -> Result<()>;

    /// Point-in-time liveness poll.
    async fn alive(&self) -> bool;

    /// Terminates the process. Calling it on a dead player is not an error.
    async fn close(&self) -> Result<()>;

    /// Shows `text` as an overlay line. Fire-and-forget.
    async fn put_message(&self, text: &str, foreground: Rgb, background: Rgb);

    /// Chat lines the user typed into the player since the last drain.
    async fn drain_user_inputs(&self) -> Vec<String>;

    /// Pause/seek/playlist changes the user made at the player since the last drain.
    async fn drain_user_control_changes(&self) -> Vec<CanonicalState>;
}

/// Starts new player instances.
#[async_trait]
pub trait PlayerLauncher: Send + Sync {
    async fn launch(&self) -> Result<Arc<dyn PlayerController>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_state_words() {
        assert_eq!("paused".parse::<PlayState>().unwrap(), PlayState::Paused);
        assert_eq!("playing".parse::<PlayState>().unwrap(), PlayState::Playing);
        assert!("bogus".parse::<PlayState>().is_err());
        assert_eq!(PlayState::from_paused(true).to_string(), "paused");
    }

    #[test]
    fn test_rgb_parse_and_display() {
        let c: Rgb = "#ff8000".parse().unwrap();
        assert_eq!(c, Rgb::new(0xff, 0x80, 0x00));
        assert_eq!(c.to_string(), "#FF8000");
        assert!("#12345".parse::<Rgb>().is_err());
        assert!("zzzzzz".parse::<Rgb>().is_err());
    }
}
