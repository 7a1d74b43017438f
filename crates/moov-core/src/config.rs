//! Configuration model.
//!
//! Every field has a default so a partial (or missing) `config.toml` still
//! yields a usable configuration.

use crate::player::Rgb;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MoovConfig {
    /// Name shown for the local user in overlays and the terminal host
    pub nick: String,
    /// Where the session list is kept; the platform data dir when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_path: Option<PathBuf>,
    pub player: PlayerConfig,
    pub resolver: ResolverConfig,
    pub sync: SyncConfig,
    pub overlay: OverlayConfig,
}

impl Default for MoovConfig {
    fn default() -> Self {
        Self {
            nick: "me".to_string(),
            store_path: None,
            player: PlayerConfig::default(),
            resolver: ResolverConfig::default(),
            sync: SyncConfig::default(),
            overlay: OverlayConfig::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub binary: String,
    pub args: Vec<String>,
    /// How long to wait for an IPC reply
    pub ipc_timeout_ms: u64,
    /// Property changes this soon after our own command are attributed to it
    pub echo_window_ms: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            binary: "mpv".to_string(),
            args: vec!["--force-window=yes".to_string()],
            ipc_timeout_ms: 2000,
            echo_window_ms: 750,
        }
    }
}

impl PlayerConfig {
    pub fn ipc_timeout(&self) -> Duration {
        Duration::from_millis(self.ipc_timeout_ms)
    }

    pub fn echo_window(&self) -> Duration {
        Duration::from_millis(self.echo_window_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ResolverConfig {
    /// `youtube-dl` compatible binary (`yt-dlp` works too)
    pub binary: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary: "youtube-dl".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    pub poll_interval_ms: u64,
    pub persist_interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            persist_interval_secs: 5,
        }
    }
}

impl SyncConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn persist_interval(&self) -> Duration {
        Duration::from_secs(self.persist_interval_secs)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    pub own_color: Rgb,
    pub peer_color: Rgb,
    pub background: Rgb,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            own_color: Rgb::WHITE,
            peer_color: Rgb::YELLOW,
            background: Rgb::BLACK,
        }
    }
}
