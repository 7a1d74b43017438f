//! Session domain model.

use serde::{Deserialize, Serialize};

fn default_uploader() -> String {
    "Unknown".to_string()
}

/// Metadata for one video, as returned by the metadata resolver.
///
/// Immutable once fetched; `url` is the identity used for deduplication in
/// the session store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    /// Source URL (unique key)
    pub url: String,
    /// Video title
    pub title: String,
    /// Uploader display name
    #[serde(default = "default_uploader")]
    pub uploader: String,
    /// Link to the uploader's page, if known
    #[serde(default)]
    pub uploader_url: Option<String>,
    /// Length in seconds, if known
    #[serde(default)]
    pub duration: Option<f64>,
}

impl VideoInfo {
    /// Creates a VideoInfo with only the required fields; the uploader is "Unknown".
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            uploader: default_uploader(),
            uploader_url: None,
            duration: None,
        }
    }

    pub fn with_uploader(mut self, uploader: impl Into<String>) -> Self {
        self.uploader = uploader.into();
        self
    }

    pub fn with_uploader_url(mut self, uploader_url: impl Into<String>) -> Self {
        self.uploader_url = Some(uploader_url.into());
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// A remembered video together with the last known playback position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub video_info: VideoInfo,
    /// Playback position in seconds
    pub time: f64,
}

impl Session {
    pub fn new(video_info: VideoInfo, time: f64) -> Self {
        Self { video_info, time }
    }

    pub fn url(&self) -> &str {
        &self.video_info.url
    }
}
