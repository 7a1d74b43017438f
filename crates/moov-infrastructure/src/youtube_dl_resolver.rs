//! MetadataResolver backed by a `youtube-dl` compatible binary.

use async_trait::async_trait;
use moov_core::resolver::MetadataResolver;
use moov_core::session::VideoInfo;
use moov_core::{MoovError, Result};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

/// The subset of `-j` output we keep.
#[derive(Debug, Deserialize)]
struct InfoJson {
    title: String,
    #[serde(default)]
    uploader: Option<String>,
    #[serde(default)]
    uploader_url: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

/// Runs `<binary> -j <url>` and reads the first JSON document it prints.
pub struct YoutubeDlResolver {
    binary: String,
}

impl YoutubeDlResolver {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for YoutubeDlResolver {
    fn default() -> Self {
        Self::new("youtube-dl")
    }
}

/// Builds a VideoInfo for `url` from `-j` stdout.
///
/// Playlists print one document per line; only the first counts.
pub fn parse_info(url: &str, stdout: &[u8]) -> Result<VideoInfo> {
    let text = String::from_utf8_lossy(stdout);
    let first = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| MoovError::resolution(url, "no output"))?;
    let info: InfoJson =
        serde_json::from_str(first).map_err(|e| MoovError::resolution(url, e.to_string()))?;

    let mut video = VideoInfo::new(url, info.title);
    if let Some(uploader) = info.uploader {
        video = video.with_uploader(uploader);
    }
    if let Some(uploader_url) = info.uploader_url {
        video = video.with_uploader_url(uploader_url);
    }
    if let Some(duration) = info.duration {
        video = video.with_duration(duration);
    }
    Ok(video)
}

#[async_trait]
impl MetadataResolver for YoutubeDlResolver {
    async fn resolve(&self, url: &str) -> Result<VideoInfo> {
        tracing::debug!(url, binary = %self.binary, "Resolving video information");
        let output = Command::new(&self.binary)
            .arg("-j")
            .arg(url)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MoovError::resolution(url, format!("failed to run {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MoovError::resolution(
                url,
                format!("{} exited with {}: {}", self.binary, output.status, stderr.trim()),
            ));
        }
        parse_info(url, &output.stdout)
    }
}
