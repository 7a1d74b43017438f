//! Metadata resolver interface.

use crate::error::Result;
use crate::session::VideoInfo;
use async_trait::async_trait;

/// Looks up title/uploader/duration for a URL.
///
/// Failures are reported as [`MoovError::Resolution`](crate::MoovError::Resolution).
#[async_trait]
pub trait MetadataResolver: Send + Sync {
    async fn resolve(&self, url: &str) -> Result<VideoInfo>;
}
