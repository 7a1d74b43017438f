//! JSON file backed SessionRepository.
//!
//! The whole ordered list lives in one file:
//!
//! ```text
//! [
//!     {
//!         "video_info": {"url": ..., "title": ..., "uploader": ...,
//!                        "uploader_url": ..., "duration": ...},
//!         "time": 12.0
//!     }
//! ]
//! ```
//!
//! File I/O runs on the blocking pool so the engine's task never stalls.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use moov_core::session::{Session, SessionRepository};
use moov_core::{MoovError, Result};
use std::path::{Path, PathBuf};

pub struct JsonSessionRepository {
    file: AtomicJsonFile<Vec<Session>>,
}

impl JsonSessionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            file: AtomicJsonFile::new(path),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn load_all(&self) -> Result<Vec<Session>> {
        let file = self.file.clone();
        let loaded = tokio::task::spawn_blocking(move || file.load())
            .await
            .map_err(|e| MoovError::internal(format!("session load task failed: {e}")))??;
        Ok(loaded.unwrap_or_default())
    }

    async fn save_all(&self, sessions: &[Session]) -> Result<()> {
        let file = self.file.clone();
        let sessions = sessions.to_vec();
        tokio::task::spawn_blocking(move || file.save(&sessions))
            .await
            .map_err(|e| MoovError::internal(format!("session save task failed: {e}")))??;
        tracing::debug!(path = %self.path().display(), "Saved session store");
        Ok(())
    }
}
