//! Session repository trait.
//!
//! Defines the persistence backend the session store writes through.

use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// An abstract backend for persisting the ordered session list.
///
/// The store always hands over the complete list; implementations rewrite
/// their representation in full rather than appending.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Loads the persisted list in recency order (oldest first).
    ///
    /// # Returns
    ///
    /// - `Ok(vec)`: stored sessions, empty when nothing was persisted yet
    /// - `Err(_)`: the backing storage exists but could not be read
    async fn load_all(&self) -> Result<Vec<Session>>;

    /// Replaces the persisted list with `sessions`.
    async fn save_all(&self, sessions: &[Session]) -> Result<()>;
}

/// Volatile repository that keeps the last saved list in memory.
///
/// Used by tests and by hosts that do not want sessions on disk.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    sessions: Mutex<Vec<Session>>,
    saves: Mutex<usize>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-seeded with `sessions`.
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
            saves: Mutex::new(0),
        }
    }

    /// Snapshot of what was last saved.
    pub fn snapshot(&self) -> Vec<Session> {
        self.sessions.lock().map(|s| s.clone()).unwrap_or_default()
    }

    /// Number of `save_all` calls so far.
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn load_all(&self) -> Result<Vec<Session>> {
        Ok(self.snapshot())
    }

    async fn save_all(&self, sessions: &[Session]) -> Result<()> {
        let mut stored = self
            .sessions
            .lock()
            .map_err(|e| crate::error::MoovError::internal(e.to_string()))?;
        *stored = sessions.to_vec();
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
