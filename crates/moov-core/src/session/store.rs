use super::model::{Session, VideoInfo};
use super::repository::SessionRepository;
use crate::error::{MoovError, Result};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Recency-ordered list of remembered videos.
///
/// The last element is the "top", the most recently active session. Each URL
/// appears at most once. Every mutating call writes the complete list
/// through the repository before the in-memory state changes, so a failed
/// write leaves the store exactly as it was.
pub struct SessionStore {
    sessions: Vec<Session>,
    repository: Arc<dyn SessionRepository>,
}

/// Outcome of [`SessionStore::add`].
#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub index: usize,
    pub session: Session,
    /// True when the URL was already stored; nothing was inserted.
    pub duplicate: bool,
}

impl SessionStore {
    /// Loads the store from `repository`.
    ///
    /// A repository with nothing persisted yields an empty store.
    pub async fn load(repository: Arc<dyn SessionRepository>) -> Result<Self> {
        let sessions = repository.load_all().await?;
        tracing::info!(count = sessions.len(), "Loaded session store");
        Ok(Self {
            sessions,
            repository,
        })
    }

    /// Sessions in recency order, oldest first.
    pub fn list(&self) -> &[Session] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Session> {
        self.sessions.get(index)
    }

    /// Index of the first session whose URL equals `url`.
    pub fn index_of(&self, url: &str) -> Option<usize> {
        self.sessions.iter().position(|s| s.url() == url)
    }

    /// The most recently active session.
    pub fn top(&self) -> Result<&Session> {
        self.sessions.last().ok_or(MoovError::EmptyStore)
    }

    /// Appends a new session, unless the URL is already stored.
    ///
    /// A duplicate URL returns the existing entry with `duplicate = true`
    /// and leaves the store (including its stored time) untouched.
    pub async fn add(&mut self, video_info: VideoInfo, time: f64) -> Result<AddOutcome> {
        if let Some(index) = self.index_of(&video_info.url) {
            return Ok(AddOutcome {
                index,
                session: self.sessions[index].clone(),
                duplicate: true,
            });
        }

        let session = Session::new(video_info, time);
        let mut next = self.sessions.clone();
        next.push(session.clone());
        self.commit(next).await?;

        Ok(AddOutcome {
            index: self.sessions.len() - 1,
            session,
            duplicate: false,
        })
    }

    /// Moves the session at `index` to the top and returns it.
    ///
    /// The relative order of all other sessions is preserved.
    pub async fn set_top(&mut self, index: usize) -> Result<Session> {
        if index >= self.sessions.len() {
            return Err(if self.sessions.is_empty() {
                MoovError::EmptyStore
            } else {
                MoovError::IndexOutOfRange {
                    index,
                    len: self.sessions.len(),
                }
            });
        }

        let mut next = self.sessions.clone();
        let session = next.remove(index);
        next.push(session.clone());
        self.commit(next).await?;
        Ok(session)
    }

    /// Overwrites the stored time for `url`. Unknown URLs are ignored.
    pub async fn update_time(&mut self, url: &str, time: f64) -> Result<()> {
        let Some(index) = self.index_of(url) else {
            return Ok(());
        };

        let mut next = self.sessions.clone();
        next[index].time = time;
        self.commit(next).await
    }

    /// Removes sessions by index.
    ///
    /// With no indices the top session is removed (if any). Otherwise every
    /// listed index inside `[0, len)` is removed; other indices are ignored.
    /// Indices are applied highest first so earlier removals do not shift
    /// later ones. The list is persisted even when nothing was removed.
    pub async fn pop(&mut self, indices: &[i64]) -> Result<()> {
        let mut next = self.sessions.clone();
        if indices.is_empty() {
            next.pop();
        } else {
            let unique: BTreeSet<i64> = indices.iter().copied().collect();
            for index in unique.into_iter().rev() {
                if let Ok(i) = usize::try_from(index) {
                    if i < next.len() {
                        next.remove(i);
                    }
                }
            }
        }
        self.commit(next).await
    }

    async fn commit(&mut self, next: Vec<Session>) -> Result<()> {
        if let Err(e) = self.repository.save_all(&next).await {
            tracing::error!(error = %e, "Failed to persist session store");
            return Err(e);
        }
        self.sessions = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::repository::MemorySessionRepository;

    fn info(url: &str) -> VideoInfo {
        VideoInfo::new(url, format!("title {url}"))
    }

    async fn store_with(urls: &[&str]) -> (SessionStore, Arc<MemorySessionRepository>) {
        let sessions = urls.iter().map(|u| Session::new(info(u), 0.0)).collect();
        let repo = Arc::new(MemorySessionRepository::with_sessions(sessions));
        let store = SessionStore::load(repo.clone()).await.unwrap();
        (store, repo)
    }

    fn urls(store: &SessionStore) -> Vec<&str> {
        store.list().iter().map(|s| s.url()).collect()
    }

    #[tokio::test]
    async fn test_add_appends_and_persists() {
        let (mut store, repo) = store_with(&[]).await;

        let outcome = store.add(info("a"), 3.0).await.unwrap();

        assert_eq!(outcome.index, 0);
        assert!(!outcome.duplicate);
        assert_eq!(store.top().unwrap().url(), "a");
        assert_eq!(repo.snapshot().len(), 1);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_add_duplicate_returns_existing_without_mutation() {
        let (mut store, repo) = store_with(&["a", "b"]).await;

        let outcome = store.add(info("a"), 99.0).await.unwrap();

        assert!(outcome.duplicate);
        assert_eq!(outcome.index, 0);
        assert_eq!(outcome.session.time, 0.0);
        assert_eq!(store.len(), 2);
        assert_eq!(repo.save_count(), 0);
    }

    #[tokio::test]
    async fn test_set_top_preserves_relative_order() {
        let (mut store, _) = store_with(&["a", "b", "c", "d"]).await;

        let moved = store.set_top(1).await.unwrap();

        assert_eq!(moved.url(), "b");
        assert_eq!(store.top().unwrap().url(), "b");
        assert_eq!(urls(&store), vec!["a", "c", "d", "b"]);
    }

    #[tokio::test]
    async fn test_set_top_out_of_range() {
        let (mut store, repo) = store_with(&["a"]).await;
        let err = store.set_top(4).await.unwrap_err();
        assert_eq!(err, MoovError::IndexOutOfRange { index: 4, len: 1 });
        assert_eq!(repo.save_count(), 0);

        let (mut empty, _) = store_with(&[]).await;
        assert_eq!(empty.set_top(0).await.unwrap_err(), MoovError::EmptyStore);
    }

    #[tokio::test]
    async fn test_top_on_empty_store() {
        let (store, _) = store_with(&[]).await;
        assert_eq!(store.top().unwrap_err(), MoovError::EmptyStore);
    }

    #[tokio::test]
    async fn test_update_time() {
        let (mut store, repo) = store_with(&["a", "b"]).await;

        store.update_time("b", 42.0).await.unwrap();
        store.update_time("missing", 7.0).await.unwrap();

        assert_eq!(store.get(1).unwrap().time, 42.0);
        assert_eq!(repo.snapshot()[1].time, 42.0);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_pop_empty_set_removes_top() {
        let (mut store, _) = store_with(&["a", "b", "c"]).await;
        store.pop(&[]).await.unwrap();
        assert_eq!(urls(&store), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_pop_indices_highest_first() {
        let (mut store, _) = store_with(&["a", "b", "c"]).await;
        store.pop(&[0, 2]).await.unwrap();
        assert_eq!(urls(&store), vec!["b"]);
    }

    #[tokio::test]
    async fn test_pop_out_of_range_still_persists() {
        let (mut store, repo) = store_with(&["a", "b"]).await;
        store.pop(&[5, -1]).await.unwrap();
        assert_eq!(urls(&store), vec!["a", "b"]);
        assert_eq!(repo.save_count(), 1);
    }

    #[tokio::test]
    async fn test_pop_on_empty_store_is_noop() {
        let (mut store, repo) = store_with(&[]).await;
        store.pop(&[]).await.unwrap();
        assert!(store.is_empty());
        assert_eq!(repo.save_count(), 1);
    }
}
