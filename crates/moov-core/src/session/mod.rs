//! Session domain module.
//!
//! - `model`: `VideoInfo` and `Session`
//! - `repository`: persistence backend trait (+ an in-memory backend)
//! - `store`: the recency-ordered `SessionStore`

mod model;
mod repository;
mod store;

pub use model::{Session, VideoInfo};
pub use repository::{MemorySessionRepository, SessionRepository};
pub use store::{AddOutcome, SessionStore};
