//! Infrastructure layer for Moov.
//!
//! Concrete implementations of the collaborator traits defined in
//! `moov-core`: file storage, configuration, metadata resolution and the
//! mpv player.

pub mod config_service;
pub mod json_session_repository;
#[cfg(unix)]
pub mod mpv;
pub mod paths;
pub mod storage;
pub mod youtube_dl_resolver;

pub use config_service::ConfigService;
pub use json_session_repository::JsonSessionRepository;
#[cfg(unix)]
pub use mpv::MpvLauncher;
pub use paths::MoovPaths;
pub use youtube_dl_resolver::YoutubeDlResolver;
