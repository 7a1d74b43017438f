pub mod command;
pub mod config;
pub mod conversation;
pub mod error;
pub mod player;
pub mod resolver;
pub mod session;
pub mod time;

// Re-export common error type
pub use error::{MoovError, Result};
