//! mpv player adapter (Unix sockets only).
//!
//! Lines typed at the player reach the chat through a script message, e.g.
//! in `input.conf`:
//!
//! ```text
//! F1 script-message moov-input .status
//! ```

pub mod ipc;
mod launcher;
mod player;

pub use launcher::MpvLauncher;
pub use player::{INPUT_MESSAGE, MpvPlayer};
