//! Chat text produced by the protocol.
//!
//! Replies and reflections are plain strings in the same grammar people
//! type, plus an HTML rendering for hosts that show rich text.

use super::model::Keyword;
use crate::conversation::OutgoingMessage;
use crate::player::{CanonicalState, PlayState, PlaybackStatus};
use crate::session::Session;
use crate::time::format_time;

pub const NOTHING_PLAYING: &str = "nothing playing";
pub const NO_SESSIONS: &str = "no sessions";
pub const INVALID_ARGS: &str = "error: invalid args";
pub const RESOLUTION_FAILED: &str = "error: could not get video information";
pub const NO_SUCH_SESSION: &str = "error: no such session";
pub const PLAYER_START_FAILED: &str = "error: could not start player";

/// `"<pos>/<count> <paused|playing> <time>"` with a 1-based position.
pub fn status_line(status: &PlaybackStatus) -> String {
    format!(
        "{}/{} {} {}",
        status.playlist_position + 1,
        status.playlist_count,
        PlayState::from_paused(status.paused),
        format_time(status.time)
    )
}

/// The `.set` command that reproduces `state` on the peer.
pub fn set_command(state: &CanonicalState) -> String {
    format!(
        "{} {} {} {}",
        Keyword::Set,
        state.position + 1,
        PlayState::from_paused(state.paused),
        format_time(state.time)
    )
}

/// The `.o` command that opens `url` at `time` on the peer.
pub fn open_command(url: &str, time: f64) -> String {
    format!("{} {} {}", Keyword::Open, url, format_time(time))
}

/// `"[<i>] <uploader>: <title> <time>"`
pub fn session_line(index: usize, session: &Session) -> String {
    let info = &session.video_info;
    format!(
        "[{index}] {}: {} {}",
        info.uploader,
        info.title,
        format_time(session.time)
    )
}

/// HTML form of [`session_line`] with uploader and title linked.
pub fn session_line_html(index: usize, session: &Session) -> String {
    let info = &session.video_info;
    let uploader = match &info.uploader_url {
        Some(url) => link(url, &info.uploader),
        None => html_escape(&info.uploader),
    };
    format!(
        "{} {}: {} {}",
        html_escape(&format!("[{index}]")),
        uploader,
        link(&info.url, &info.title),
        html_escape(&format_time(session.time))
    )
}

/// All sessions as one message, or [`NO_SESSIONS`] when there are none.
pub fn session_list(sessions: &[Session]) -> OutgoingMessage {
    if sessions.is_empty() {
        return OutgoingMessage::plain(NO_SESSIONS);
    }
    let text: Vec<String> = sessions
        .iter()
        .enumerate()
        .map(|(i, s)| session_line(i, s))
        .collect();
    let html: Vec<String> = sessions
        .iter()
        .enumerate()
        .map(|(i, s)| session_line_html(i, s))
        .collect();
    OutgoingMessage::rich(text.join(" "), html.join(" "))
}

/// `prefix` followed by the session line, in both renderings.
pub fn session_reply(prefix: &str, index: usize, session: &Session) -> OutgoingMessage {
    OutgoingMessage::rich(
        format!("{prefix}{}", session_line(index, session)),
        format!("{}{}", html_escape(prefix), session_line_html(index, session)),
    )
}

fn link(url: &str, text: &str) -> String {
    format!("<a href=\"{}\">{}</a>", html_escape(url), html_escape(text))
}

/// Minimal HTML escaping for text content and attribute values.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
