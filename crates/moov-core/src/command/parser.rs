//! Chat line classification.
//!
//! The first whitespace-delimited token selects the command. `.seek+` and
//! `.seek-` also accept their argument glued to the keyword (`.seek+30`).

use super::model::{Command, Keyword, ParsedLine, SeekKind};
use crate::player::{CanonicalState, PlayState};
use crate::time::{parse_time, parse_time_strict};
use std::str::FromStr;

/// Classifies one line of chat text.
///
/// # Examples
///
/// ```
/// use moov_core::command::{parse_line, Command, ParsedLine};
///
/// assert_eq!(parse_line(".list"), ParsedLine::Command(Command::List));
/// assert_eq!(parse_line("hello there"), ParsedLine::Chat);
/// ```
pub fn parse_line(line: &str) -> ParsedLine {
    let mut tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(&first) = tokens.first() else {
        return ParsedLine::Chat;
    };

    let keyword = match Keyword::from_str(first) {
        Ok(keyword) => keyword,
        Err(_) => match split_glued_seek(first) {
            Some((keyword, glued)) => {
                tokens[0] = glued;
                tokens.insert(0, keyword.as_str());
                keyword
            }
            None => return ParsedLine::Chat,
        },
    };

    let args = &tokens[1..];
    match parse_command(keyword, args) {
        Ok(command) => ParsedLine::Command(command),
        Err(reason) => {
            tracing::debug!(%keyword, %reason, "Malformed command arguments");
            ParsedLine::Invalid { keyword, reason }
        }
    }
}

fn split_glued_seek(token: &str) -> Option<(Keyword, &str)> {
    [Keyword::SeekForward, Keyword::SeekBackward]
        .into_iter()
        .find_map(|keyword| {
            token
                .strip_prefix(keyword.as_str())
                .filter(|rest| !rest.is_empty())
                .map(|rest| (keyword, rest))
        })
}

fn parse_command(keyword: Keyword, args: &[&str]) -> Result<Command, String> {
    let command = match keyword {
        Keyword::Status => Command::Status,
        Keyword::TogglePause => Command::TogglePause,
        Keyword::Seek => seek(SeekKind::Absolute, args),
        Keyword::SeekForward => seek(SeekKind::Forward, args),
        Keyword::SeekBackward => seek(SeekKind::Backward, args),
        Keyword::Set => Command::Set(canonical_state(args)?),
        Keyword::Close => Command::Close,
        Keyword::Add => {
            let (url, time) = url_and_time(args)?;
            Command::Add { url, time }
        }
        Keyword::Open => {
            let (url, time) = url_and_time(args)?;
            Command::Open { url, time }
        }
        Keyword::List => Command::List,
        Keyword::Pop => Command::Pop(
            args.iter()
                .map(|a| a.parse::<i64>().map_err(|_| format!("'{a}' is not an index")))
                .collect::<Result<_, _>>()?,
        ),
        Keyword::Resume => match args.first() {
            None => Command::Resume(None),
            Some(a) => Command::Resume(Some(
                a.parse::<usize>()
                    .map_err(|_| format!("'{a}' is not an index"))?,
            )),
        },
        Keyword::Reopen => Command::Reopen,
    };
    Ok(command)
}

fn seek(kind: SeekKind, args: &[&str]) -> Command {
    Command::Seek {
        kind,
        seconds: parse_time(&args.join(" ")),
    }
}

fn url_and_time(args: &[&str]) -> Result<(String, i64), String> {
    let (url, rest) = args.split_first().ok_or("missing url")?;
    let time = parse_time(&rest.join(" ")).max(0);
    Ok(((*url).to_string(), time))
}

/// `<pos> <paused|playing> <time>` with a 1-based position.
fn canonical_state(args: &[&str]) -> Result<CanonicalState, String> {
    let [pos, state, time @ ..] = args else {
        return Err("expected <pos> <paused|playing> <time>".to_string());
    };

    let position = pos
        .parse::<usize>()
        .ok()
        .and_then(|p| p.checked_sub(1))
        .ok_or_else(|| format!("'{pos}' is not a playlist position"))?;
    let state = PlayState::from_str(state).map_err(|_| format!("'{state}' is not a play state"))?;
    let seconds = parse_time_strict(&time.join(" "))
        .filter(|s| *s >= 0)
        .ok_or_else(|| format!("'{}' is not a time", time.join(" ")))?;

    Ok(CanonicalState {
        position,
        paused: state.is_paused(),
        time: seconds as f64,
    })
}
