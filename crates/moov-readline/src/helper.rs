use std::borrow::Cow::{self, Borrowed, Owned};

use colored::Colorize;
use moov_core::command::{command_catalog, find_command};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};

/// rustyline helper that completes, highlights and hints chat commands.
#[derive(Clone, Default)]
pub struct CliHelper;

/// Keywords starting with `prefix`, in catalog order.
pub fn complete_keyword(prefix: &str) -> Vec<&'static str> {
    if prefix.is_empty() || prefix.contains(char::is_whitespace) {
        return Vec::new();
    }
    command_catalog()
        .iter()
        .map(|c| c.keyword.as_str())
        .filter(|k| k.starts_with(prefix))
        .collect()
}

/// The rest of the usage line for what has been typed so far.
pub fn usage_hint(line: &str) -> Option<String> {
    let token = line.split_whitespace().next()?;
    if line.ends_with(char::is_whitespace) || line.len() > token.len() {
        return None;
    }
    // Exact keyword: show its arguments; otherwise complete the keyword
    let usage = match find_command(token) {
        Some(cmd) => cmd.usage,
        None => command_catalog()
            .iter()
            .find(|c| c.usage.starts_with(token))?
            .usage,
    };
    usage
        .get(token.len()..)
        .filter(|rest| !rest.is_empty())
        .map(str::to_string)
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let candidates = complete_keyword(&line[..pos])
            .into_iter()
            .map(|k| Pair {
                display: k.to_string(),
                replacement: k.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        let is_command = line
            .split_whitespace()
            .next()
            .is_some_and(|t| find_command(t).is_some());
        if is_command {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Owned(hint.bright_black().to_string())
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        usage_hint(&line[..pos])
    }
}

impl Validator for CliHelper {}
