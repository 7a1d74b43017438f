//! Catalog of chat commands.
//!
//! Used for help output and completion in hosts. Built once and cached for
//! the lifetime of the process.

use super::model::Keyword;
use std::sync::OnceLock;

/// Usage documentation for one chat command.
#[derive(Debug, Clone)]
pub struct CommandHelp {
    pub keyword: Keyword,
    /// Usage format (e.g., ".seek <time>")
    pub usage: &'static str,
    pub description: &'static str,
}

impl CommandHelp {
    const fn new(keyword: Keyword, usage: &'static str, description: &'static str) -> Self {
        Self {
            keyword,
            usage,
            description,
        }
    }

    pub fn requires_player(&self) -> bool {
        self.keyword.requires_player()
    }
}

static COMMANDS: OnceLock<Vec<CommandHelp>> = OnceLock::new();

/// Returns every chat command in classification priority order.
pub fn command_catalog() -> &'static [CommandHelp] {
    COMMANDS.get_or_init(|| {
        vec![
            CommandHelp::new(Keyword::Status, ".status", "Report what is playing"),
            CommandHelp::new(Keyword::TogglePause, "pp", "Toggle pause"),
            CommandHelp::new(Keyword::Seek, ".seek <time>", "Seek to an absolute time"),
            CommandHelp::new(Keyword::SeekForward, ".seek+ <time>", "Seek forward"),
            CommandHelp::new(Keyword::SeekBackward, ".seek- <time>", "Seek backward"),
            CommandHelp::new(
                Keyword::Set,
                ".set <pos> <paused|playing> <time>",
                "Set playlist position, pause state and time at once",
            ),
            CommandHelp::new(Keyword::Close, ".close", "Save the position and close the player"),
            CommandHelp::new(Keyword::Add, ".add <url> [time]", "Remember a video for later"),
            CommandHelp::new(Keyword::Open, ".o <url> [time]", "Open a video for both sides"),
            CommandHelp::new(Keyword::List, ".list", "List remembered videos"),
            CommandHelp::new(Keyword::Pop, ".pop [idx...]", "Forget videos by index"),
            CommandHelp::new(
                Keyword::Resume,
                ".resume [idx]",
                "Reopen a remembered video where it was left",
            ),
            CommandHelp::new(Keyword::Reopen, ".re", "Resend the open command at the current time"),
        ]
    })
}

/// Find a command's help entry by its leading token.
pub fn find_command(token: &str) -> Option<&'static CommandHelp> {
    command_catalog()
        .iter()
        .find(|cmd| cmd.keyword.as_str() == token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_catalog_covers_every_keyword() {
        for keyword in Keyword::iter() {
            assert!(
                command_catalog().iter().any(|c| c.keyword == keyword),
                "missing {keyword}"
            );
        }
    }

    #[test]
    fn test_find_command() {
        assert!(find_command(".seek+").is_some());
        assert!(find_command("pp").unwrap().requires_player());
        assert!(find_command(".nonexistent").is_none());
    }
}
