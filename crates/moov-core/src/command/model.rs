//! Command domain models.

use crate::player::CanonicalState;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

/// The leading token that selects a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, IntoStaticStr)]
pub enum Keyword {
    #[strum(serialize = ".status")]
    Status,
    #[strum(serialize = "pp")]
    TogglePause,
    #[strum(serialize = ".seek")]
    Seek,
    #[strum(serialize = ".seek+")]
    SeekForward,
    #[strum(serialize = ".seek-")]
    SeekBackward,
    #[strum(serialize = ".set")]
    Set,
    #[strum(serialize = ".close")]
    Close,
    #[strum(serialize = ".add")]
    Add,
    #[strum(serialize = ".o")]
    Open,
    #[strum(serialize = ".list")]
    List,
    #[strum(serialize = ".pop")]
    Pop,
    #[strum(serialize = ".resume")]
    Resume,
    #[strum(serialize = ".re")]
    Reopen,
}

impl Keyword {
    /// Commands that are silently dropped when no player is running.
    pub fn requires_player(self) -> bool {
        matches!(
            self,
            Self::TogglePause
                | Self::Seek
                | Self::SeekForward
                | Self::SeekBackward
                | Self::Set
                | Self::Close
                | Self::Reopen
        )
    }

    pub fn as_str(self) -> &'static str {
        self.into()
    }
}

/// How a `.seek` family command moves the playhead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekKind {
    Absolute,
    Forward,
    Backward,
}

/// A classified chat command with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    TogglePause,
    Seek { kind: SeekKind, seconds: i64 },
    Set(CanonicalState),
    Close,
    Add { url: String, time: i64 },
    Open { url: String, time: i64 },
    List,
    Pop(Vec<i64>),
    /// Resume the session at this index, or the top one
    Resume(Option<usize>),
    Reopen,
}

impl Command {
    pub fn keyword(&self) -> Keyword {
        match self {
            Self::Status => Keyword::Status,
            Self::TogglePause => Keyword::TogglePause,
            Self::Seek {
                kind: SeekKind::Absolute,
                ..
            } => Keyword::Seek,
            Self::Seek {
                kind: SeekKind::Forward,
                ..
            } => Keyword::SeekForward,
            Self::Seek {
                kind: SeekKind::Backward,
                ..
            } => Keyword::SeekBackward,
            Self::Set(_) => Keyword::Set,
            Self::Close => Keyword::Close,
            Self::Add { .. } => Keyword::Add,
            Self::Open { .. } => Keyword::Open,
            Self::List => Keyword::List,
            Self::Pop(_) => Keyword::Pop,
            Self::Resume(_) => Keyword::Resume,
            Self::Reopen => Keyword::Reopen,
        }
    }

    pub fn requires_player(&self) -> bool {
        self.keyword().requires_player()
    }
}

/// Result of classifying one chat line.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    /// Ordinary conversation
    Chat,
    Command(Command),
    /// A recognised keyword with arguments that do not fit its grammar
    Invalid { keyword: Keyword, reason: String },
}
