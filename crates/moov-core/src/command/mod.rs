//! Chat command grammar.
//!
//! Commands are ordinary chat lines. The same text is both what a person
//! types and what one instance sends the other to keep players in step, so
//! everything here is pure and independent of the player and the store.

pub mod builtin;
pub mod format;
pub mod model;
pub mod parser;

pub use builtin::{CommandHelp, command_catalog, find_command};
pub use model::{Command, Keyword, ParsedLine, SeekKind};
pub use parser::parse_line;
