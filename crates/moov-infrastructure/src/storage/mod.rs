//! Storage layer for atomic whole-file documents.

mod atomic_file;

pub use atomic_file::{
    AtomicFile, AtomicFileError, AtomicJsonFile, AtomicTomlFile, FileFormat, Json, Toml,
};
