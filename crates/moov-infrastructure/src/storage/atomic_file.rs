//! Atomic file operations for whole-document JSON and TOML files.
//!
//! Every save rewrites the full document: serialize, write to a temporary
//! sibling, fsync, rename over the target. An exclusive lock file serializes
//! writers across processes.

use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during atomic file operations.
#[derive(Debug, Error)]
pub enum AtomicFileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{format} parse error: {message}")]
    Decode {
        format: &'static str,
        message: String,
    },
    #[error("{format} serialization error: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },
    #[error("Lock error: {0}")]
    Lock(String),
}

impl From<AtomicFileError> for moov_core::MoovError {
    fn from(err: AtomicFileError) -> Self {
        match err {
            AtomicFileError::Io(e) => e.into(),
            AtomicFileError::Decode { format, message }
            | AtomicFileError::Encode { format, message } => Self::Serialization {
                format: format.to_string(),
                message,
            },
            AtomicFileError::Lock(message) => Self::io(message),
        }
    }
}

/// A document encoding.
pub trait FileFormat {
    const NAME: &'static str;

    fn decode<T: DeserializeOwned>(content: &str) -> Result<T, AtomicFileError>;

    fn encode<T: Serialize>(data: &T) -> Result<String, AtomicFileError>;
}

/// JSON indented with four spaces.
pub struct Json;

impl FileFormat for Json {
    const NAME: &'static str = "JSON";

    fn decode<T: DeserializeOwned>(content: &str) -> Result<T, AtomicFileError> {
        serde_json::from_str(content).map_err(|e| AtomicFileError::Decode {
            format: Self::NAME,
            message: e.to_string(),
        })
    }

    fn encode<T: Serialize>(data: &T) -> Result<String, AtomicFileError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut serializer)
            .map_err(|e| AtomicFileError::Encode {
                format: Self::NAME,
                message: e.to_string(),
            })?;
        String::from_utf8(buf).map_err(|e| AtomicFileError::Encode {
            format: Self::NAME,
            message: e.to_string(),
        })
    }
}

pub struct Toml;

impl FileFormat for Toml {
    const NAME: &'static str = "TOML";

    fn decode<T: DeserializeOwned>(content: &str) -> Result<T, AtomicFileError> {
        toml::from_str(content).map_err(|e| AtomicFileError::Decode {
            format: Self::NAME,
            message: e.to_string(),
        })
    }

    fn encode<T: Serialize>(data: &T) -> Result<String, AtomicFileError> {
        toml::to_string_pretty(data).map_err(|e| AtomicFileError::Encode {
            format: Self::NAME,
            message: e.to_string(),
        })
    }
}

/// A handle to a whole-document file that is replaced atomically.
///
/// Provides:
/// - **Atomicity**: updates are all-or-nothing via tmp file + rename
/// - **Isolation**: a lock file keeps concurrent writers apart
/// - **Durability**: explicit fsync before rename
pub struct AtomicFile<T, F> {
    path: PathBuf,
    _phantom: PhantomData<fn() -> (T, F)>,
}

pub type AtomicJsonFile<T> = AtomicFile<T, Json>;
pub type AtomicTomlFile<T> = AtomicFile<T, Toml>;

impl<T, F> Clone for AtomicFile<T, F> {
    fn clone(&self) -> Self {
        Self::new(self.path.clone())
    }
}

impl<T, F> AtomicFile<T, F> {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T, F> AtomicFile<T, F>
where
    T: Serialize + DeserializeOwned,
    F: FileFormat,
{
    /// Loads and decodes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: successfully loaded
    /// - `Ok(None)`: file doesn't exist or is blank
    /// - `Err`: failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>, AtomicFileError> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        F::decode(&content).map(Some)
    }

    /// Encodes `data` and replaces the file with it, holding the lock.
    pub fn save(&self, data: &T) -> Result<(), AtomicFileError> {
        let _lock = FileLock::acquire(&self.path)?;
        self.write_unlocked(data)
    }

    fn write_unlocked(&self, data: &T) -> Result<(), AtomicFileError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let encoded = F::encode(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(encoded.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    fn temp_path(&self) -> Result<PathBuf, AtomicFileError> {
        let file_name = self.path.file_name().ok_or_else(|| {
            AtomicFileError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Path has no file name",
            ))
        })?;
        let tmp_name = format!(".{}.tmp", file_name.to_string_lossy());
        Ok(self.path.with_file_name(tmp_name))
    }
}

/// Exclusive lock held for the guard's lifetime.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self, AtomicFileError> {
        let lock_path = path.with_extension("lock");

        if let Some(parent) = lock_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| AtomicFileError::Lock(format!("Failed to acquire lock: {}", e)))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Best effort; the lock itself goes away with the handle
        let _ = fs::remove_file(&self.lock_path);
    }
}
