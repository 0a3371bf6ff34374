//! Durable storage for log records.
//!
//! The log is an append-only text file holding one record per line. Every
//! append opens the file, writes one line, syncs it and closes the handle
//! again, so a crash between records loses at most the record in flight.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// A trait for durable, line-oriented log storage.
///
/// The persister appends through this trait and fault escalation reads the
/// whole log back through it for the audit dump.
#[async_trait::async_trait]
pub trait LogStorage: Send + Sync {
    /// Human-readable location of the log (for logging).
    fn location(&self) -> String;

    /// Prepare the medium and check that the log can be appended to.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be created or opened. This is
    /// fatal at startup.
    async fn initialize(&self) -> Result<()>;

    /// Append one line, durably, as a single open/write/sync/close cycle.
    ///
    /// `line` must not contain a newline; one is added.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageOpen`] if the log cannot be opened and
    /// [`Error::StorageWrite`] if writing or syncing fails.
    async fn append_line(&self, line: &str) -> Result<()>;

    /// Read every stored line, in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageRead`] if the log cannot be opened or read.
    async fn read_lines(&self) -> Result<Vec<String>>;
}

/// File-backed log storage.
#[derive(Debug, Clone)]
pub struct FileStorage {
    /// Path to the log file.
    path: PathBuf,
}

impl FileStorage {
    /// Create storage for the log file at `path`.
    ///
    /// Nothing is touched on disk until [`LogStorage::initialize`] or the
    /// first append.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get log statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    pub async fn stats(&self) -> Result<LogStats> {
        let records = self.read_lines().await?.len();
        let size_bytes = fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(LogStats {
            records,
            size_bytes,
        })
    }

    fn read_error(&self, source: std::io::Error) -> Error {
        Error::StorageRead {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait::async_trait]
impl LogStorage for FileStorage {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    async fn initialize(&self) -> Result<()> {
        // Create parent directories if needed
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|source| Error::DirectoryCreate {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }
        }

        debug!("Opening log at {}", self.path.display());
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::StorageInit {
                path: self.path.clone(),
                source,
            })?;

        info!("[OK] Log storage ready at {}", self.path.display());
        Ok(())
    }

    async fn append_line(&self, line: &str) -> Result<()> {
        let write_error = |source: std::io::Error| Error::StorageWrite {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::StorageOpen {
                path: self.path.clone(),
                source,
            })?;

        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        file.write_all(buf.as_bytes()).await.map_err(write_error)?;
        file.flush().await.map_err(write_error)?;
        file.sync_data().await.map_err(write_error)?;
        Ok(())
    }

    async fn read_lines(&self) -> Result<Vec<String>> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| self.read_error(source))?;

        let mut lines = BufReader::new(file).lines();
        let mut out = Vec::new();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|source| self.read_error(source))?
        {
            out.push(line);
        }
        Ok(out)
    }
}

/// Statistics about the stored log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogStats {
    /// Number of lines in the log.
    pub records: usize,
    /// Size of the log file in bytes.
    pub size_bytes: u64,
}
