//! Filesystem-backed log blob sources

use super::BlobSource;
use crate::error::SourceError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

/// Number of most recent blobs read per cycle
pub const DEFAULT_MAX_BLOBS: usize = 10;

/// Reads the most recent log files from a directory
///
/// Files are selected by name prefix and ordered by name; only the last
/// `max_blobs` are read. A file that cannot be read as UTF-8 text is skipped
/// with a warning instead of failing the batch.
#[derive(Debug, Clone)]
pub struct DirectoryBlobSource {
    root: PathBuf,
    prefix: String,
    max_blobs: usize,
}

impl DirectoryBlobSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
            max_blobs: DEFAULT_MAX_BLOBS,
        }
    }

    /// Only consider files whose name starts with `prefix`
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_max_blobs(mut self, max_blobs: usize) -> Self {
        self.max_blobs = max_blobs;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Matching file paths, sorted by name, limited to the newest `max_blobs`
    pub async fn list(&self) -> Result<Vec<PathBuf>, SourceError> {
        let mut files = list_files(&self.root).await?;
        files.retain(|path| {
            path.file_name()
                .map(|name| name.to_string_lossy().starts_with(&self.prefix))
                .unwrap_or(false)
        });

        let skip = files.len().saturating_sub(self.max_blobs);
        Ok(files.split_off(skip))
    }
}

#[async_trait]
impl BlobSource for DirectoryBlobSource {
    async fn fetch(&self) -> Result<Vec<String>, SourceError> {
        let files = self.list().await?;
        if files.is_empty() {
            debug!(root = %self.root.display(), prefix = %self.prefix, "No log files found");
        }

        let mut blobs = Vec::with_capacity(files.len());
        for path in files {
            match fs::read_to_string(&path).await {
                Ok(content) => {
                    debug!(path = %path.display(), bytes = content.len(), "Fetched log file");
                    blobs.push(content);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable log file");
                }
            }
        }

        Ok(blobs)
    }
}

/// Reads an explicit list of files and directories
///
/// Directories contribute their regular files in name order. Unlike
/// [`DirectoryBlobSource`], any read failure fails the whole fetch.
#[derive(Debug, Clone)]
pub struct PathBlobSource {
    paths: Vec<PathBuf>,
}

impl PathBlobSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl BlobSource for PathBlobSource {
    async fn fetch(&self) -> Result<Vec<String>, SourceError> {
        let mut blobs = Vec::new();

        for path in &self.paths {
            let metadata = fs::metadata(path).await.map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;

            let files = if metadata.is_dir() {
                list_files(path).await?
            } else {
                vec![path.clone()]
            };

            for file in files {
                let content = fs::read_to_string(&file)
                    .await
                    .map_err(|source| SourceError::Io {
                        path: file.clone(),
                        source,
                    })?;
                blobs.push(content);
            }
        }

        Ok(blobs)
    }
}

/// Regular files directly inside `dir`, sorted by path
async fn list_files(dir: &Path) -> Result<Vec<PathBuf>, SourceError> {
    let io_err = |source: std::io::Error| SourceError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let is_file = entry
            .file_type()
            .await
            .map(|t| t.is_file())
            .unwrap_or(false);
        if is_file {
            files.push(entry.path());
        }
    }

    files.sort();
    Ok(files)
}
