//! Capture destinations.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Upper bound on `_N` suffixes tried when a timestamped name is taken.
const MAX_COLLISION_SUFFIX: u32 = 999;

/// Errors preparing a capture destination.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The album directory could not be created.
    #[error("failed to create media directory {path}: {source}")]
    DirectoryUnavailable {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying i/o error.
        #[source]
        source: std::io::Error,
    },
    /// A file occupies the album path.
    #[error("media path {0} exists and is not a directory")]
    NotADirectory(PathBuf),
    /// Every collision suffix is taken.
    #[error("no free file name for {0}")]
    NamesExhausted(String),
}

/// Kind of media being persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Compressed still image.
    Image,
}

impl MediaKind {
    /// File name prefix.
    pub fn prefix(self) -> &'static str {
        match self {
            MediaKind::Image => "IMG",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
        }
    }
}

/// Allocates destinations for persisted captures.
///
/// Implementations must return a path whose parent directory exists and
/// which no other file currently occupies, or fail explicitly.
pub trait Storage: Send + Sync {
    /// Reserves a destination path for a new artifact of `kind`.
    fn allocate_destination(&self, kind: MediaKind) -> Result<PathBuf, StorageError>;
}

impl<T: Storage + ?Sized> Storage for Arc<T> {
    fn allocate_destination(&self, kind: MediaKind) -> Result<PathBuf, StorageError> {
        (**self).allocate_destination(kind)
    }
}

/// Public media directory laid out as `<root>/<album>/IMG_<timestamp>.jpg`.
#[derive(Debug, Clone)]
pub struct MediaDirectory {
    root: PathBuf,
    album: String,
}

impl MediaDirectory {
    /// Creates a media directory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>, album: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            album: album.into(),
        }
    }

    /// Directory captures are written into.
    pub fn album_path(&self) -> PathBuf {
        self.root.join(&self.album)
    }

    /// Builds the file name for an artifact captured at `at`.
    ///
    /// `attempt` 0 yields `IMG_yyyyMMdd_HHmmss.jpg`; later attempts append
    /// `_<attempt>` before the extension.
    pub fn file_name(kind: MediaKind, at: DateTime<Local>, attempt: u32) -> String {
        let stamp = at.format("%Y%m%d_%H%M%S");
        if attempt == 0 {
            format!("{}_{}.{}", kind.prefix(), stamp, kind.extension())
        } else {
            format!("{}_{}_{}.{}", kind.prefix(), stamp, attempt, kind.extension())
        }
    }

    fn ensure_album(&self) -> Result<PathBuf, StorageError> {
        let dir = self.album_path();
        if dir.exists() && !dir.is_dir() {
            return Err(StorageError::NotADirectory(dir));
        }
        std::fs::create_dir_all(&dir).map_err(|source| {
            tracing::warn!(path = %dir.display(), error = %source, "failed to create media directory");
            StorageError::DirectoryUnavailable {
                path: dir.clone(),
                source,
            }
        })?;
        Ok(dir)
    }

    fn free_name(dir: &Path, kind: MediaKind, at: DateTime<Local>) -> Result<PathBuf, StorageError> {
        (0..=MAX_COLLISION_SUFFIX)
            .map(|attempt| dir.join(Self::file_name(kind, at, attempt)))
            .find(|candidate| !candidate.exists())
            .ok_or_else(|| StorageError::NamesExhausted(Self::file_name(kind, at, 0)))
    }
}

impl Storage for MediaDirectory {
    fn allocate_destination(&self, kind: MediaKind) -> Result<PathBuf, StorageError> {
        let dir = self.ensure_album()?;
        let path = Self::free_name(&dir, kind, Local::now())?;
        tracing::debug!(path = %path.display(), "allocated capture destination");
        Ok(path)
    }
}
