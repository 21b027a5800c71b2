//! References to persisted captures.

use std::path::{Path, PathBuf};

/// Opaque reference to a persisted capture artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    path: PathBuf,
}

impl ResourceLocator {
    /// Wraps the path of a written file.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Filesystem path of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `file://` URI form, as handed to media viewers.
    pub fn to_uri(&self) -> String {
        let absolute = if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.path))
                .unwrap_or_else(|_| self.path.clone())
        };
        format!("file://{}", absolute.display())
    }

    /// True if the locator carries no path.
    pub fn is_empty(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl std::fmt::Display for ResourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
