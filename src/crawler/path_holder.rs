//! Immutable filesystem path value.

use std::path::Path;

/// One filesystem path with its derived parts, computed once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathHolder {
    path: String,
    base_name: String,
    ext: String,
    is_directory: bool,
    lossy: bool,
}

impl PathHolder {
    /// Wrap `path`, querying the filesystem once to tell directories apart.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let is_directory = path.is_dir();
        Self::with_kind(path, is_directory)
    }

    /// Wrap `path` with an explicit directory flag, without touching the filesystem.
    pub fn with_kind(path: impl AsRef<Path>, is_directory: bool) -> Self {
        let path = path.as_ref();
        let base_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let ext = Path::new(&base_name)
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_string_lossy().into_owned(),
            base_name,
            ext,
            is_directory,
            lossy: path.to_str().is_none(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.path)
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    /// Extension without the leading dot, empty when there is none.
    pub fn ext(&self) -> &str {
        &self.ext
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// The original path was not valid UTF-8, so [`path`](Self::path) does not name it.
    pub fn is_lossy(&self) -> bool {
        self.lossy
    }
}
