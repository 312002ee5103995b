use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::{AppError, AppResult};

/// A single named slot of durable text storage, read once and overwritten
/// wholesale.
pub trait BookmarkSlot: Send + Sync {
    /// Returns the slot content, or `None` if nothing was ever written
    fn read(&self) -> AppResult<Option<String>>;

    /// Replaces the slot content
    fn write(&self, contents: &str) -> AppResult<()>;
}

/// Slot backed by a file on disk
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl BookmarkSlot for FileSlot {
    fn read(&self) -> AppResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Storage(e)),
        }
    }

    fn write(&self, contents: &str) -> AppResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Rename over the old file so readers never see a half-written array
        let temp = self.temp_path();
        fs::write(&temp, contents)?;
        fs::rename(&temp, &self.path)?;

        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "Bookmark slot written");
        Ok(())
    }
}

/// In-memory slot. Clones share the same cell, so a test can keep a handle
/// and inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    cell: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            cell: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    /// Current content of the slot
    pub fn contents(&self) -> Option<String> {
        self.cell.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl BookmarkSlot for MemorySlot {
    fn read(&self) -> AppResult<Option<String>> {
        self.cell
            .lock()
            .map(|c| c.clone())
            .map_err(|e| AppError::Internal(format!("Bookmark slot poisoned: {}", e)))
    }

    fn write(&self, contents: &str) -> AppResult<()> {
        let mut cell = self
            .cell
            .lock()
            .map_err(|e| AppError::Internal(format!("Bookmark slot poisoned: {}", e)))?;
        *cell = Some(contents.to_string());
        Ok(())
    }
}
