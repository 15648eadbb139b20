// src/fs/mock.rs

use super::FileSystem;
use anyhow::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MockEntry {
    File,
    Dir,
}

/// In-memory tree of files and directories. Paths are used verbatim, so tests
/// should stick to absolute paths.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    entries: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file; parent directories are created implicitly. The contents
    /// are irrelevant for watching and only accepted for readability.
    pub fn add_file(&self, path: impl AsRef<Path>, _content: impl AsRef<[u8]>) {
        let path = path.as_ref();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(path.to_path_buf(), MockEntry::File);
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries.insert(ancestor.to_path_buf(), MockEntry::Dir);
        }
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut entries = self.entries.lock().unwrap();
        for ancestor in path.as_ref().ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries.insert(ancestor.to_path_buf(), MockEntry::Dir);
        }
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.entries.lock().unwrap().get(path) == Some(&MockEntry::Dir)
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf> {
        // Absolute paths are assumed in tests; nothing to resolve.
        Ok(path.to_path_buf())
    }
}
