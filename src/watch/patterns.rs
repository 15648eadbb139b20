// src/watch/patterns.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};
use tracing::{debug, warn};

use crate::errors::{Result, WatchRunError};
use crate::fs::FileSystem;
use crate::watch::path_utils::relative_str;

const GLOB_META: [char; 4] = ['*', '?', '[', '{'];

/// What to watch, as given by the user: an ordered list of paths or globs
/// (relative to the project root, or absolute) plus exclude globs.
///
/// Immutable once the loop has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSpec {
    paths: Vec<String>,
    exclude: Vec<String>,
}

impl WatchSpec {
    pub fn new(paths: Vec<String>, exclude: Vec<String>) -> Self {
        Self { paths, exclude }
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }

    /// Turn the configured entries into concrete watch targets under `root`.
    ///
    /// - `src/**/*.rs` watches `src` recursively and only accepts paths
    ///   matching the glob.
    /// - A plain directory is watched recursively.
    /// - A plain file is watched through its parent directory and only that
    ///   exact path is accepted. Watching the file's inode directly would
    ///   lose the watch on the first rename-over save.
    /// - Entries that do not exist are skipped with a warning.
    ///
    /// Fails with `ConfigError` when nothing is left to watch.
    pub fn resolve(&self, fs: &dyn FileSystem, root: &Path) -> Result<WatchMatcher> {
        let root = fs.canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let mut targets = Vec::with_capacity(self.paths.len());

        for entry in &self.paths {
            let (base, include) = split_glob_base(entry);
            let abs = if base.is_absolute() { base } else { root.join(base) };

            if !fs.exists(&abs) {
                warn!(path = %entry, resolved = %abs.display(), "watch path does not exist; skipping");
                continue;
            }

            let include = include.map(|g| compile_glob(&g)).transpose()?;
            let target = if fs.is_dir(&abs) {
                WatchTarget {
                    path: fs.canonicalize(&abs).unwrap_or(abs),
                    recursive: true,
                    file: None,
                    include,
                }
            } else {
                let (Some(parent), Some(name)) = (abs.parent(), abs.file_name()) else {
                    warn!(path = %entry, "watch path has no parent directory; skipping");
                    continue;
                };
                let dir = fs.canonicalize(parent).unwrap_or_else(|_| parent.to_path_buf());
                WatchTarget {
                    file: Some(dir.join(name)),
                    path: dir,
                    recursive: false,
                    include,
                }
            };
            debug!(?target, "resolved watch target");
            targets.push(target);
        }

        if targets.is_empty() {
            return Err(WatchRunError::ConfigError(format!(
                "no watchable paths (none of {:?} exist under {})",
                self.paths,
                root.display()
            )));
        }

        Ok(WatchMatcher {
            root,
            targets,
            exclude: compile_globset(&self.exclude)?,
        })
    }
}

/// One watch entry: the directory handed to the OS watcher and what under it
/// counts as a change.
#[derive(Clone)]
pub struct WatchTarget {
    /// Directory registered with the OS watcher.
    pub path: PathBuf,
    pub recursive: bool,
    /// For a single-file entry, the only path accepted.
    pub file: Option<PathBuf>,
    include: Option<GlobMatcher>,
}

impl fmt::Debug for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchTarget")
            .field("path", &self.path)
            .field("recursive", &self.recursive)
            .field("file", &self.file)
            .field("include", &self.include.as_ref().map(|m| m.glob().glob()))
            .finish()
    }
}

impl WatchTarget {
    fn accepts(&self, path: &Path, rel: Option<&str>) -> bool {
        if let Some(file) = &self.file {
            return path == file;
        }
        if !path.starts_with(&self.path) {
            return false;
        }
        match &self.include {
            None => true,
            Some(glob) => rel.is_some_and(|r| glob.is_match(r)) || glob.is_match(path),
        }
    }
}

/// Compiled form of a [`WatchSpec`]: decides which changed paths matter.
#[derive(Clone)]
pub struct WatchMatcher {
    root: PathBuf,
    targets: Vec<WatchTarget>,
    exclude: GlobSet,
}

impl fmt::Debug for WatchMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchMatcher")
            .field("root", &self.root)
            .field("targets", &self.targets)
            .field("exclude_count", &self.exclude.len())
            .finish()
    }
}

impl WatchMatcher {
    pub fn targets(&self) -> &[WatchTarget] {
        &self.targets
    }

    /// Directories to register with the OS watcher, each once.
    ///
    /// A directory already covered by a recursive watch is not registered
    /// again; a directory needed both ways is watched recursively.
    pub fn watch_dirs(&self) -> Vec<(PathBuf, bool)> {
        let mut dirs: BTreeMap<PathBuf, bool> = BTreeMap::new();
        for target in &self.targets {
            let recursive = dirs.entry(target.path.clone()).or_insert(false);
            *recursive |= target.recursive;
        }

        let recursive_roots: Vec<PathBuf> = dirs
            .iter()
            .filter(|(_, recursive)| **recursive)
            .map(|(dir, _)| dir.clone())
            .collect();

        dirs.into_iter()
            .filter(|(dir, _)| {
                !recursive_roots
                    .iter()
                    .any(|root| dir != root && dir.starts_with(root))
            })
            .collect()
    }

    /// Is a change at `path` worth a trigger?
    ///
    /// Excludes are matched against the root-relative path (forward slashes),
    /// or the absolute path for anything outside the root. Directory names
    /// above the root never take part, so a project living under e.g.
    /// `/home/me/target/` is not excluded wholesale by `**/target/**`.
    pub fn is_relevant(&self, path: &Path) -> bool {
        let rel = relative_str(&self.root, path);

        let excluded = match rel.as_deref() {
            Some(r) => self.exclude.is_match(r),
            None => self.exclude.is_match(path),
        };
        if excluded {
            return false;
        }

        self.targets.iter().any(|t| t.accepts(path, rel.as_deref()))
    }
}

/// Split a watch entry into the literal directory to watch and, if the entry
/// contains glob syntax, the glob itself.
///
/// `"src/**/*.rs"` -> `("src", Some("src/**/*.rs"))`, `"*.toml"` -> `(".", ...)`.
pub fn split_glob_base(entry: &str) -> (PathBuf, Option<String>) {
    let mut base = PathBuf::new();
    for component in Path::new(entry).components() {
        let is_glob = matches!(component, Component::Normal(part)
            if part.to_string_lossy().contains(GLOB_META));
        if is_glob {
            if base.as_os_str().is_empty() {
                base.push(".");
            }
            return (base, Some(entry.to_string()));
        }
        base.push(component);
    }
    (base, None)
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| WatchRunError::ConfigError(format!("invalid glob {pattern:?}: {e}")))
}

/// Compile a list of globs into one set, mapping syntax errors to
/// `ConfigError`.
pub fn compile_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|e| WatchRunError::ConfigError(format!("invalid glob {pattern:?}: {e}")))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| WatchRunError::ConfigError(format!("invalid glob set: {e}")))
}
