// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nbflow contributors

//! Notebook path resolution

use std::path::{Path, PathBuf};

/// Turns an operation's filename into a filesystem location
pub trait PathResolver: Send + Sync {
    fn resolve(&self, path: &Path) -> PathBuf;
}

/// Resolves relative paths against a root directory
#[derive(Debug, Clone)]
pub struct RootDirResolver {
    root_dir: PathBuf,
}

impl RootDirResolver {
    /// Create a resolver; a relative root is anchored at the current directory
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        let root_dir = root_dir.into();
        let root_dir = if root_dir.is_absolute() {
            root_dir
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&root_dir))
                .unwrap_or(root_dir)
        };

        Self { root_dir }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}

impl PathResolver for RootDirResolver {
    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_paths_join_root() {
        let resolver = RootDirResolver::new("/srv/notebooks");
        assert_eq!(
            resolver.resolve(Path::new("etl/load.ipynb")),
            PathBuf::from("/srv/notebooks/etl/load.ipynb")
        );
    }

    #[test]
    fn test_absolute_paths_untouched() {
        let resolver = RootDirResolver::new("/srv/notebooks");
        assert_eq!(
            resolver.resolve(Path::new("/elsewhere/x.ipynb")),
            PathBuf::from("/elsewhere/x.ipynb")
        );
    }

    #[test]
    fn test_relative_root_is_anchored() {
        let resolver = RootDirResolver::new("notebooks");
        assert!(resolver.root_dir().is_absolute());
        assert!(resolver.root_dir().ends_with("notebooks"));
    }
}
