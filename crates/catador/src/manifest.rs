//! Resolving symbolic manifest names to files on disk.
//!
//! Flows refer to subscription manifests by a short name; the store maps
//! that name to an actual file under the configured manifest directory,
//! because the file-picker field needs an absolute path typed into it.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::result::{CatadorError, CatadorResult};

const MANIFEST_EXTENSION: &str = "zip";

/// Directory-backed manifest lookup
#[derive(Debug, Clone)]
pub struct ManifestStore {
    dir: PathBuf,
}

impl ManifestStore {
    /// Create a store over a directory
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The backing directory
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a symbolic name to an existing file.
    ///
    /// Accepts either an exact file name or the name with the manifest
    /// extension appended.
    pub fn resolve(&self, name: &str) -> CatadorResult<PathBuf> {
        let exact = self.dir.join(name);
        if exact.is_file() {
            return Ok(exact);
        }
        let with_extension = self.dir.join(format!("{name}.{MANIFEST_EXTENSION}"));
        if with_extension.is_file() {
            debug!(name, path = %with_extension.display(), "resolved manifest");
            return Ok(with_extension);
        }
        Err(CatadorError::ManifestMissing {
            name: name.to_string(),
        })
    }

    /// Symbolic names available in the store
    pub fn available(&self) -> CatadorResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some(MANIFEST_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}
