//! Exploded distributable on the local filesystem.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use super::{safe_components, ResourceRoot, ZipSource};

/// Resource root backed by a directory tree.
#[derive(Clone, Debug)]
pub struct DirRoot {
    base: PathBuf,
}

impl DirRoot {
    pub fn new(base: impl AsRef<Path>) -> Self {
        Self {
            base: base.as_ref().to_path_buf(),
        }
    }

    /// Filesystem location of a regular file at `path`, if one can exist.
    ///
    /// A parent that is missing or is not a directory means nothing lives at
    /// `path`; the open would otherwise fail with `ENOTDIR`.
    fn locate(&self, path: &str) -> Option<PathBuf> {
        let comps = safe_components(path)?;
        let full = comps
            .iter()
            .fold(self.base.clone(), |acc, c| acc.join(c));
        if full.is_dir() || !full.parent().is_some_and(Path::is_dir) {
            return None;
        }
        Some(full)
    }
}

impl ResourceRoot for DirRoot {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        let Some(full) = self.locate(path) else {
            return Ok(None);
        };
        match fs::read(&full) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn open_archive(&self, path: &str) -> io::Result<Option<Box<dyn ZipSource>>> {
        let Some(full) = self.locate(path) else {
            return Ok(None);
        };
        match File::open(&full) {
            Ok(f) => Ok(Some(Box::new(f))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}
