//! Read-only resource namespace of a distributable.
//!
//! A distributable is either an exploded directory tree or a packed zip
//! bundle. Both expose the same relative, `/`-separated resource paths
//! (`WEB-INF/classes/...`, `WEB-INF/lib/...`, `META-INF/MANIFEST.MF`).
//!
//! # Invariants
//! - `Ok(None)` means "nothing at this path" and is never an error.
//! - Every `open_archive` call returns an independent handle.
//! - Paths with `..` or absolute components are never resolved.

use std::fs::File;
use std::io::{self, Read, Seek};
use std::path::Path;

mod dir;
mod packed;

pub use dir::DirRoot;
pub use packed::PackedRoot;

use crate::archive::is_zip_magic;
use crate::config::LoaderConfig;

/// Random-access byte source a zip cursor can run over.
pub trait ZipSource: Read + Seek {}

impl<T: Read + Seek + ?Sized> ZipSource for T {}

/// Resource lookup capability used by the local store, the archive scanner,
/// and the descriptor reader.
pub trait ResourceRoot {
    /// Read a whole resource.
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>>;

    /// Open an archive bundle for scanning.
    fn open_archive(&self, path: &str) -> io::Result<Option<Box<dyn ZipSource>>>;
}

impl<T: ResourceRoot + ?Sized> ResourceRoot for &T {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        (**self).read(path)
    }

    fn open_archive(&self, path: &str) -> io::Result<Option<Box<dyn ZipSource>>> {
        (**self).open_archive(path)
    }
}

/// Split a relative resource path into safe components.
///
/// Returns `None` for absolute paths and paths containing `..`.
pub(crate) fn safe_components(path: &str) -> Option<Vec<&str>> {
    if path.starts_with('/') {
        return None;
    }
    let mut out = Vec::new();
    for comp in path.split('/') {
        match comp {
            "" | "." => continue,
            ".." => return None,
            c => out.push(c),
        }
    }
    if out.is_empty() {
        return None;
    }
    Some(out)
}

/// A distributable opened from a filesystem path.
pub enum Distributable {
    Dir(DirRoot),
    Packed(PackedRoot),
}

impl Distributable {
    /// Directory -> exploded root; file with zip magic -> packed root bounded
    /// by the limits in `cfg`.
    pub fn open(path: &Path, cfg: &LoaderConfig) -> io::Result<Self> {
        if path.is_dir() {
            return Ok(Distributable::Dir(DirRoot::new(path)));
        }

        let mut header = [0u8; 4];
        let mut f = File::open(path)?;
        let mut filled = 0;
        while filled < header.len() {
            match f.read(&mut header[filled..])? {
                0 => break,
                n => filled += n,
            }
        }
        if is_zip_magic(&header[..filled]) {
            return Ok(Distributable::Packed(PackedRoot::new(path, cfg)));
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "`{}` is neither a directory nor a zip bundle",
                path.display()
            ),
        ))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Distributable::Dir(_) => "dir",
            Distributable::Packed(_) => "packed",
        }
    }
}

impl ResourceRoot for Distributable {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        match self {
            Distributable::Dir(r) => r.read(path),
            Distributable::Packed(r) => r.read(path),
        }
    }

    fn open_archive(&self, path: &str) -> io::Result<Option<Box<dyn ZipSource>>> {
        match self {
            Distributable::Dir(r) => r.open_archive(path),
            Distributable::Packed(r) => r.open_archive(path),
        }
    }
}
