//! Distributable packed as a single zip bundle (`.war`, `.jar`).
//!
//! Resources are bundle entries. A nested archive cannot be seeked in place
//! when it is deflated, so `open_archive` inflates it into memory and hands
//! out a cursor over the copy.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use super::{safe_components, ResourceRoot, ZipSource};
use crate::archive::{ZipCursor, ZipNext, ZipOpen};
use crate::config::LoaderConfig;
use crate::outcome::ArchiveFault;

/// Resource root backed by a zip file on disk.
///
/// The bundle and every nested archive are bounded by the loader limits:
/// `max_entries_per_archive` for the bundle directory, `max_entry_bytes` for
/// plain resources and `max_nested_archive_bytes` for inflated archives.
#[derive(Clone, Debug)]
pub struct PackedRoot {
    path: PathBuf,
    max_entries: u32,
    max_resource_bytes: u64,
    max_archive_bytes: u64,
}

impl PackedRoot {
    pub fn new(path: impl AsRef<Path>, cfg: &LoaderConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            max_entries: cfg.max_entries_per_archive,
            max_resource_bytes: cfg.max_entry_bytes,
            max_archive_bytes: cfg.max_nested_archive_bytes,
        }
    }

    fn fault(&self, fault: ArchiveFault) -> io::Error {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bundle `{}`: {fault}", self.path.display()),
        )
    }

    /// Scan the bundle directory for `path` and read it fully.
    fn read_entry(&self, path: &str, max_bytes: u64) -> io::Result<Option<Vec<u8>>> {
        let Some(comps) = safe_components(path) else {
            return Ok(None);
        };
        let wanted = comps.join("/");

        let file = File::open(&self.path)?;
        let mut cursor = match ZipCursor::open(file, self.max_entries)? {
            ZipOpen::Ready(c) => c,
            ZipOpen::Stop(fault) => return Err(self.fault(fault)),
        };

        let loc = loop {
            match cursor.next_entry()? {
                ZipNext::End => return Ok(None),
                ZipNext::Stop(fault) => return Err(self.fault(fault)),
                ZipNext::Entry(meta) => {
                    if !meta.is_dir && meta.name == wanted.as_bytes() {
                        break meta.locator();
                    }
                }
            }
        };

        match cursor.read_entry(loc, max_bytes)? {
            Ok(bytes) => Ok(Some(bytes)),
            Err(fault) => Err(self.fault(fault)),
        }
    }
}

impl ResourceRoot for PackedRoot {
    fn read(&self, path: &str) -> io::Result<Option<Vec<u8>>> {
        self.read_entry(path, self.max_resource_bytes)
    }

    fn open_archive(&self, path: &str) -> io::Result<Option<Box<dyn ZipSource>>> {
        Ok(self
            .read_entry(path, self.max_archive_bytes)?
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn ZipSource>))
    }
}
