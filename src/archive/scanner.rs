//! Search one archive bundle for one unit.
//!
//! # Algorithm
//! For each central-directory entry, in order:
//! 1) skip directories;
//! 2) skip names without the payload suffix;
//! 3) compare the normalized name (suffix stripped, `/` -> `.`) with the target;
//! 4) on the first match, read the whole payload and stop.
//!
//! Exhausting the directory is `NotFound`. Any I/O error or container fault
//! is `Failure` and ends the scan immediately.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::archive::zip::{ZipCursor, ZipNext, ZipOpen};
use crate::bundle::ResourceRoot;
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::manifest::ArchiveId;
use crate::name::QualifiedName;
use crate::outcome::{ArchiveFault, LoadResult};

/// Scans descriptor-listed archives under the lib prefix of a resource root.
pub struct ArchiveScanner<R: ?Sized> {
    root: Arc<R>,
    lib_prefix: String,
    payload_suffix: String,
    max_entries: u32,
    max_entry_bytes: u64,
}

impl<R: ResourceRoot + ?Sized> ArchiveScanner<R> {
    pub fn new(root: Arc<R>, cfg: &LoaderConfig) -> Self {
        Self {
            root,
            lib_prefix: cfg.lib_prefix.clone(),
            payload_suffix: cfg.payload_suffix.clone(),
            max_entries: cfg.max_entries_per_archive,
            max_entry_bytes: cfg.max_entry_bytes,
        }
    }

    /// Resource path of `archive` inside the root.
    pub fn archive_path(&self, archive: &ArchiveId) -> String {
        format!("{}{}", self.lib_prefix, archive.as_str())
    }

    pub fn scan(&self, archive: &ArchiveId, name: &QualifiedName) -> LoadResult {
        let result = LoadResult::from(self.scan_inner(archive, name));
        match &result {
            LoadResult::Found(bytes) => {
                debug!(%archive, %name, bytes = bytes.len(), "unit extracted from archive");
            }
            LoadResult::NotFound => trace!(%archive, %name, "unit not in archive"),
            LoadResult::Failure(err) => {
                debug!(%archive, %name, error = %err, "archive scan failed");
            }
        }
        result
    }

    fn scan_inner(
        &self,
        archive: &ArchiveId,
        name: &QualifiedName,
    ) -> Result<Option<Vec<u8>>, LoadError> {
        let io_err = |source| LoadError::ArchiveIo {
            archive: archive.clone(),
            source,
        };
        let fault = |fault: ArchiveFault| LoadError::Archive {
            archive: archive.clone(),
            fault,
        };

        let path = self.archive_path(archive);
        let src = self
            .root
            .open_archive(&path)
            .map_err(io_err)?
            .ok_or_else(|| LoadError::ArchiveMissing {
                archive: archive.clone(),
            })?;

        let mut cursor = match ZipCursor::open(src, self.max_entries).map_err(io_err)? {
            ZipOpen::Ready(c) => c,
            ZipOpen::Stop(f) => return Err(fault(f)),
        };

        let suffix = self.payload_suffix.as_str();
        let loc = loop {
            let meta = match cursor.next_entry().map_err(io_err)? {
                ZipNext::End => return Ok(None),
                ZipNext::Stop(f) => return Err(fault(f)),
                ZipNext::Entry(meta) => meta,
            };
            if meta.is_dir || !name.matches_entry(meta.name, suffix) {
                continue;
            }
            // First match wins; later duplicates are never looked at.
            if meta.is_encrypted() {
                return Err(fault(ArchiveFault::EncryptedEntry));
            }
            if !meta.compression_supported() {
                return Err(fault(ArchiveFault::UnsupportedCompression));
            }
            break meta.locator();
        };

        match cursor.read_entry(loc, self.max_entry_bytes).map_err(io_err)? {
            Ok(bytes) => Ok(Some(bytes)),
            Err(f) => Err(fault(f)),
        }
    }
}
