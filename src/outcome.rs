//! Resolution outcomes.
//!
//! # Invariants
//! - `NotFound` is the only benign signal; it drives fallback to the next
//!   source and is never reported as an error.
//! - `Failure` always carries its cause and terminates the chain (subject to
//!   `ArchiveErrorPolicy` for archive scans).
//! - `ArchiveFault` is `#[repr(u8)]` with stable discriminants and stable
//!   `name()` strings; new variants must be appended.

use core::fmt;

use crate::error::LoadError;
use crate::manifest::ArchiveId;
use crate::name::QualifiedName;

/// Result of asking one source (or the whole chain) for a unit.
#[derive(Debug)]
pub enum LoadResult {
    Found(Vec<u8>),
    NotFound,
    Failure(LoadError),
}

impl LoadResult {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, LoadResult::Found(_))
    }

    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadResult::NotFound)
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, LoadResult::Failure(_))
    }

    /// Stable tag name, used in logs and the CLI summary line.
    pub const fn tag(&self) -> &'static str {
        match self {
            LoadResult::Found(_) => "found",
            LoadResult::NotFound => "not_found",
            LoadResult::Failure(_) => "failure",
        }
    }

    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            LoadResult::Found(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Collapse into a `Result`, turning `NotFound` into the distinct
    /// `LoadError::UnitNotFound` condition for `name`.
    pub fn into_payload(self, name: &QualifiedName) -> Result<Vec<u8>, LoadError> {
        match self {
            LoadResult::Found(bytes) => Ok(bytes),
            LoadResult::NotFound => Err(LoadError::UnitNotFound(name.clone())),
            LoadResult::Failure(err) => Err(err),
        }
    }
}

impl From<Result<Option<Vec<u8>>, LoadError>> for LoadResult {
    fn from(value: Result<Option<Vec<u8>>, LoadError>) -> Self {
        match value {
            Ok(Some(bytes)) => LoadResult::Found(bytes),
            Ok(None) => LoadResult::NotFound,
            Err(err) => LoadResult::Failure(err),
        }
    }
}

/// Which source produced a `Found` result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Origin {
    Upstream,
    Local,
    Archive(ArchiveId),
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Upstream => f.write_str("upstream"),
            Origin::Local => f.write_str("local"),
            Origin::Archive(id) => write!(f, "archive:{id}"),
        }
    }
}

/// A chain result plus the bookkeeping gathered while producing it.
#[derive(Debug)]
pub struct Resolution {
    pub result: LoadResult,
    /// Set only when `result` is `Found`.
    pub origin: Option<Origin>,
    /// Archives opened for this request, in scan order.
    pub archives_scanned: usize,
}

/// Why an archive scan could not complete.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArchiveFault {
    /// Container structure is malformed (bad signature, bounds, truncation).
    MalformedZip = 0,
    /// Zip64 or multi-disk container.
    UnsupportedFeature = 1,
    /// Matching entry is encrypted.
    EncryptedEntry = 2,
    /// Matching entry uses a compression method other than stored/deflate.
    UnsupportedCompression = 3,
    /// Decompressed payload disagrees with the declared size or CRC-32.
    CorruptPayload = 4,
    /// Archive holds more entries than `max_entries_per_archive`.
    EntryCountExceeded = 5,
    /// Matching entry is larger than `max_entry_bytes`.
    EntryTooLarge = 6,
}

impl ArchiveFault {
    pub const fn name(self) -> &'static str {
        match self {
            Self::MalformedZip => "malformed_zip",
            Self::UnsupportedFeature => "unsupported_feature",
            Self::EncryptedEntry => "encrypted_entry",
            Self::UnsupportedCompression => "unsupported_compression",
            Self::CorruptPayload => "corrupt_payload",
            Self::EntryCountExceeded => "entry_count_exceeded",
            Self::EntryTooLarge => "entry_too_large",
        }
    }
}

impl fmt::Display for ArchiveFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
