//! Error types for resolution and startup.
//!
//! `LoadError` is the payload of `LoadResult::Failure` and of the "unit not
//! found" condition surfaced by `LoadResult::into_payload`. `ManifestError`
//! covers the startup descriptor and is always fatal before any resolution.

use std::io;

use thiserror::Error;

use crate::manifest::ArchiveId;
use crate::name::QualifiedName;
use crate::outcome::ArchiveFault;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("I/O error reading `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("archive `{archive}` is listed in the descriptor but missing from the bundle")]
    ArchiveMissing { archive: ArchiveId },

    #[error("archive `{archive}`: {fault}")]
    Archive {
        archive: ArchiveId,
        fault: ArchiveFault,
    },

    #[error("I/O error scanning archive `{archive}`")]
    ArchiveIo {
        archive: ArchiveId,
        #[source]
        source: io::Error,
    },

    #[error("upstream resolver failed for `{name}`: {reason}")]
    Upstream { name: QualifiedName, reason: String },

    #[error("unit `{0}` not found upstream, locally, or in any archive")]
    UnitNotFound(QualifiedName),
}

impl LoadError {
    pub(crate) fn io(path: impl Into<String>, source: io::Error) -> Self {
        LoadError::Io {
            path: path.into(),
            source,
        }
    }
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("startup descriptor `{0}` not found")]
    Missing(String),

    #[error("I/O error reading startup descriptor `{path}`")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("startup descriptor is not valid UTF-8")]
    NotUtf8,

    #[error("malformed descriptor line {line}: `{text}`")]
    MalformedLine { line: usize, text: String },

    #[error("descriptor has no `{0}` attribute")]
    MissingKey(String),

    #[error("archive identifier `{0}` escapes the lib root")]
    InvalidArchiveId(String),
}
