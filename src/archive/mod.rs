//! Archive bundle support.
//!
//! # Scope
//! - `zip`: the container decoder (entry iteration + payload reads).
//! - `scanner`: the per-archive search for one qualified name.
//!
//! # Design Notes
//! - Scans are forward-only and bounded by `LoaderConfig` limits.
//! - Each scan opens its own cursor; nothing is shared between scans.

pub mod scanner;
pub mod zip;

pub use scanner::ArchiveScanner;
pub use zip::{
    is_zip_magic, EntryLocator, LimitedRead, ZipCursor, ZipEntryMeta, ZipEntryReader, ZipNext,
    ZipOpen,
};
