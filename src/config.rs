//! Loader layout, policy, and hard limits.
//!
//! # Invariants
//! - Prefixes are relative resource paths ending in `/`.
//! - The payload suffix is non-empty and starts with `.`.
//! - Archives are treated as hostile input: sizes and counts are untrusted and
//!   bounded by the limits below.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the resolver does when one archive scan fails.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveErrorPolicy {
    /// Stop at the first failing archive and report its failure.
    #[default]
    Abort = 0,
    /// Log the failure and keep scanning later archives. The first failure is
    /// reported only if no later archive yields the unit.
    Continue = 1,
}

/// Resolution layout and limits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Root of the unpacked local unit tree.
    pub classes_prefix: String,
    /// Root under which descriptor-listed archives live.
    pub lib_prefix: String,
    /// Startup descriptor location.
    pub manifest_path: String,
    /// Descriptor attribute holding the archive list.
    pub archive_list_key: String,
    /// File extension identifying a loadable unit.
    pub payload_suffix: String,

    pub archive_error_policy: ArchiveErrorPolicy,

    /// Maximum number of entries in one archive.
    pub max_entries_per_archive: u32,
    /// Maximum decompressed size of one extracted unit or plain resource.
    pub max_entry_bytes: u64,
    /// Maximum inflated size of an archive nested in a packed distributable.
    pub max_nested_archive_bytes: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be a relative path ending in `/` (got `{value}`)")]
    BadPrefix { field: &'static str, value: String },
    #[error("payload_suffix must start with `.` and name an extension (got `{0}`)")]
    BadSuffix(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
    #[error("max_entries_per_archive must be > 0")]
    MaxEntriesPerArchiveZero,
    #[error("max_entry_bytes must be > 0")]
    MaxEntryBytesZero,
    #[error("max_nested_archive_bytes must be > 0")]
    MaxNestedArchiveBytesZero,
    #[error("failed to read config `{path}`")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config `{path}`")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            classes_prefix: "WEB-INF/classes/".to_string(),
            lib_prefix: "WEB-INF/lib/".to_string(),
            manifest_path: "META-INF/MANIFEST.MF".to_string(),
            archive_list_key: "X-Jars".to_string(),
            payload_suffix: ".class".to_string(),

            archive_error_policy: ArchiveErrorPolicy::Abort,

            max_entries_per_archive: 65_535,
            max_entry_bytes: 64 * 1024 * 1024,           // 64 MiB
            max_nested_archive_bytes: 256 * 1024 * 1024, // 256 MiB
        }
    }
}

impl LoaderConfig {
    /// Validate cross-field invariants. Call once at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_prefix("classes_prefix", &self.classes_prefix)?;
        check_prefix("lib_prefix", &self.lib_prefix)?;
        if self.manifest_path.is_empty() {
            return Err(ConfigError::Empty("manifest_path"));
        }
        if self.archive_list_key.is_empty() {
            return Err(ConfigError::Empty("archive_list_key"));
        }
        if self.payload_suffix.len() < 2 || !self.payload_suffix.starts_with('.') {
            return Err(ConfigError::BadSuffix(self.payload_suffix.clone()));
        }
        if self.max_entries_per_archive == 0 {
            return Err(ConfigError::MaxEntriesPerArchiveZero);
        }
        if self.max_entry_bytes == 0 {
            return Err(ConfigError::MaxEntryBytesZero);
        }
        if self.max_nested_archive_bytes == 0 {
            return Err(ConfigError::MaxNestedArchiveBytesZero);
        }
        Ok(())
    }

    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = || path.display().to_string();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path_str(),
            source,
        })?;
        let cfg: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path_str(),
            source,
        })?;
        cfg.validate()?;
        Ok(cfg)
    }
}

fn check_prefix(field: &'static str, value: &str) -> Result<(), ConfigError> {
    // An empty prefix means "root of the distributable".
    if value.is_empty() {
        return Ok(());
    }
    if value.starts_with('/') || !value.ends_with('/') {
        return Err(ConfigError::BadPrefix {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}
