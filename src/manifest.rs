//! Startup descriptor parsing.
//!
//! The descriptor is a manifest-style text file (`META-INF/MANIFEST.MF`). Only
//! the main section is read: `Name: value` headers, where a line starting with
//! a single space continues the previous value. The archive list is the
//! whitespace-separated value of the configured key (`X-Jars`).
//!
//! # Invariants
//! - The returned `ArchiveList` preserves descriptor order.
//! - Every `ArchiveId` is relative and never contains a `..` component.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::bundle::ResourceRoot;
use crate::config::LoaderConfig;
use crate::error::ManifestError;

/// One archive bundle, relative to the lib root.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ArchiveId(String);

impl ArchiveId {
    pub fn new(raw: &str) -> Result<Self, ManifestError> {
        let escapes = raw.is_empty()
            || raw.starts_with('/')
            || raw.starts_with('\\')
            || raw.split(['/', '\\']).any(|c| c == "..");
        if escapes {
            return Err(ManifestError::InvalidArchiveId(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, immutable archive sequence built once at startup.
///
/// Cloning is cheap and shares the underlying slice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveList(Arc<[ArchiveId]>);

impl ArchiveList {
    pub fn new(ids: Vec<ArchiveId>) -> Self {
        Self(ids.into())
    }

    /// Build from raw identifiers, validating each one.
    pub fn parse<'a, I>(raw: I) -> Result<Self, ManifestError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let ids = raw
            .into_iter()
            .map(ArchiveId::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(ids))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ArchiveId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Main-section attributes of a manifest, in file order.
#[derive(Debug, Default)]
pub struct MainAttributes {
    entries: Vec<(String, String)>,
}

impl MainAttributes {
    /// Parse the main section. Parsing stops at the first blank line.
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut entries: Vec<(String, String)> = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.is_empty() {
                break;
            }
            if let Some(cont) = line.strip_prefix(' ') {
                match entries.last_mut() {
                    Some((_, value)) => value.push_str(cont),
                    None => {
                        return Err(ManifestError::MalformedLine {
                            line: idx + 1,
                            text: line.to_string(),
                        })
                    }
                }
                continue;
            }
            match line.split_once(": ") {
                Some((key, value)) if !key.is_empty() => {
                    entries.push((key.to_string(), value.to_string()));
                }
                _ => {
                    return Err(ManifestError::MalformedLine {
                        line: idx + 1,
                        text: line.to_string(),
                    })
                }
            }
        }

        Ok(Self { entries })
    }

    /// Value for `key`, compared case-insensitively. The first occurrence wins.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }
}

/// Reads the startup descriptor from a resource root.
pub struct ManifestReader<'a> {
    cfg: &'a LoaderConfig,
}

impl<'a> ManifestReader<'a> {
    pub fn new(cfg: &'a LoaderConfig) -> Self {
        Self { cfg }
    }

    /// Load the ordered archive list. Any error here is a startup failure.
    pub fn read_archive_list<R: ResourceRoot + ?Sized>(
        &self,
        root: &R,
    ) -> Result<ArchiveList, ManifestError> {
        let path = self.cfg.manifest_path.as_str();
        let bytes = root
            .read(path)
            .map_err(|source| ManifestError::Io {
                path: path.to_string(),
                source,
            })?
            .ok_or_else(|| ManifestError::Missing(path.to_string()))?;
        let text = std::str::from_utf8(&bytes).map_err(|_| ManifestError::NotUtf8)?;

        let list = self.archive_list_from_text(text)?;
        debug!(
            descriptor = path,
            key = %self.cfg.archive_list_key,
            archives = list.len(),
            "loaded archive list"
        );
        Ok(list)
    }

    pub fn archive_list_from_text(&self, text: &str) -> Result<ArchiveList, ManifestError> {
        let attrs = MainAttributes::parse(text)?;
        let key = self.cfg.archive_list_key.as_str();
        let value = attrs
            .get(key)
            .ok_or_else(|| ManifestError::MissingKey(key.to_string()))?;
        ArchiveList::parse(value.split_whitespace())
    }
}
