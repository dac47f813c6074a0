//! Qualified unit names.
//!
//! A `QualifiedName` names one loadable unit (`a.b.C`). The same value is used
//! as the lookup key for every source in the resolution chain: it becomes a
//! resource path for the local store and is compared against normalized
//! archive entry names.

use std::fmt;

/// Separator between segments in the canonical (dotted) form.
pub const NAME_SEPARATOR: char = '.';
/// Separator used in resource paths and archive entry names.
pub const PATH_SEPARATOR: char = '/';

/// Reasons a string is not a valid qualified name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("qualified name is empty")]
    Empty,
    #[error("qualified name `{0}` has an empty segment")]
    EmptySegment(String),
}

/// An immutable, dotted unit name.
///
/// # Invariants
/// - At least one segment; no segment is empty.
/// - Stored in dotted form regardless of the separator used at construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifiedName(String);

impl QualifiedName {
    /// Parse a dot- or slash-separated name.
    pub fn parse(raw: &str) -> Result<Self, NameError> {
        if raw.is_empty() {
            return Err(NameError::Empty);
        }
        let dotted = raw.replace(PATH_SEPARATOR, ".");
        if dotted.split(NAME_SEPARATOR).any(str::is_empty) {
            return Err(NameError::EmptySegment(raw.to_string()));
        }
        Ok(Self(dotted))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.split(NAME_SEPARATOR)
    }

    /// Resource path for this name: `a/b/C` + `suffix`.
    pub fn to_resource_path(&self, suffix: &str) -> String {
        let mut path = String::with_capacity(self.0.len() + suffix.len());
        for (i, seg) in self.segments().enumerate() {
            if i > 0 {
                path.push(PATH_SEPARATOR);
            }
            path.push_str(seg);
        }
        path.push_str(suffix);
        path
    }

    /// True if the raw archive entry name `a/b/C<suffix>` names this unit.
    ///
    /// Compares segment by segment, so no normalized string is allocated per
    /// entry during a scan.
    pub fn matches_entry(&self, entry_name: &[u8], suffix: &str) -> bool {
        match normalized_entry_stem(entry_name, suffix) {
            Some(stem) => {
                stem.len() == self.0.len()
                    && stem
                        .iter()
                        .zip(self.0.as_bytes())
                        .all(|(&e, &n)| e == n || (e == b'/' && n == b'.'))
            }
            None => false,
        }
    }
}

/// Entry name with `suffix` removed, or `None` when the entry does not carry
/// the payload suffix.
fn normalized_entry_stem<'a>(entry_name: &'a [u8], suffix: &str) -> Option<&'a [u8]> {
    entry_name.strip_suffix(suffix.as_bytes())
}

/// Normalize a raw archive entry name into dotted form.
///
/// Returns `None` for names without the payload suffix or with bytes that are
/// not UTF-8.
pub fn entry_to_dotted(entry_name: &[u8], suffix: &str) -> Option<String> {
    let stem = normalized_entry_stem(entry_name, suffix)?;
    let stem = std::str::from_utf8(stem).ok()?;
    Some(stem.replace(PATH_SEPARATOR, "."))
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for QualifiedName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
