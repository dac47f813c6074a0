//! Upstream delegate: the first source the resolver asks.
//!
//! The delegate is an injected capability rather than a base type, so the
//! chain does not depend on any particular host loader.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::LoadError;
use crate::name::QualifiedName;
use crate::outcome::LoadResult;

pub trait UpstreamResolver {
    fn resolve(&self, name: &QualifiedName) -> LoadResult;
}

impl<F> UpstreamResolver for F
where
    F: Fn(&QualifiedName) -> LoadResult,
{
    fn resolve(&self, name: &QualifiedName) -> LoadResult {
        self(name)
    }
}

/// Delegate that never knows anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoUpstream;

impl UpstreamResolver for NoUpstream {
    fn resolve(&self, _name: &QualifiedName) -> LoadResult {
        LoadResult::NotFound
    }
}

/// Host search path: directories tried in order for `a/b/C<suffix>`.
#[derive(Clone, Debug)]
pub struct SearchPathUpstream {
    roots: Vec<PathBuf>,
    suffix: String,
}

impl SearchPathUpstream {
    pub fn new(roots: Vec<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            roots,
            suffix: suffix.into(),
        }
    }
}

impl UpstreamResolver for SearchPathUpstream {
    fn resolve(&self, name: &QualifiedName) -> LoadResult {
        let rel = name.to_resource_path(&self.suffix);
        for root in &self.roots {
            let candidate = rel.split('/').fold(root.clone(), |acc, seg| acc.join(seg));
            if !candidate.parent().is_some_and(Path::is_dir) {
                trace!(%name, root = %root.display(), "no package directory on search path entry");
                continue;
            }
            match fs::read(&candidate) {
                Ok(bytes) => return LoadResult::Found(bytes),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    trace!(%name, root = %root.display(), "not on search path entry");
                }
                Err(e) => {
                    return LoadResult::Failure(LoadError::io(
                        candidate.display().to_string(),
                        e,
                    ))
                }
            }
        }
        LoadResult::NotFound
    }
}
