//! Unpacked units under the classes prefix.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::bundle::ResourceRoot;
use crate::config::LoaderConfig;
use crate::error::LoadError;
use crate::name::QualifiedName;
use crate::outcome::LoadResult;

/// Looks units up as `<classes_prefix>a/b/C<payload_suffix>`.
pub struct LocalStore<R: ?Sized> {
    root: Arc<R>,
    classes_prefix: String,
    payload_suffix: String,
}

impl<R: ResourceRoot + ?Sized> LocalStore<R> {
    pub fn new(root: Arc<R>, cfg: &LoaderConfig) -> Self {
        Self {
            root,
            classes_prefix: cfg.classes_prefix.clone(),
            payload_suffix: cfg.payload_suffix.clone(),
        }
    }

    pub fn resource_path(&self, name: &QualifiedName) -> String {
        let mut path = self.classes_prefix.clone();
        path.push_str(&name.to_resource_path(&self.payload_suffix));
        path
    }

    /// Absence is `NotFound`; any other I/O condition is `Failure`.
    pub fn lookup(&self, name: &QualifiedName) -> LoadResult {
        let path = self.resource_path(name);
        match self.root.read(&path) {
            Ok(Some(bytes)) => {
                debug!(%name, path = %path, bytes = bytes.len(), "unit loaded from local tree");
                LoadResult::Found(bytes)
            }
            Ok(None) => {
                trace!(%name, path = %path, "unit not in local tree");
                LoadResult::NotFound
            }
            Err(e) => LoadResult::Failure(LoadError::io(path, e)),
        }
    }
}
