//! The ordered resolution chain.
//!
//! # Order
//! 1) upstream delegate
//! 2) local store
//! 3) archives, in descriptor order
//!
//! # Invariants
//! - The first `Found` wins; no later source is consulted.
//! - `NotFound` always advances to the next source.
//! - `Failure` from the delegate or the local store ends the chain.
//! - `Failure` from an archive ends the chain under `ArchiveErrorPolicy::Abort`;
//!   under `Continue` it is remembered and reported only if no later archive
//!   yields the unit.
//! - No state survives a call except the read-only archive list.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::archive::ArchiveScanner;
use crate::bundle::ResourceRoot;
use crate::config::{ArchiveErrorPolicy, LoaderConfig};
use crate::error::{LoadError, ManifestError};
use crate::local::LocalStore;
use crate::manifest::{ArchiveList, ManifestReader};
use crate::name::QualifiedName;
use crate::outcome::{LoadResult, Origin, Resolution};
use crate::upstream::UpstreamResolver;

pub struct Resolver<U, R: ?Sized> {
    upstream: U,
    local: LocalStore<R>,
    scanner: ArchiveScanner<R>,
    archives: ArchiveList,
    policy: ArchiveErrorPolicy,
}

impl<U, R> Resolver<U, R>
where
    U: UpstreamResolver,
    R: ResourceRoot + ?Sized,
{
    /// Build a resolver over an already-loaded archive list.
    pub fn new(upstream: U, root: Arc<R>, archives: ArchiveList, cfg: &LoaderConfig) -> Self {
        Self {
            upstream,
            local: LocalStore::new(Arc::clone(&root), cfg),
            scanner: ArchiveScanner::new(root, cfg),
            archives,
            policy: cfg.archive_error_policy,
        }
    }

    /// Read the startup descriptor from `root`, then build the resolver.
    ///
    /// Descriptor errors are returned before any resolution can happen.
    pub fn from_descriptor(
        upstream: U,
        root: Arc<R>,
        cfg: &LoaderConfig,
    ) -> Result<Self, ManifestError> {
        let archives = ManifestReader::new(cfg).read_archive_list(&*root)?;
        Ok(Self::new(upstream, root, archives, cfg))
    }

    pub fn archives(&self) -> &ArchiveList {
        &self.archives
    }

    pub fn resolve(&self, name: &QualifiedName) -> LoadResult {
        self.resolve_traced(name).result
    }

    /// Resolve and report which source answered.
    pub fn resolve_traced(&self, name: &QualifiedName) -> Resolution {
        debug!(%name, "resolving unit");

        match self.upstream.resolve(name) {
            LoadResult::NotFound => {
                debug!(%name, "upstream does not know unit, trying local tree");
            }
            result => return finish(result, Origin::Upstream, 0),
        }

        match self.local.lookup(name) {
            LoadResult::NotFound => {
                let archives = self.archives.len();
                debug!(%name, archives, "not in local tree, scanning archives");
            }
            result => return finish(result, Origin::Local, 0),
        }

        let mut scanned = 0usize;
        let mut deferred: Option<LoadError> = None;
        for archive in self.archives.iter() {
            scanned += 1;
            match self.scanner.scan(archive, name) {
                LoadResult::NotFound => continue,
                LoadResult::Found(bytes) => {
                    return finish(
                        LoadResult::Found(bytes),
                        Origin::Archive(archive.clone()),
                        scanned,
                    )
                }
                LoadResult::Failure(err) => match self.policy {
                    ArchiveErrorPolicy::Abort => {
                        debug!(%name, %archive, error = %err, "archive scan failed, aborting");
                        return Resolution {
                            result: LoadResult::Failure(err),
                            origin: None,
                            archives_scanned: scanned,
                        };
                    }
                    ArchiveErrorPolicy::Continue => {
                        warn!(%name, %archive, error = %err, "archive scan failed, continuing");
                        if deferred.is_none() {
                            deferred = Some(err);
                        }
                    }
                },
            }
        }

        let result = match deferred {
            Some(err) => LoadResult::Failure(err),
            None => LoadResult::NotFound,
        };
        debug!(%name, scanned, outcome = result.tag(), "archive scan exhausted");
        Resolution {
            result,
            origin: None,
            archives_scanned: scanned,
        }
    }
}

/// Attach `origin` only to `Found` results.
fn finish(result: LoadResult, origin: Origin, archives_scanned: usize) -> Resolution {
    let origin = result.is_found().then_some(origin);
    Resolution {
        result,
        origin,
        archives_scanned,
    }
}
