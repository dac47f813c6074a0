//! Bytecode unit resolution for web-application distributables.
//!
//! ## Scope
//! Given a qualified unit name (`foo.Bar`), find its raw bytes by asking, in
//! fixed order:
//! 1) an injected upstream delegate;
//! 2) the local unit tree (`WEB-INF/classes/`);
//! 3) each archive listed in the startup descriptor (`META-INF/MANIFEST.MF`,
//!    key `X-Jars`), scanned under `WEB-INF/lib/` in listed order.
//!
//! ## Key invariants
//! - The first `Found` ends the chain; later sources are never touched.
//! - `NotFound` is the only signal that advances the chain.
//! - Archive contents are untrusted: sizes, counts, and offsets are bounded
//!   by `LoaderConfig` limits and verified against the container.
//!
//! ## Notable entry points
//! - `Resolver`: the orchestrator (`resolve`, `resolve_traced`).
//! - `Distributable`, `DirRoot`, `PackedRoot`: the resource namespaces.
//! - `ManifestReader` / `ArchiveList`: the startup archive order.
//! - `ZipCursor`: the forward-only zip32 decoder behind archive scans.

pub mod archive;
pub mod bundle;
pub mod config;
pub mod error;
pub mod local;
pub mod manifest;
pub mod name;
pub mod outcome;
pub mod resolver;
pub mod sim_archive;
pub mod upstream;

pub use archive::ArchiveScanner;
pub use bundle::{DirRoot, Distributable, PackedRoot, ResourceRoot, ZipSource};
pub use config::{ArchiveErrorPolicy, ConfigError, LoaderConfig};
pub use error::{LoadError, ManifestError};
pub use local::LocalStore;
pub use manifest::{ArchiveId, ArchiveList, ManifestReader};
pub use name::{NameError, QualifiedName};
pub use outcome::{ArchiveFault, LoadResult, Origin, Resolution};
pub use resolver::Resolver;
pub use upstream::{NoUpstream, SearchPathUpstream, UpstreamResolver};
