//! warloader CLI
//!
//! Resolves one qualified unit name against a distributable and writes the
//! raw payload bytes.
//!
//! # Output Format
//!
//! The payload goes to stdout (or `--out`). A summary line goes to stderr:
//! `name=<name> origin=<origin> bytes=<len>`
//!
//! # Exit Codes
//!
//! - `0`: unit found
//! - `1`: unit not found, resolution failure, or startup error

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use warloader::{
    ArchiveErrorPolicy, Distributable, LoadResult, LoaderConfig, QualifiedName, Resolver,
    SearchPathUpstream,
};

#[derive(Parser, Debug)]
#[command(name = "warloader", version, about = "Resolve a bytecode unit from a distributable")]
struct Args {
    /// Exploded directory or packed zip distributable.
    root: PathBuf,

    /// Qualified unit name (`foo.Bar` or `foo/Bar`).
    name: String,

    /// Upstream search directory, tried before the distributable. Repeatable.
    #[arg(long = "classpath", value_name = "DIR")]
    classpath: Vec<PathBuf>,

    /// Keep scanning later archives after one fails.
    #[arg(long)]
    continue_on_error: bool,

    /// JSON loader configuration.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the payload here instead of stdout.
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<LoaderConfig> {
    let mut cfg = match &args.config {
        Some(path) => LoaderConfig::from_json_file(path)?,
        None => LoaderConfig::default(),
    };
    if args.continue_on_error {
        cfg.archive_error_policy = ArchiveErrorPolicy::Continue;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn run(args: Args) -> Result<()> {
    let cfg = load_config(&args)?;
    let name = QualifiedName::parse(&args.name)
        .with_context(|| format!("invalid unit name `{}`", args.name))?;

    let root = Distributable::open(&args.root, &cfg)
        .with_context(|| format!("cannot open distributable `{}`", args.root.display()))?;
    tracing::debug!(root = %args.root.display(), kind = root.kind(), "opened distributable");

    let upstream = SearchPathUpstream::new(args.classpath.clone(), cfg.payload_suffix.clone());
    let resolver = Resolver::from_descriptor(upstream, Arc::new(root), &cfg)
        .context("failed to read startup descriptor")?;

    let resolution = resolver.resolve_traced(&name);
    let origin = resolution.origin.clone();
    let bytes = match resolution.result {
        LoadResult::Found(bytes) => bytes,
        LoadResult::NotFound => bail!("unit not found: {name}"),
        LoadResult::Failure(err) => {
            return Err(anyhow::Error::new(err).context(format!("failed to resolve `{name}`")))
        }
    };

    match &args.out {
        Some(path) => fs::write(path, &bytes)
            .with_context(|| format!("cannot write `{}`", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }

    let origin = origin.map(|o| o.to_string()).unwrap_or_default();
    eprintln!("name={name} origin={origin} bytes={}", bytes.len());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    run(args)
}
