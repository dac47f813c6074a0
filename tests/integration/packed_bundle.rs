//! Packed (`.war`) distributables resolve exactly like exploded ones.

use std::fs;
use std::io;
use std::sync::Arc;

use warloader::{
    Distributable, LoadError, LoadResult, LoaderConfig, ManifestError, NoUpstream, QualifiedName,
    Resolver,
};

use crate::fixtures::{manifest, zip_bytes, Exploded, MAGIC};

const NAMES: [&str; 5] = ["foo.Bar", "app.Main", "foo.Only", "lib.Shared", "missing.Unit"];

fn resolve_all(path: &std::path::Path) -> Vec<Option<Vec<u8>>> {
    let root = Distributable::open(path, &LoaderConfig::default()).unwrap();
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::new(root), &LoaderConfig::default()).unwrap();
    NAMES
        .iter()
        .map(|n| match resolver.resolve(&QualifiedName::parse(n).unwrap()) {
            LoadResult::Found(bytes) => Some(bytes),
            LoadResult::NotFound => None,
            LoadResult::Failure(err) => panic!("{n}: unexpected failure: {err}"),
        })
        .collect()
}

#[test]
fn packed_and_exploded_agree() {
    let x_jar = zip_bytes(&[
        ("foo/", b"", false),
        ("foo/Only.class", b"only in x", true),
        ("lib/Shared.class", b"x wins", false),
    ]);
    let y_jar = zip_bytes(&[
        ("foo/Bar.class", &MAGIC, false),
        ("lib/Shared.class", b"y loses", true),
    ]);
    let jars = ["x.jar", "y.jar"];

    let tmp = tempfile::tempdir().unwrap();

    let exploded_dir = tmp.path().join("exploded");
    Exploded::new(&exploded_dir, &jars).local("app/Main.class", b"main");
    fs::write(exploded_dir.join("WEB-INF/lib/x.jar"), &x_jar).unwrap();
    fs::write(exploded_dir.join("WEB-INF/lib/y.jar"), &y_jar).unwrap();

    let manifest_text = manifest(&jars);
    let war_path = tmp.path().join("app.war");
    fs::write(
        &war_path,
        zip_bytes(&[
            ("META-INF/MANIFEST.MF", manifest_text.as_bytes(), true),
            ("WEB-INF/classes/app/Main.class", b"main", true),
            // Nested jars: one stored, one deflated inside the bundle.
            ("WEB-INF/lib/x.jar", &x_jar, false),
            ("WEB-INF/lib/y.jar", &y_jar, true),
        ]),
    )
    .unwrap();

    let cfg = LoaderConfig::default();
    assert_eq!(Distributable::open(&exploded_dir, &cfg).unwrap().kind(), "dir");
    assert_eq!(Distributable::open(&war_path, &cfg).unwrap().kind(), "packed");

    let from_exploded = resolve_all(&exploded_dir);
    let from_packed = resolve_all(&war_path);
    assert_eq!(from_exploded, from_packed);
    assert_eq!(
        from_packed,
        vec![
            Some(MAGIC.to_vec()),
            Some(b"main".to_vec()),
            Some(b"only in x".to_vec()),
            Some(b"x wins".to_vec()),
            None,
        ]
    );
}

#[test]
fn non_zip_file_is_not_a_distributable() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("notes.txt");
    fs::write(&path, "plain text").unwrap();

    let err = Distributable::open(&path, &LoaderConfig::default())
        .err()
        .unwrap();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

fn write_small_war(dir: &std::path::Path) -> std::path::PathBuf {
    let jar = zip_bytes(&[("foo/Bar.class", &MAGIC, false)]);
    let manifest_text = manifest(&["x.jar"]);
    let war_path = dir.join("small.war");
    fs::write(
        &war_path,
        zip_bytes(&[
            ("META-INF/MANIFEST.MF", manifest_text.as_bytes(), false),
            ("WEB-INF/lib/x.jar", &jar, true),
        ]),
    )
    .unwrap();
    war_path
}

#[test]
fn loader_limits_apply_to_the_packed_bundle() {
    let tmp = tempfile::tempdir().unwrap();
    let war_path = write_small_war(tmp.path());

    let one_entry = LoaderConfig {
        max_entries_per_archive: 1,
        ..LoaderConfig::default()
    };
    let root = Distributable::open(&war_path, &one_entry).unwrap();
    match Resolver::from_descriptor(NoUpstream, Arc::new(root), &one_entry) {
        Err(ManifestError::Io { source, .. }) => {
            assert_eq!(source.kind(), io::ErrorKind::InvalidData)
        }
        Err(other) => panic!("expected descriptor I/O error, got {other}"),
        Ok(_) => panic!("bundle entry cap was ignored"),
    }

    let tiny_archives = LoaderConfig {
        max_nested_archive_bytes: 16,
        ..LoaderConfig::default()
    };
    let root = Distributable::open(&war_path, &tiny_archives).unwrap();
    let resolver = Resolver::from_descriptor(NoUpstream, Arc::new(root), &tiny_archives).unwrap();
    match resolver.resolve(&QualifiedName::parse("foo.Bar").unwrap()) {
        LoadResult::Failure(LoadError::ArchiveIo { archive, source }) => {
            assert_eq!(archive.as_str(), "x.jar");
            assert_eq!(source.kind(), io::ErrorKind::InvalidData);
        }
        other => panic!("expected nested archive cap failure, got {other:?}"),
    }
}
