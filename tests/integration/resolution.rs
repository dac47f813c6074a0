//! End-to-end resolution over exploded distributables.
//!
//! Each test builds a fresh tree under a temp dir and wraps the directory root
//! in a `Recording` root so source access order can be asserted.

use std::cell::Cell;
use std::sync::Arc;

use warloader::{
    ArchiveErrorPolicy, ArchiveId, DirRoot, LoadError, LoadResult, LoaderConfig, NoUpstream,
    Origin, QualifiedName, Resolver,
};

use crate::fixtures::{Exploded, FlakyArchiveRoot, Recording, MAGIC};

fn qn(s: &str) -> QualifiedName {
    QualifiedName::parse(s).unwrap()
}

fn archive(s: &str) -> Option<Origin> {
    Some(Origin::Archive(ArchiveId::new(s).unwrap()))
}

#[test]
fn unit_only_in_second_archive_is_found() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar", "y.jar"])
        .jar("x.jar", &[("foo/Other.class", b"other", false)])
        .jar("y.jar", &[("foo/", b"", false), ("foo/Bar.class", &MAGIC, true)]);

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::clone(&root), &LoaderConfig::default())
            .unwrap();

    let res = resolver.resolve_traced(&qn("foo.Bar"));
    assert_eq!(res.result.payload(), Some(&MAGIC[..]));
    assert_eq!(res.origin, archive("y.jar"));
    assert_eq!(root.archives(), ["WEB-INF/lib/x.jar", "WEB-INF/lib/y.jar"]);
}

#[test]
fn archives_after_the_hit_are_never_opened() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["a.jar", "b.jar", "c.jar", "d.jar"])
        .jar("a.jar", &[("x/A.class", b"a", false)])
        .jar("b.jar", &[("x/Hit.class", b"from b", true)])
        .jar("c.jar", &[("x/Hit.class", b"from c", false)])
        .jar("d.jar", &[("x/D.class", b"d", false)]);

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::clone(&root), &LoaderConfig::default())
            .unwrap();
    root.clear();

    let res = resolver.resolve_traced(&qn("x.Hit"));
    assert_eq!(res.result.payload(), Some(&b"from b"[..]));
    assert_eq!(res.archives_scanned, 2);
    assert_eq!(root.archives(), ["WEB-INF/lib/a.jar", "WEB-INF/lib/b.jar"]);
}

#[test]
fn upstream_hit_touches_nothing_else() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar"])
        .jar("x.jar", &[("java/lang/String.class", b"shadow", false)])
        .local("java/lang/String.class", b"local shadow");

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let upstream = |n: &QualifiedName| {
        if n.as_str().starts_with("java.") {
            LoadResult::Found(b"platform".to_vec())
        } else {
            LoadResult::NotFound
        }
    };
    let resolver =
        Resolver::from_descriptor(upstream, Arc::clone(&root), &LoaderConfig::default()).unwrap();
    root.clear();

    let res = resolver.resolve_traced(&qn("java.lang.String"));
    assert_eq!(res.result.payload(), Some(&b"platform"[..]));
    assert_eq!(res.origin, Some(Origin::Upstream));
    assert!(root.reads().is_empty());
    assert!(root.archives().is_empty());
}

#[test]
fn local_tree_is_consulted_before_archives() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar"])
        .jar("x.jar", &[("app/Main.class", b"jar copy", false)])
        .local("app/Main.class", b"local copy");

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::clone(&root), &LoaderConfig::default())
            .unwrap();
    root.clear();

    let res = resolver.resolve_traced(&qn("app/Main"));
    assert_eq!(res.result.payload(), Some(&b"local copy"[..]));
    assert_eq!(res.origin, Some(Origin::Local));
    assert_eq!(root.reads(), ["WEB-INF/classes/app/Main.class"]);
    assert!(root.archives().is_empty());
}

#[test]
fn local_file_named_like_a_package_falls_through_to_archives() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["y.jar"])
        .local("foo", b"plain file")
        .jar("y.jar", &[("foo/Bar.class", &MAGIC, false)]);

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::clone(&root), &LoaderConfig::default())
            .unwrap();

    let res = resolver.resolve_traced(&qn("foo.Bar"));
    assert_eq!(res.result.payload(), Some(&MAGIC[..]));
    assert_eq!(res.origin, archive("y.jar"));
    assert_eq!(res.archives_scanned, 1);
}

#[test]
fn absent_unit_scans_every_archive_in_order() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["c.jar", "a.jar", "b.jar"])
        .jar("a.jar", &[("p/A.class", b"a", false)])
        .jar("b.jar", &[("p/B.class", b"b", true)])
        .jar("c.jar", &[("p/C.txt", b"c", false)]);

    let asked = Cell::new(0u32);
    let upstream = |_: &QualifiedName| {
        asked.set(asked.get() + 1);
        LoadResult::NotFound
    };
    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(upstream, Arc::clone(&root), &LoaderConfig::default()).unwrap();
    root.clear();

    let res = resolver.resolve_traced(&qn("p.C"));
    assert!(res.result.is_not_found());
    assert_eq!(res.origin, None);
    assert_eq!(asked.get(), 1);
    assert_eq!(
        root.archives(),
        ["WEB-INF/lib/c.jar", "WEB-INF/lib/a.jar", "WEB-INF/lib/b.jar"]
    );

    match res.result.into_payload(&qn("p.C")) {
        Err(LoadError::UnitNotFound(n)) => assert_eq!(n.as_str(), "p.C"),
        other => panic!("expected UnitNotFound, got {other:?}"),
    }
}

#[test]
fn round_trip_stored_and_deflated() {
    let stored: Vec<u8> = (0..=255u8).cycle().take(4097).collect();
    let deflated: Vec<u8> = b"repetitive ".iter().copied().cycle().take(70_000).collect();

    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["lib.jar"]).jar(
        "lib.jar",
        &[
            ("a/b/Stored.class", &stored, false),
            ("a/b/Deflated.class", &deflated, true),
            ("a/b/Empty.class", b"", false),
        ],
    );

    let resolver = Resolver::from_descriptor(
        NoUpstream,
        Arc::new(DirRoot::new(tmp.path())),
        &LoaderConfig::default(),
    )
    .unwrap();

    assert_eq!(resolver.resolve(&qn("a.b.Stored")).payload(), Some(&stored[..]));
    assert_eq!(resolver.resolve(&qn("a.b.Deflated")).payload(), Some(&deflated[..]));
    assert_eq!(resolver.resolve(&qn("a.b.Empty")).payload(), Some(&b""[..]));
}

#[test]
fn directories_and_foreign_suffixes_are_never_candidates() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar"]).jar(
        "x.jar",
        &[
            ("a/Thing.class/", b"", false),
            ("a/Thing.java", b"source", false),
            ("a/Thing.classx", b"nope", false),
        ],
    );

    let resolver = Resolver::from_descriptor(
        NoUpstream,
        Arc::new(DirRoot::new(tmp.path())),
        &LoaderConfig::default(),
    )
    .unwrap();
    assert!(resolver.resolve(&qn("a.Thing")).is_not_found());
}

#[test]
fn repeated_calls_return_the_same_bytes() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar"]).jar("x.jar", &[("k/V.class", &MAGIC, true)]);

    let resolver = Resolver::from_descriptor(
        NoUpstream,
        Arc::new(DirRoot::new(tmp.path())),
        &LoaderConfig::default(),
    )
    .unwrap();
    let first = resolver.resolve(&qn("k.V"));
    for _ in 0..3 {
        assert_eq!(resolver.resolve(&qn("k.V")).payload(), first.payload());
    }
}

#[test]
fn read_failure_mid_scan_is_a_failure() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["x.jar"]);
    let bytes = crate::fixtures::zip_bytes(&[
        ("a/A.class", b"a", false),
        ("a/B.class", b"b", false),
        ("a/C.class", b"c", false),
        ("a/D.class", b"d", false),
    ]);

    let root = Arc::new(FlakyArchiveRoot {
        dir: DirRoot::new(tmp.path()),
        flaky_path: "WEB-INF/lib/x.jar".to_string(),
        bytes,
        // Enough for the directory locator and the first entry or two.
        ok_reads: 3,
    });
    let resolver =
        Resolver::from_descriptor(NoUpstream, root, &LoaderConfig::default()).unwrap();

    match resolver.resolve(&qn("a.Missing")) {
        LoadResult::Failure(LoadError::ArchiveIo { archive, source }) => {
            assert_eq!(archive.as_str(), "x.jar");
            assert_eq!(source.to_string(), "device went away");
        }
        other => panic!("expected ArchiveIo failure, got {other:?}"),
    }
}

#[test]
fn failing_archive_aborts_by_default() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["broken.jar", "good.jar"])
        .jar("good.jar", &[("q/Q.class", b"q", false)]);
    std::fs::write(tmp.path().join("WEB-INF/lib/broken.jar"), b"PK\x03\x04 truncated").unwrap();

    let root = Arc::new(Recording::new(DirRoot::new(tmp.path())));
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::clone(&root), &LoaderConfig::default())
            .unwrap();
    root.clear();

    let res = resolver.resolve_traced(&qn("q.Q"));
    assert!(res.result.is_failure());
    assert_eq!(root.archives(), ["WEB-INF/lib/broken.jar"]);
}

#[test]
fn continue_policy_finds_unit_after_failing_archive() {
    let tmp = tempfile::tempdir().unwrap();
    Exploded::new(tmp.path(), &["broken.jar", "good.jar"])
        .jar("good.jar", &[("q/Q.class", b"q", false)]);
    std::fs::write(tmp.path().join("WEB-INF/lib/broken.jar"), b"PK\x03\x04 truncated").unwrap();

    let cfg = LoaderConfig {
        archive_error_policy: ArchiveErrorPolicy::Continue,
        ..LoaderConfig::default()
    };
    let resolver =
        Resolver::from_descriptor(NoUpstream, Arc::new(DirRoot::new(tmp.path())), &cfg).unwrap();

    let res = resolver.resolve_traced(&qn("q.Q"));
    assert_eq!(res.result.payload(), Some(&b"q"[..]));
    assert_eq!(res.origin, archive("good.jar"));

    assert!(matches!(
        resolver.resolve(&qn("q.Nope")),
        LoadResult::Failure(LoadError::Archive { .. })
    ));
}
