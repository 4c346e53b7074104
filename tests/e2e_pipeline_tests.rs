use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tempfile::tempdir;

use file_inventory::config::{normalize, RawConfig, RawRoot};
use file_inventory::extract::StageKind;
use file_inventory::{AppConfig, Error, ForceFlags, InventoryEngine, SilentReporter};

fn config_for(roots: &[&PathBuf], exclude: &[&str], store: &Path) -> AppConfig {
    let raw = RawConfig {
        roots: roots
            .iter()
            .map(|root| RawRoot {
                path: root.to_string_lossy().into_owned(),
                enabled: true,
                exclude: vec![],
            })
            .collect(),
        exclude: exclude.iter().map(|p| p.to_string()).collect(),
        store_path: Some(store.to_string_lossy().into_owned()),
        workers: Some(2),
    };
    normalize(raw).unwrap()
}

/// Layout:
///   root/
///     a.txt              ("hello")
///     b.txt              ("hello")   ← duplicate of a.txt
///     empty_1.dat        (0 bytes)
///     empty_2.dat        (0 bytes)   ← empty, never reported
///     nested/
///       c.txt            ("other content")
///       cover.jpg        (not really a jpeg)
///     @eaDir/            ← pruned when excluded
///       thumb.txt        ("hello")
fn create_test_tree(root: &Path) {
    fs::create_dir_all(root.join("nested")).unwrap();
    fs::create_dir_all(root.join("@eaDir")).unwrap();
    fs::write(root.join("a.txt"), "hello").unwrap();
    fs::write(root.join("b.txt"), "hello").unwrap();
    fs::write(root.join("empty_1.dat"), "").unwrap();
    fs::write(root.join("empty_2.dat"), "").unwrap();
    fs::write(root.join("nested/c.txt"), "other content").unwrap();
    fs::write(root.join("nested/cover.jpg"), "not a jpeg").unwrap();
    fs::write(root.join("@eaDir/thumb.txt"), "hello").unwrap();
}

#[test]
fn test_two_identical_files_share_hash_and_group() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("a.txt"), "12345").unwrap();
    fs::write(root.join("b.txt"), "12345").unwrap();
    let store = tmp.path().join("inventory.json");

    let engine = InventoryEngine::new(config_for(&[&root], &[], &store));
    let first = engine.run(&SilentReporter).unwrap();

    assert_eq!(first.records.len(), 2);
    let hash_a = first.records[0].content_hash.clone().unwrap();
    let hash_b = first.records[1].content_hash.clone().unwrap();
    assert_eq!(hash_a, hash_b);

    let group = first.duplicates.get(&hash_a).unwrap();
    assert_eq!(group.paths, vec![root.join("a.txt"), root.join("b.txt")]);
    assert_eq!(first.extraction_stats.get(StageKind::Hash).succeeded, 2);

    // Second run with nothing changed reuses both hashes
    let second = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(second.scan_stats.unchanged, 2);
    assert_eq!(second.extraction_stats.get(StageKind::Hash).pending, 0);
    assert_eq!(second.records, first.records);
    assert_eq!(second.duplicates, first.duplicates);
}

#[test]
fn test_full_pipeline() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("scan_root");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    let engine = InventoryEngine::new(config_for(&[&root], &["^@eaDir$"], &store));
    let outcome = engine.run(&SilentReporter).unwrap();

    let names: Vec<_> = outcome
        .records
        .iter()
        .map(|r| r.relative_name.as_str())
        .collect();
    assert_eq!(
        names,
        vec![
            "a.txt",
            "b.txt",
            "empty_1.dat",
            "empty_2.dat",
            "nested/c.txt",
            "nested/cover.jpg"
        ]
    );
    assert!(outcome.records.iter().all(|r| r.content_hash.is_some()));
    assert_eq!(outcome.scan_stats.pruned_directories, 1);
    assert_eq!(outcome.scan_stats.new, 6);

    // Only a.txt/b.txt are reported; the empty files share a hash but are skipped
    assert_eq!(outcome.duplicates.groups.len(), 1);
    assert_eq!(
        outcome.duplicates.groups[0].paths,
        vec![root.join("a.txt"), root.join("b.txt")]
    );

    // The fake jpeg fails metadata extraction without failing the run
    let image = outcome.extraction_stats.get(StageKind::ImageMetadata);
    assert_eq!(image.pending, 1);
    assert_eq!(image.failed, 1);
    assert!(outcome.records[5].image_metadata.is_none());

    assert!(store.exists());
}

#[test]
fn test_second_run_is_idempotent() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("idem");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    let first_bytes = fs::read(&store).unwrap();

    let second = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    let second_bytes = fs::read(&store).unwrap();

    assert_eq!(first_bytes, second_bytes);
    assert_eq!(second.scan_stats.new + second.scan_stats.changed, 0);
    for kind in [StageKind::Hash, StageKind::AudioTags, StageKind::ImageMetadata] {
        assert_eq!(second.extraction_stats.get(kind).pending, 0, "{} stage", kind);
    }
    assert!(second.stale.is_empty());
}

#[test]
fn test_unreadable_metadata_is_not_reparsed() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("media");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("cover.jpg"), "not a jpeg").unwrap();
    fs::write(root.join("song.mp3"), "not an mpeg stream").unwrap();
    let store = tmp.path().join("inventory.json");

    let first = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(first.extraction_stats.get(StageKind::AudioTags).failed, 1);
    assert_eq!(first.extraction_stats.get(StageKind::ImageMetadata).failed, 1);
    assert!(first.records.iter().all(|r| r.audio_tags.is_none() && r.image_metadata.is_none()));

    let second = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(second.extraction_stats.get(StageKind::AudioTags).pending, 0);
    assert_eq!(second.extraction_stats.get(StageKind::ImageMetadata).pending, 0);

    // A content change clears the markers and the file is tried again
    fs::write(root.join("cover.jpg"), "still not a jpeg").unwrap();
    let third = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(third.extraction_stats.get(StageKind::ImageMetadata).pending, 1);
    assert_eq!(third.extraction_stats.get(StageKind::AudioTags).pending, 0);

    let forced = InventoryEngine::new(config_for(&[&root], &[], &store))
        .with_force(ForceFlags {
            audio_tags: true,
            ..Default::default()
        })
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(forced.extraction_stats.get(StageKind::AudioTags).pending, 1);
}

#[cfg(unix)]
#[test]
fn test_non_utf8_names_keep_separate_records() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let tmp = tempdir().unwrap();
    let root = tmp.path().join("bytes");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(OsStr::from_bytes(b"a\xfe")), "first").unwrap();
    fs::write(root.join(OsStr::from_bytes(b"a\xff")), "second").unwrap();
    let store = tmp.path().join("inventory.json");

    let first = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    let names: Vec<_> = first.records.iter().map(|r| r.relative_name.as_str()).collect();
    assert_eq!(names, vec!["a\\xfe", "a\\xff"]);
    assert!(first.records.iter().all(|r| r.content_hash.is_some()));
    assert_eq!(first.extraction_stats.get(StageKind::Hash).failed, 0);
    assert_eq!(
        first.records[1].full_path(),
        root.join(OsStr::from_bytes(b"a\xff"))
    );

    let second = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(second.scan_stats.unchanged, 2);
    assert_eq!(second.records, first.records);
}

#[test]
fn test_changed_and_removed_files() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("changes");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    let first = InventoryEngine::new(config_for(&[&root], &["^@eaDir$"], &store))
        .run(&SilentReporter)
        .unwrap();
    assert_eq!(first.duplicates.groups.len(), 1);

    fs::write(root.join("b.txt"), "hello, changed").unwrap();
    fs::remove_file(root.join("nested/c.txt")).unwrap();

    let second = InventoryEngine::new(config_for(&[&root], &["^@eaDir$"], &store))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(second.scan_stats.changed, 1);
    assert_eq!(second.extraction_stats.get(StageKind::Hash).pending, 1);
    assert_eq!(second.stale.len(), 1);
    assert_eq!(second.stale[0].relative_name, "nested/c.txt");
    assert!(second.duplicates.groups.is_empty());

    let stored = file_inventory::store::InventoryStore::new(&store).load().unwrap();
    assert_eq!(stored.len(), second.records.len());
    assert!(stored.values().all(|r| r.relative_name != "nested/c.txt"));
}

#[test]
fn test_force_hash_rehashes_everything() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("force");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    let first = InventoryEngine::new(config_for(&[&root], &[], &store))
        .run(&SilentReporter)
        .unwrap();

    let forced = InventoryEngine::new(config_for(&[&root], &[], &store))
        .with_force(ForceFlags {
            hash: true,
            ..Default::default()
        })
        .run(&SilentReporter)
        .unwrap();

    let hash = forced.extraction_stats.get(StageKind::Hash);
    assert_eq!(hash.pending, first.records.len());
    assert_eq!(forced.records, first.records);
}

#[test]
fn test_multiple_roots_keep_config_order() {
    let tmp = tempdir().unwrap();
    let music = tmp.path().join("zz_music");
    let photos = tmp.path().join("aa_photos");
    fs::create_dir_all(&music).unwrap();
    fs::create_dir_all(&photos).unwrap();
    fs::write(music.join("copy.bin"), "same bytes").unwrap();
    fs::write(photos.join("copy.bin"), "same bytes").unwrap();
    let store = tmp.path().join("inventory.json");

    let outcome = InventoryEngine::new(config_for(&[&music, &photos], &[], &store))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(outcome.records[0].root_dir, music);
    assert_eq!(outcome.records[1].root_dir, photos);
    assert_eq!(
        outcome.duplicates.groups[0].paths,
        vec![music.join("copy.bin"), photos.join("copy.bin")]
    );
}

#[test]
fn test_walk_failure_aborts_without_persisting() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("present");
    create_test_tree(&root);
    let missing = tmp.path().join("missing");
    let store = tmp.path().join("inventory.json");

    let result = InventoryEngine::new(config_for(&[&root, &missing], &[], &store))
        .run(&SilentReporter);

    assert!(matches!(result, Err(Error::Walk { .. })));
    assert!(!store.exists());
}

#[test]
fn test_malformed_store_aborts_and_is_left_alone() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("root");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");
    fs::write(&store, "[ this is not an inventory").unwrap();

    let result = InventoryEngine::new(config_for(&[&root], &[], &store)).run(&SilentReporter);

    assert!(matches!(result, Err(Error::StoreUnavailable { .. })));
    assert_eq!(fs::read_to_string(&store).unwrap(), "[ this is not an inventory");
}

#[test]
fn test_cancelled_run_is_not_persisted() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("cancel");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    let engine = InventoryEngine::new(config_for(&[&root], &[], &store));
    engine.cancel_token().store(true, Ordering::Relaxed);

    assert!(matches!(engine.run(&SilentReporter), Err(Error::Cancelled)));
    assert!(!store.exists());
}

#[test]
fn test_disabled_root_is_not_scanned() {
    let tmp = tempdir().unwrap();
    let root = tmp.path().join("off");
    create_test_tree(&root);
    let store = tmp.path().join("inventory.json");

    let mut config = config_for(&[&root], &[], &store);
    config.roots[0].enabled = false;
    let outcome = InventoryEngine::new(config).run(&SilentReporter).unwrap();
    assert!(outcome.records.is_empty());
}
