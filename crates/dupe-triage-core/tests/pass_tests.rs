use std::fs;
use std::path::{Path, PathBuf};

use dupe_triage_core::fingerprint::FingerprintCache;
use dupe_triage_core::scanner;
use dupe_triage_core::storage::models::Status;
use dupe_triage_core::{AppConfig, SilentReporter, TriageEngine};
use tempfile::{tempdir, TempDir};

/// Create a temp directory tree with known duplicates.
/// Layout:
///   tree/
///     folder_a/
///       unique_a.txt     ("unique content a")
///       shared.txt       ("shared content xyz")
///     folder_b/
///       unique_b.txt     ("unique content b")
///       shared.txt       ("shared content xyz")  ← duplicate of folder_a/shared.txt
fn create_test_tree(root: &Path) {
    let folder_a = root.join("folder_a");
    let folder_b = root.join("folder_b");
    fs::create_dir_all(&folder_a).unwrap();
    fs::create_dir_all(&folder_b).unwrap();

    fs::write(folder_a.join("unique_a.txt"), "unique content a").unwrap();
    fs::write(folder_b.join("unique_b.txt"), "unique content b").unwrap();

    fs::write(folder_a.join("shared.txt"), "shared content xyz").unwrap();
    fs::write(folder_b.join("shared.txt"), "shared content xyz").unwrap();
}

fn engine_over(tmp: &TempDir) -> (TriageEngine, PathBuf) {
    let tree = fs::canonicalize(tmp.path()).unwrap().join("tree");
    fs::create_dir_all(&tree).unwrap();
    create_test_tree(&tree);

    let config = AppConfig {
        root_paths: vec![tree.to_str().unwrap().to_string()],
        catalog_path: tmp
            .path()
            .join("catalog.db")
            .to_str()
            .unwrap()
            .to_string(),
        fingerprint_cache_path: tmp
            .path()
            .join("fp_cache")
            .to_str()
            .unwrap()
            .to_string(),
        ..AppConfig::default()
    };
    (TriageEngine::new(config).unwrap(), tree)
}

fn record_status(engine: &TriageEngine, path: &Path) -> (Status, Option<i64>) {
    let record = engine
        .catalog()
        .find_by_path(path.to_str().unwrap())
        .unwrap()
        .unwrap();
    (record.status, record.score)
}

#[test]
fn test_full_pass_classifies_duplicates() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    let result = engine.run_pass(&SilentReporter).unwrap();

    assert_eq!(result.files_walked, 4);
    assert_eq!(result.files_classified, 4);
    assert_eq!(result.io_errors, 0);
    assert_eq!(result.persist_errors, 0);
    assert_eq!(result.counts.nuke, 2);
    assert_eq!(result.counts.good, 2);

    // Each shared.txt sees one fingerprint match and one name match.
    let (status, score) = record_status(&engine, &tree.join("folder_a/shared.txt"));
    assert_eq!(status, Status::Nuke);
    assert_eq!(score, Some(1199));

    let (status, score) = record_status(&engine, &tree.join("folder_a/unique_a.txt"));
    assert_eq!(status, Status::Good);
    assert_eq!(score, Some(-1));

    // Directory inventory was recorded.
    let dirs = engine.catalog().list_dirs().unwrap();
    let names: Vec<&str> = dirs.iter().map(|d| d.leaf_name.as_str()).collect();
    assert!(names.contains(&"folder_a"));
    assert!(names.contains(&"folder_b"));
}

#[test]
fn test_pass_is_idempotent() {
    let tmp = tempdir().unwrap();
    let (engine, _tree) = engine_over(&tmp);

    engine.run_pass(&SilentReporter).unwrap();
    let first: Vec<_> = engine
        .catalog()
        .list_files()
        .unwrap()
        .into_iter()
        .map(|r| (r.abs_path, r.status, r.score))
        .collect();

    engine.run_pass(&SilentReporter).unwrap();
    let second: Vec<_> = engine
        .catalog()
        .list_files()
        .unwrap()
        .into_iter()
        .map(|r| (r.abs_path, r.status, r.score))
        .collect();

    assert_eq!(first, second);
}

#[test]
fn test_blessed_files_stay_blessed() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    engine.run_pass(&SilentReporter).unwrap();
    let marked = engine
        .mark_tree(&tree.join("folder_a"), Status::Blessed)
        .unwrap();
    assert_eq!(marked, 2);

    let result = engine.run_pass(&SilentReporter).unwrap();
    assert_eq!(result.counts.blessed, 2);
    assert_eq!(result.counts.nuke, 1);
    assert_eq!(result.counts.good, 1);

    let (status, score) = record_status(&engine, &tree.join("folder_a/shared.txt"));
    assert_eq!(status, Status::Blessed);
    assert_eq!(score, Some(-5000));

    // The unblessed copy still scores against the blessed one.
    let (status, score) = record_status(&engine, &tree.join("folder_b/shared.txt"));
    assert_eq!(status, Status::Nuke);
    assert_eq!(score, Some(1199));
}

#[test]
fn test_cursed_record_escalates_new_copies() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    engine.run_pass(&SilentReporter).unwrap();
    engine
        .set_authoritative_status(&tree.join("folder_b/unique_b.txt"), Status::Cursed)
        .unwrap();

    // A new copy of cursed content, under an unrelated name.
    let folder_c = tree.join("folder_c");
    fs::create_dir_all(&folder_c).unwrap();
    let evil = folder_c.join("evil.bin");
    fs::write(&evil, "unique content b").unwrap();

    let (status, score) = engine.classify_path(&evil, None).unwrap();
    assert_eq!(score, 1998);
    assert_eq!(status, Status::Nuke);
}

#[test]
fn test_size_mismatch_demotes_then_rereviews() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    engine.run_pass(&SilentReporter).unwrap();

    let changed = tree.join("folder_a/unique_a.txt");
    fs::write(&changed, "completely different and much longer content").unwrap();

    // First look: the record no longer describes the file. Demote, never guess.
    let (status, score) = engine.classify_path(&changed, None).unwrap();
    assert_eq!(status, Status::Unknown);
    assert_eq!(score, 0);

    // Second look re-reviews from a fresh fingerprint.
    let (status, score) = engine.classify_path(&changed, None).unwrap();
    assert_eq!(status, Status::Good);
    assert_eq!(score, -1);
}

#[test]
fn test_classify_fresh_file_against_empty_catalog() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    let (status, score) = engine
        .classify_path(&tree.join("folder_a/unique_a.txt"), None)
        .unwrap();
    assert_eq!(status, Status::Good);
    assert_eq!(score, -1);
}

#[test]
fn test_status_hint_is_authoritative() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    let path = tree.join("folder_a/unique_a.txt");
    let (status, score) = engine.classify_path(&path, Some(Status::Blessed)).unwrap();
    assert_eq!(status, Status::Blessed);
    assert_eq!(score, -5000);

    // The assertion sticks for later, hint-free classification.
    let (status, score) = engine.classify_path(&path, None).unwrap();
    assert_eq!(status, Status::Blessed);
    assert_eq!(score, -5000);
}

#[test]
fn test_remove_is_explicit() {
    let tmp = tempdir().unwrap();
    let (engine, tree) = engine_over(&tmp);

    engine.run_pass(&SilentReporter).unwrap();
    let target = tree.join("folder_b/shared.txt");
    let key = target.to_str().unwrap();

    assert!(engine.remove(key).unwrap());
    assert!(engine.catalog().find_by_path(key).unwrap().is_none());
    assert!(!engine.remove(key).unwrap());

    // Vanished-from-disk files keep their records until removed explicitly.
    let kept = tree.join("folder_a/shared.txt");
    fs::remove_file(&kept).unwrap();
    assert!(engine
        .catalog()
        .find_by_path(kept.to_str().unwrap())
        .unwrap()
        .is_some());
    assert!(engine.remove(kept.to_str().unwrap()).unwrap());
}

#[test]
fn test_walker_skips_hidden_empty_and_ignored() {
    let tmp = tempdir().unwrap();
    let root = fs::canonicalize(tmp.path()).unwrap();

    fs::write(root.join("real.txt"), "content").unwrap();
    fs::write(root.join(".hidden.txt"), "content").unwrap();
    fs::write(root.join("empty.txt"), "").unwrap();
    fs::write(root.join("scratch.tmp"), "content").unwrap();
    fs::create_dir_all(root.join("sub")).unwrap();
    fs::write(root.join("sub/nested.txt"), "content").unwrap();
    fs::create_dir_all(root.join(".hiddendir")).unwrap();
    fs::write(root.join(".hiddendir/buried.txt"), "content").unwrap();

    let outcome = scanner::walk_roots(&[root.to_str().unwrap()], &["*.tmp"]).unwrap();

    let names: Vec<&str> = outcome
        .files
        .iter()
        .map(|f| f.abs_path.rsplit('/').next().unwrap())
        .collect();
    assert!(names.contains(&"real.txt"));
    assert!(names.contains(&"nested.txt"));
    assert!(!names.contains(&".hidden.txt"));
    assert!(!names.contains(&"empty.txt"));
    assert!(!names.contains(&"scratch.tmp"));
    assert!(!names.contains(&"buried.txt"));

    let dir_names: Vec<&str> = outcome
        .dirs
        .iter()
        .map(|d| d.rsplit('/').next().unwrap())
        .collect();
    assert!(dir_names.contains(&"sub"));
    assert!(!dir_names.contains(&".hiddendir"));
}

#[test]
fn test_fingerprint_cache_round_trip() {
    let tmp = tempdir().unwrap();
    let cache =
        FingerprintCache::open(tmp.path().join("cache").to_str().unwrap()).unwrap();

    assert_eq!(cache.lookup("/a/x.txt"), None);
    cache.store("/a/x.txt", "aaaa000000000000000000000000000000000001");
    assert_eq!(
        cache.lookup("/a/x.txt").as_deref(),
        Some("aaaa000000000000000000000000000000000001")
    );
    assert_eq!(cache.count(), 1);

    cache.invalidate("/a/x.txt");
    assert_eq!(cache.lookup("/a/x.txt"), None);

    cache.store("/a/x.txt", "bbbb000000000000000000000000000000000002");
    cache.store("/a/y.txt", "bbbb000000000000000000000000000000000002");
    assert_eq!(cache.count(), 2);
    cache.clear().unwrap();
    assert_eq!(cache.count(), 0);
}
