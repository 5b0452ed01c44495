//! End-to-end tests for the backup engine
//!
//! Each test builds a small source tree in a temporary directory, runs the
//! engine with a non-interactive gate, and checks the resulting mirror,
//! store, and statistics.

use anyhow::Result;
use casbak::{AutoGate, BackupConfig, BackupEngine, HashAlgorithm, RunStats};
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use walkdir::WalkDir;

/// SHA-256 of "hello", the content used by most fixtures
const HELLO_SHA256: &str = "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824";

/// SHA-256 of the empty input
const EMPTY_SHA256: &str = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855";

fn setup() -> (TempDir, BackupConfig) {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("src")).unwrap();

    let mut config = BackupConfig::new(
        temp.path().join("src"),
        temp.path().join("backup"),
        temp.path().join("data"),
        HashAlgorithm::Sha256,
    );
    config.auto_create_dirs = true;
    (temp, config)
}

fn write_source_file(temp: &TempDir, rel: &str, content: &[u8]) -> Result<()> {
    let path = temp.path().join("src").join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

fn run_backup(config: &BackupConfig) -> Result<RunStats> {
    let mut engine = BackupEngine::with_gate(config.clone(), Box::new(AutoGate::accept()))?;
    Ok(engine.run()?)
}

/// Count the objects stored under a data root, at any shard depth
fn count_objects(data_root: &Path) -> usize {
    WalkDir::new(data_root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}

#[test]
fn test_two_identical_files_share_one_object() -> Result<()> {
    // The canonical scenario: two "hello" files, SHA-256, one shard level
    let (temp, mut config) = setup();
    config.shard_depth = 1;
    write_source_file(&temp, "a.txt", b"hello")?;
    write_source_file(&temp, "sub/b.txt", b"hello")?;

    let stats = run_backup(&config)?;

    assert_eq!(stats.files_total, 2);
    assert_eq!(stats.files_new, 1);
    assert_eq!(stats.files_old, 1);
    assert_eq!(stats.directories_total, 1);
    assert_eq!(stats.bytes_stored, 5);

    // Exactly one object, sharded under the first two digest characters
    let object = temp
        .path()
        .join("data")
        .join(&HELLO_SHA256[..2])
        .join(&HELLO_SHA256[2..]);
    assert!(object.is_file());
    assert_eq!(count_objects(&temp.path().join("data")), 1);

    // Two mirror entries, structure matching the source
    assert_eq!(fs::read(temp.path().join("backup/a.txt"))?, b"hello");
    assert_eq!(fs::read(temp.path().join("backup/sub/b.txt"))?, b"hello");
    Ok(())
}

#[test]
fn test_second_run_reuses_stored_content() -> Result<()> {
    let (temp, mut config) = setup();
    config.shard_depth = 1;
    write_source_file(&temp, "a.txt", b"hello")?;
    write_source_file(&temp, "sub/b.txt", b"world")?;

    let first = run_backup(&config)?;
    assert_eq!(first.files_new, 2);

    // Re-running over an unchanged source copies nothing
    config.ignore_already_exists = true;
    let second = run_backup(&config)?;
    assert_eq!(second.files_total, 2);
    assert_eq!(second.files_new, 0);
    assert_eq!(second.files_old, 2);
    assert_eq!(second.bytes_stored, 0);
    assert_eq!(second.directories_total, 1);

    assert_eq!(count_objects(&temp.path().join("data")), 2);
    assert_eq!(fs::read(temp.path().join("backup/a.txt"))?, b"hello");
    assert_eq!(fs::read(temp.path().join("backup/sub/b.txt"))?, b"world");
    Ok(())
}

#[test]
fn test_strict_rerun_still_processes_files() -> Result<()> {
    // Without the ignore-existing policy a second run logs directory
    // failures, but the traversal continues and files are still reused
    let (temp, config) = setup();
    write_source_file(&temp, "sub/a.txt", b"hello")?;

    run_backup(&config)?;
    let second = run_backup(&config)?;

    assert_eq!(second.directories_total, 0); // creations failed, not counted
    assert_eq!(second.files_total, 1);
    assert_eq!(second.files_old, 1);
    Ok(())
}

#[test]
fn test_modified_file_is_stored_again() -> Result<()> {
    let (temp, mut config) = setup();
    config.ignore_already_exists = true;
    write_source_file(&temp, "a.txt", b"first version")?;
    run_backup(&config)?;

    write_source_file(&temp, "a.txt", b"second version")?;
    let second = run_backup(&config)?;

    assert_eq!(second.files_new, 1);
    assert_eq!(second.files_old, 0);
    // The first object is never pruned; the run is incremental, not a sync
    assert_eq!(count_objects(&temp.path().join("data")), 2);
    assert_eq!(fs::read(temp.path().join("backup/a.txt"))?, b"second version");
    Ok(())
}

#[test]
fn test_deduplication_across_directories() -> Result<()> {
    let (temp, mut config) = setup();
    config.shard_depth = 2;
    write_source_file(&temp, "one/report.txt", b"hello")?;
    write_source_file(&temp, "two/copy.txt", b"hello")?;
    write_source_file(&temp, "two/deep/again.txt", b"hello")?;

    let stats = run_backup(&config)?;

    assert_eq!(stats.files_new, 1);
    assert_eq!(stats.files_old, 2);
    assert_eq!(count_objects(&temp.path().join("data")), 1);

    for rel in ["one/report.txt", "two/copy.txt", "two/deep/again.txt"] {
        assert_eq!(fs::read(temp.path().join("backup").join(rel))?, b"hello");
    }
    Ok(())
}

#[test]
fn test_unsharded_store_uses_full_digest_name() -> Result<()> {
    let (temp, config) = setup();
    write_source_file(&temp, "a.txt", b"hello")?;

    run_backup(&config)?;

    let object = temp.path().join("data").join(HELLO_SHA256);
    assert!(object.is_file());
    assert_eq!(count_objects(&temp.path().join("data")), 1);
    Ok(())
}

#[test]
fn test_empty_file_is_backed_up() -> Result<()> {
    let (temp, config) = setup();
    write_source_file(&temp, "empty.txt", b"")?;

    let stats = run_backup(&config)?;

    assert_eq!(stats.files_new, 1);
    assert_eq!(stats.bytes_stored, 0);
    assert!(temp.path().join("data").join(EMPTY_SHA256).is_file());
    assert_eq!(fs::read(temp.path().join("backup/empty.txt"))?, b"");
    Ok(())
}

#[test]
fn test_empty_source_tree() -> Result<()> {
    let (temp, config) = setup();

    let stats = run_backup(&config)?;

    assert_eq!(stats, RunStats::default());
    assert!(temp.path().join("backup").is_dir());
    assert!(temp.path().join("data").is_dir());
    Ok(())
}

#[test]
fn test_nested_directories_are_mirrored() -> Result<()> {
    let (temp, config) = setup();
    write_source_file(&temp, "a/b/c/file.txt", b"nested")?;
    fs::create_dir(temp.path().join("src/unused"))?;

    let stats = run_backup(&config)?;

    // a, a/b, a/b/c and the empty directory all get mirrored
    assert_eq!(stats.directories_total, 4);
    assert!(temp.path().join("backup/a/b/c").is_dir());
    assert!(temp.path().join("backup/unused").is_dir());
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_mirror_entry_is_a_hard_link() -> Result<()> {
    use std::os::unix::fs::MetadataExt;

    let (temp, config) = setup();
    write_source_file(&temp, "a.txt", b"hello")?;

    run_backup(&config)?;

    // Store object and mirror entry share one inode: no duplicate bytes
    let object = temp.path().join("data").join(HELLO_SHA256);
    assert_eq!(fs::metadata(&object)?.nlink(), 2);
    assert_eq!(
        fs::metadata(&object)?.ino(),
        fs::metadata(temp.path().join("backup/a.txt"))?.ino()
    );
    Ok(())
}

#[cfg(unix)]
#[test]
fn test_symlinks_are_skipped() -> Result<()> {
    let (temp, config) = setup();
    write_source_file(&temp, "a.txt", b"hello")?;
    std::os::unix::fs::symlink(
        temp.path().join("src/a.txt"),
        temp.path().join("src/link.txt"),
    )?;

    let stats = run_backup(&config)?;

    assert_eq!(stats.files_total, 1);
    assert!(!temp.path().join("backup/link.txt").exists());
    Ok(())
}

#[test]
fn test_hash_algorithm_controls_object_names() -> Result<()> {
    let (temp, mut config) = setup();
    config.hash_algorithm = HashAlgorithm::Md5;
    write_source_file(&temp, "a.txt", b"")?;

    run_backup(&config)?;

    // MD5 of the empty input
    let object = temp.path().join("data").join("D41D8CD98F00B204E9800998ECF8427E");
    assert!(object.is_file());
    Ok(())
}
