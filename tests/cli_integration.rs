//! Integration tests for the command line interface
//!
//! Only commands that need no external toolchain are run end to end; the
//! toolchain-driven commands are checked for their failure modes.

use assert_cmd::Command;
use clgen_preprocess::store::{DatasetStore, ProcessedRecord, SqliteStore, Status, DELETED_MARKER};
use std::fs;
use tempfile::TempDir;

fn clgen() -> Command {
    let mut cmd = Command::cargo_bin("clgen-preprocess").expect("binary is built");
    cmd.env("CLGEN_QUIET", "1").env_remove("RUST_LOG");
    cmd
}

fn write_kernels(dir: &std::path::Path) {
    fs::create_dir_all(dir.join("nested")).unwrap();
    fs::write(dir.join("a.cl"), "kernel void A() {}\n").unwrap();
    fs::write(dir.join("nested/b.cl"), "kernel void B() {}\n").unwrap();
    fs::write(dir.join("notes.txt"), "not a kernel").unwrap();
}

#[test]
fn test_help_lists_commands() {
    let output = clgen().arg("--help").output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["preprocess-db", "preprocess-file", "features", "remove-bad", "import"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_init_writes_config_once() {
    let dir = TempDir::new().unwrap();

    clgen().current_dir(dir.path()).arg("init").assert().success();
    let written = fs::read_to_string(dir.path().join(".clgen.toml")).unwrap();
    assert!(written.contains("[toolchain]"));

    clgen().current_dir(dir.path()).arg("init").assert().failure();
    clgen()
        .current_dir(dir.path())
        .args(["init", "--force"])
        .assert()
        .success();
}

#[test]
fn test_import_then_remove_bad() {
    let dir = TempDir::new().unwrap();
    let kernels = dir.path().join("kernels");
    write_kernels(&kernels);
    let db = dir.path().join("kernels.db");

    let output = clgen()
        .current_dir(dir.path())
        .arg("import")
        .arg(&db)
        .arg(&kernels)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("imported 2 new kernels"));

    let mut store = SqliteStore::open_existing(&db).unwrap();
    assert_eq!(store.count_content_files().unwrap(), 2);
    assert!(store.is_modified().unwrap());
    let ids: Vec<String> = store
        .content_window(0, 2)
        .unwrap()
        .into_iter()
        .map(|unit| unit.id)
        .collect();
    store
        .upsert_all(
            &[
                ProcessedRecord::new(ids[0].clone(), Status::Accepted, "kernel void A() {}"),
                ProcessedRecord::new(ids[1].clone(), Status::Bad, "error: nope"),
            ],
            true,
        )
        .unwrap();
    drop(store);

    let output = clgen()
        .current_dir(dir.path())
        .arg("remove-bad")
        .arg(&db)
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 preprocessed: 1 accepted, 1 bad, 0 ugly"));
    assert!(stdout.contains("cleared 1 records"));

    let store = SqliteStore::open_existing(&db).unwrap();
    let bad = store.processed_record(&ids[1]).unwrap().unwrap();
    assert_eq!(bad.contents, DELETED_MARKER);
    let good = store.processed_record(&ids[0]).unwrap().unwrap();
    assert_eq!(good.contents, "kernel void A() {}");
}

#[test]
fn test_import_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let kernels = dir.path().join("kernels");
    write_kernels(&kernels);
    let db = dir.path().join("kernels.db");

    for expected in ["imported 2 new kernels", "imported 0 new kernels"] {
        let output = clgen()
            .current_dir(dir.path())
            .arg("import")
            .arg(&db)
            .arg(&kernels)
            .output()
            .unwrap();
        assert!(String::from_utf8_lossy(&output.stdout).contains(expected));
    }
}

#[test]
fn test_preprocess_db_never_creates_a_dataset() {
    let dir = TempDir::new().unwrap();
    let output = clgen()
        .current_dir(dir.path())
        .arg("preprocess-db")
        .arg(dir.path().join("missing.db"))
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(!dir.path().join("missing.db").exists());
}

#[test]
fn test_missing_toolchain_is_reported() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join(".clgen.toml"),
        "[toolchain]\nclang = \"/nonexistent/clang\"\n",
    )
    .unwrap();
    let kernel = dir.path().join("a.cl");
    fs::write(&kernel, "kernel void A() {}\n").unwrap();

    let output = clgen()
        .current_dir(dir.path())
        .arg("features")
        .arg(&kernel)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("clang"));
}

#[test]
fn test_malformed_explicit_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("broken.toml");
    fs::write(&config, "[policy\nmin_instructions = ").unwrap();

    let output = clgen()
        .current_dir(dir.path())
        .args(["--config"])
        .arg(&config)
        .args(["remove-bad", "kernels.db"])
        .output()
        .unwrap();

    assert!(!output.status.success());
}
