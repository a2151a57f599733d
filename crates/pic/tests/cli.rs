//! Black-box tests of the `pic` binary over temporary repositories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

/// Drop an executable shell script into `dir` and return its path.
fn script(dir: &Path, name: &str, body: &str) -> String {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn pic(repo: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_pic"))
        .arg("--repo")
        .arg(repo)
        .args(args)
        .output()
        .expect("run pic binary")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_init_creates_layout_and_list_is_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let out = pic(tmp.path(), &["init"]);
    assert!(out.status.success());
    assert!(tmp.path().join(".pic/config").is_file());
    assert!(tmp.path().join(".pic/index").is_file());

    let out = pic(tmp.path(), &["list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_add_noprocess_indexes_without_touching_files() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("B.NEF"), b"negative B").unwrap();
    fs::write(tmp.path().join("A.NEF"), b"negative A").unwrap();

    let out = pic(tmp.path(), &["add", "-n", "B.NEF", "A.NEF"]);
    assert!(out.status.success());

    let out = pic(tmp.path(), &["list"]);
    assert_eq!(stdout(&out), "A.NEF\nB.NEF\n");
    // Nothing was processed.
    assert!(!tmp.path().join(".pic/sha1").exists());
    let out = pic(tmp.path(), &["list", "checksums"]);
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_add_twice_fails() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"x").unwrap();

    assert!(pic(tmp.path(), &["add", "-n", "A.NEF"]).status.success());
    let out = pic(tmp.path(), &["add", "-n", "A.NEF"]);
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn test_hash_recipe_then_check_passes_and_detects_corruption() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"negative A").unwrap();
    fs::write(tmp.path().join("B.NEF"), b"negative B").unwrap();

    let out = pic(tmp.path(), &["add", "-r", "hash", "A.NEF", "B.NEF"]);
    assert!(out.status.success());

    // sha1sum-compatible checksum listing, sorted by filename.
    let out = pic(tmp.path(), &["list", "checksums"]);
    let listing = stdout(&out);
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with(" *A.NEF"));
    assert!(lines[1].ends_with(" *B.NEF"));
    assert_eq!(lines[0].split(' ').next().unwrap().len(), 40);

    let out = pic(tmp.path(), &["check"]);
    assert!(out.status.success());

    // Corrupt one negative and delete the other.
    fs::write(tmp.path().join("A.NEF"), b"altered bytes").unwrap();
    fs::remove_file(tmp.path().join("B.NEF")).unwrap();
    let out = pic(tmp.path(), &["check"]);
    assert_eq!(out.status.code(), Some(1));
    let report = stdout(&out);
    assert!(report.contains("A.NEF"));
    assert!(report.contains("B.NEF"));
}

#[test]
fn test_remove_deletes_negative_and_sidecars() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"negative A").unwrap();
    fs::write(tmp.path().join("B.NEF"), b"negative B").unwrap();
    pic(tmp.path(), &["add", "-r", "hash", "A.NEF", "B.NEF"]);

    let out = pic(tmp.path(), &["remove", "A.NEF"]);
    assert!(out.status.success());
    assert!(!tmp.path().join("A.NEF").exists());
    assert!(!tmp.path().join(".pic/sha1/A.sha1").exists());
    assert!(tmp.path().join("B.NEF").is_file());
    assert!(tmp.path().join(".pic/sha1/B.sha1").is_file());

    let out = pic(tmp.path(), &["list"]);
    assert_eq!(stdout(&out), "B.NEF\n");
}

#[test]
fn test_remove_of_missing_negative_still_drops_index_entry() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"negative A").unwrap();
    pic(tmp.path(), &["add", "-r", "hash", "A.NEF"]);

    // The negative disappears behind our back (the state `check`
    // reports as missing); remove must still clean up the entry.
    fs::remove_file(tmp.path().join("A.NEF")).unwrap();
    let out = pic(tmp.path(), &["remove", "A.NEF"]);
    assert!(out.status.success());
    assert!(!tmp.path().join(".pic/sha1/A.sha1").exists());

    let out = pic(tmp.path(), &["list"]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_list_thumbnails_and_sidecars() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"negative A").unwrap();

    // Fake extractor: "$2" is the filename, produce <basename>.thumb.jpg.
    let fake = script(
        tmp.path(),
        "fake-dcraw",
        r#"base="${2%.*}"; printf thumb > "$base.thumb.jpg""#,
    );
    fs::write(
        tmp.path().join(".pic/config"),
        format!("[tools]\ndcraw = \"{fake}\"\n"),
    )
    .unwrap();

    let out = pic(tmp.path(), &["add", "-r", "hash,dcraw-thumb", "A.NEF"]);
    assert!(out.status.success());

    let out = pic(tmp.path(), &["list", "thumbnails"]);
    assert_eq!(stdout(&out), "A.thumb.jpg\n");
    // Sidecars in processing order: checksum first, then the thumbnail.
    let out = pic(tmp.path(), &["list", "sidecars"]);
    assert_eq!(stdout(&out), ".pic/sha1/A.sha1\nA.thumb.jpg\n");
}

#[test]
fn test_add_noprocess_accepts_file_url() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    let url = format!("file://{}", tmp.path().display());

    let out = Command::new(env!("CARGO_BIN_EXE_pic"))
        .args(["--repo", &url, "add", "-n", "A.NEF"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let out = pic(tmp.path(), &["list"]);
    assert_eq!(stdout(&out), "A.NEF\n");
}

#[test]
fn test_commands_outside_a_repo_fail() {
    let tmp = tempfile::tempdir().unwrap();
    for args in [&["list"][..], &["check"], &["add", "-n", "A.NEF"]] {
        let out = pic(tmp.path(), args);
        assert_eq!(out.status.code(), Some(1), "{args:?}");
    }
}

#[test]
fn test_migrate_is_an_informative_no_op() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    let out = pic(tmp.path(), &["migrate"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("format version 1"));
}

#[test]
fn test_unknown_recipe_kind_is_an_argument_error() {
    let tmp = tempfile::tempdir().unwrap();
    pic(tmp.path(), &["init"]);
    fs::write(tmp.path().join("A.NEF"), b"x").unwrap();
    let out = pic(tmp.path(), &["add", "-r", "frobnicate", "A.NEF"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("frobnicate"));
}
