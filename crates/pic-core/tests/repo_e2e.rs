//! End-to-end scenarios over a real temporary repository: initialize,
//! ingest through the pipeline, verify sidecars, remove, clone.

use std::fs;
use std::path::Path;
use std::sync::atomic::AtomicBool;

use pic_core::{connector_for, Connector, Picture, Pipeline, Recipe, Repo, RepoConfig};

// ── helpers ──────────────────────────────────────────────────────────────

fn connected(path: &Path) -> Box<dyn Connector> {
    let mut conn = connector_for(path.to_str().unwrap()).unwrap();
    conn.connect().unwrap();
    conn
}

/// Initialize a repo and drop some negatives into it.
fn seeded_repo(root: &Path, negatives: &[(&str, &[u8])]) -> (Repo, Box<dyn Connector>) {
    let mut conn = connected(root);
    let repo = Repo::init(conn.as_mut(), RepoConfig::default()).unwrap();
    for (name, bytes) in negatives {
        fs::write(root.join(name), bytes).unwrap();
    }
    (repo, conn)
}

/// Run `names` through `recipe` and fold the results back into the index.
fn ingest(repo: &mut Repo, conn: &mut dyn Connector, root: &Path, recipe: &str, names: &[&str]) {
    for name in names {
        repo.index.add(Picture::new(name).unwrap()).unwrap();
    }
    let recipe = Recipe::parse(recipe).unwrap();
    let mut config = repo.config.clone();
    config.pipeline.poll_ms = 10;

    let mut pipeline = Pipeline::new(&recipe, &config, root.to_path_buf());
    pipeline.start();
    for name in names {
        pipeline.put(Picture::new(name).unwrap());
    }
    for picture in pipeline.finish(&AtomicBool::new(false)) {
        repo.index.replace(picture).unwrap();
    }
    repo.save_index(conn).unwrap();
}

// ── scenarios ────────────────────────────────────────────────────────────

#[test]
fn test_init_creates_control_layout_with_empty_index() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("repo");
    let (_, mut conn) = seeded_repo(&root, &[]);

    assert!(root.join(".pic/config").is_file());
    assert!(root.join(".pic/index").is_file());

    let reloaded = Repo::load(conn.as_mut()).unwrap();
    assert!(reloaded.index.is_empty());
}

#[test]
fn test_hash_ingestion_writes_checksums_and_sidecars() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    let (mut repo, mut conn) =
        seeded_repo(&root, &[("A.NEF", b"negative A"), ("B.NEF", b"negative B")]);

    ingest(&mut repo, conn.as_mut(), &root, "hash", &["A.NEF", "B.NEF"]);

    let reloaded = Repo::load(conn.as_mut()).unwrap();
    assert_eq!(reloaded.index.len(), 2);

    let a = reloaded.index.get("A.NEF").unwrap();
    let digest = a.checksum.as_deref().unwrap();
    assert_eq!(digest.len(), 40);
    assert_eq!(a.sidecars().len(), 1);
    assert_eq!(
        a.history.iter().map(|h| h.worker.as_str()).collect::<Vec<_>>(),
        ["hash"]
    );

    // The checksum sidecar is byte-exact sha1sum input.
    let sidecar = fs::read_to_string(root.join(".pic/sha1/A.sha1")).unwrap();
    assert_eq!(sidecar, format!("{digest} *A.NEF\n"));
}

#[test]
fn test_failed_negative_keeps_its_raw_index_entry() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    // B.NEF is indexed but never written, so the hash stage drops it.
    let (mut repo, mut conn) = seeded_repo(&root, &[("A.NEF", b"negative A")]);

    ingest(&mut repo, conn.as_mut(), &root, "hash", &["A.NEF", "B.NEF"]);

    let reloaded = Repo::load(conn.as_mut()).unwrap();
    assert_eq!(reloaded.index.len(), 2);
    assert!(reloaded.index.get("A.NEF").unwrap().checksum.is_some());
    let b = reloaded.index.get("B.NEF").unwrap();
    assert!(b.checksum.is_none());
    assert!(b.history.is_empty());
}

#[test]
fn test_remove_deletes_negative_and_its_sidecars_only() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().to_path_buf();
    let (mut repo, mut conn) =
        seeded_repo(&root, &[("A.NEF", b"negative A"), ("B.NEF", b"negative B")]);

    ingest(
        &mut repo,
        conn.as_mut(),
        &root,
        "hash",
        &["A.NEF", "B.NEF"],
    );

    let gone = repo.index.remove("A.NEF").unwrap();
    for sidecar in gone.sidecars() {
        conn.remove(Path::new(&sidecar.path)).unwrap();
    }
    conn.remove(Path::new(gone.filename())).unwrap();
    repo.save_index(conn.as_mut()).unwrap();

    assert!(!root.join("A.NEF").exists());
    assert!(!root.join(".pic/sha1/A.sha1").exists());
    // The sibling and its sidecar are untouched.
    assert!(root.join("B.NEF").is_file());
    assert!(root.join(".pic/sha1/B.sha1").is_file());

    let reloaded = Repo::load(conn.as_mut()).unwrap();
    assert!(!reloaded.index.contains("A.NEF"));
    assert!(reloaded.index.contains("B.NEF"));
}

#[test]
fn test_clone_reproduces_processed_repo() {
    let tmp = tempfile::tempdir().unwrap();
    let src_root = tmp.path().join("src");
    let dst_root = tmp.path().join("dst");
    let (mut repo, mut src) = seeded_repo(&src_root, &[("A.NEF", b"negative A")]);
    ingest(&mut repo, src.as_mut(), &src_root, "hash", &["A.NEF"]);

    let mut dst = connector_for(dst_root.to_str().unwrap()).unwrap();
    let cloned = Repo::clone_repo(src.as_mut(), dst.as_mut()).unwrap();
    assert_eq!(cloned.index.len(), 1);

    assert_eq!(fs::read(dst_root.join("A.NEF")).unwrap(), b"negative A");
    dst.connect().unwrap();
    let reloaded = Repo::load(dst.as_mut()).unwrap();
    assert_eq!(
        reloaded.index.get("A.NEF").unwrap().checksum,
        repo.index.get("A.NEF").unwrap().checksum
    );
}
