//! SHA-1 content hashing with an optional checksum sidecar file.

use std::fs::{self, File};
use std::io::{BufReader, Read, Write};
use std::path::Path;

use sha1::{Digest, Sha1};

use crate::config::ChecksumsConfig;
use crate::error::Result;
use crate::picture::{ContentType, Picture, Sidecar};

use super::Worker;

/// Computes the SHA-1 hex digest of the raw file contents and stores it
/// in the picture's checksum. When the checksum sidecar is enabled, also
/// writes a `<digest> *<filename>` file next to the usual sha1sum tools.
pub struct HashDigest {
    sidecar_enabled: bool,
    sidecar_dir: String,
}

impl HashDigest {
    pub fn new(config: &ChecksumsConfig) -> Self {
        Self {
            sidecar_enabled: config.sidecar_enabled,
            sidecar_dir: config.sidecar_dir.clone(),
        }
    }

    fn sidecar_path(&self, picture: &Picture) -> String {
        format!("{}/{}.sha1", self.sidecar_dir, picture.basename())
    }
}

/// Compute the SHA-1 hex digest of a file's contents using streaming I/O.
/// Reads in 64KB chunks to avoid loading large files entirely into memory.
pub fn sha1_of_file(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = Sha1::new();
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Format one checksum sidecar line: `<hex-digest> *<filename>\n`.
pub fn checksum_line(digest: &str, filename: &str) -> String {
    format!("{digest} *{filename}\n")
}

impl Worker for HashDigest {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn process(&self, picture: &mut Picture, repo_root: &Path) -> Result<Option<Sidecar>> {
        let digest = sha1_of_file(&repo_root.join(picture.filename()))?;
        tracing::debug!(file = picture.filename(), digest, "hashed");

        if !self.sidecar_enabled {
            picture.checksum = Some(digest);
            return Ok(None);
        }

        fs::create_dir_all(repo_root.join(&self.sidecar_dir))?;
        let sidecar_path = self.sidecar_path(picture);
        let mut file = File::create(repo_root.join(&sidecar_path))?;
        file.write_all(checksum_line(&digest, picture.filename()).as_bytes())?;

        picture.checksum = Some(digest);
        Ok(Some(Sidecar {
            path: sidecar_path,
            content_type: ContentType::Checksum,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RepoConfig;

    #[test]
    fn test_sha1_of_known_content() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f.bin");
        fs::write(&path, b"hello world").unwrap();
        // Known SHA-1 of "hello world"
        assert_eq!(
            sha1_of_file(&path).unwrap(),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
    }

    #[test]
    fn test_sha1_of_empty_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty");
        fs::write(&path, b"").unwrap();
        assert_eq!(
            sha1_of_file(&path).unwrap(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
    }

    #[test]
    fn test_process_sets_checksum_and_writes_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("A.NEF"), b"hello world").unwrap();
        let config = RepoConfig::default();
        let worker = HashDigest::new(&config.checksums);

        let mut pic = Picture::new("A.NEF").unwrap();
        let sidecar = worker.process(&mut pic, tmp.path()).unwrap().unwrap();

        assert_eq!(
            pic.checksum.as_deref(),
            Some("2aae6c35c94fcfb415dbe95f408b9ce91ee846ed")
        );
        assert_eq!(sidecar.content_type, ContentType::Checksum);
        assert_eq!(sidecar.path, ".pic/sha1/A.sha1");
        let written = fs::read_to_string(tmp.path().join(".pic/sha1/A.sha1")).unwrap();
        assert_eq!(
            written,
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed *A.NEF\n"
        );
    }

    #[test]
    fn test_process_without_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("A.NEF"), b"x").unwrap();
        let mut config = RepoConfig::default();
        config.checksums.sidecar_enabled = false;
        let worker = HashDigest::new(&config.checksums);

        let mut pic = Picture::new("A.NEF").unwrap();
        let sidecar = worker.process(&mut pic, tmp.path()).unwrap();
        assert!(sidecar.is_none());
        assert!(pic.checksum.is_some());
        assert!(!tmp.path().join(".pic/sha1").exists());
    }

    #[test]
    fn test_process_missing_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let config = RepoConfig::default();
        let worker = HashDigest::new(&config.checksums);
        let mut pic = Picture::new("gone.NEF").unwrap();
        assert!(worker.process(&mut pic, tmp.path()).is_err());
    }
}
