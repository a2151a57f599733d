//! Local filesystem connector.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{PicError, Result};
use crate::vurl::PicUrl;

use super::Connector;

/// Connector over a base directory on the local filesystem.
pub struct LocalConnector {
    url: PicUrl,
    base: PathBuf,
    connected: bool,
}

impl LocalConnector {
    pub fn new(url: PicUrl) -> Self {
        let base = PathBuf::from(&url.path);
        Self {
            url,
            base,
            connected: false,
        }
    }

    fn require_connected(&self) -> Result<()> {
        if !self.connected {
            return Err(PicError::NotConnected(self.url.to_string()));
        }
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }
}

impl Connector for LocalConnector {
    fn url(&self) -> &PicUrl {
        &self.url
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn connect(&mut self) -> Result<()> {
        if self.connected {
            return Err(PicError::AlreadyConnected(self.url.to_string()));
        }
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
    }

    fn exists(&mut self, path: &Path) -> Result<bool> {
        self.require_connected()?;
        Ok(self.resolve(path).exists())
    }

    fn open_read(&mut self, path: &Path) -> Result<Box<dyn Read + Send>> {
        self.require_connected()?;
        Ok(Box::new(File::open(self.resolve(path))?))
    }

    fn open_write(&mut self, path: &Path) -> Result<Box<dyn Write + Send>> {
        self.require_connected()?;
        Ok(Box::new(File::create(self.resolve(path))?))
    }

    fn mkdir(&mut self, path: &Path, _mode: u32) -> Result<()> {
        self.require_connected()?;
        fs::create_dir_all(self.resolve(path))?;
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        self.require_connected()?;
        fs::remove_file(self.resolve(path))?;
        Ok(())
    }

    fn local_root(&self) -> Option<&Path> {
        Some(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connector(base: &Path) -> LocalConnector {
        LocalConnector::new(PicUrl::parse(base.to_str().unwrap()).unwrap())
    }

    #[test]
    fn test_io_before_connect_is_not_connected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut conn = connector(tmp.path());

        assert!(matches!(
            conn.exists(Path::new("x")),
            Err(PicError::NotConnected(_))
        ));
        assert!(matches!(
            conn.mkdir(Path::new("x"), 0o755),
            Err(PicError::NotConnected(_))
        ));
        assert!(matches!(
            conn.open_read(Path::new("x")),
            Err(PicError::NotConnected(_))
        ));
        // No underlying I/O happened.
        assert!(!tmp.path().join("x").exists());
    }

    #[test]
    fn test_connect_twice_fails_disconnect_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let mut conn = connector(tmp.path());

        conn.connect().unwrap();
        assert!(matches!(
            conn.connect(),
            Err(PicError::AlreadyConnected(_))
        ));
        conn.disconnect();
        conn.disconnect();
        assert!(!conn.is_connected());
        conn.connect().unwrap();
    }

    #[test]
    fn test_paths_resolve_relative_to_base() {
        let tmp = tempfile::tempdir().unwrap();
        let mut conn = connector(tmp.path());
        conn.connect().unwrap();

        conn.mkdir(Path::new("sub/dir"), 0o755).unwrap();
        assert!(tmp.path().join("sub/dir").is_dir());

        let mut writer = conn.open_write(Path::new("sub/dir/f.txt")).unwrap();
        writer.write_all(b"hello").unwrap();
        drop(writer);

        assert!(conn.exists(Path::new("sub/dir/f.txt")).unwrap());
        let mut content = String::new();
        conn.open_read(Path::new("sub/dir/f.txt"))
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "hello");

        conn.remove(Path::new("sub/dir/f.txt")).unwrap();
        assert!(!conn.exists(Path::new("sub/dir/f.txt")).unwrap());
    }
}
