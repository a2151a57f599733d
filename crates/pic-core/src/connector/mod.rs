//! Filesystem abstraction over local paths and remote SSH/SFTP URLs.
//!
//! Repo operations never touch the filesystem directly; they go through a
//! [`Connector`], so a repository on a remote host behaves like a local
//! one. All paths handed to a connector are interpreted relative to the
//! connector's base URL.

mod local;
mod ssh;

pub use self::local::LocalConnector;
pub use self::ssh::SshConnector;

use std::io::{Read, Write};
use std::path::Path;

use crate::error::{PicError, Result};
use crate::vurl::PicUrl;

type BoxRead = Box<dyn Read + Send>;
type BoxWrite = Box<dyn Write + Send>;

/// Uniform open/mkdir/exists/copy over a base location.
///
/// State machine: `disconnected → connected → disconnected`. I/O methods
/// require `connected` and fail with `not-connected` otherwise; `connect`
/// on a connected connector fails with `already-connected`; `disconnect`
/// is an idempotent no-op.
pub trait Connector: Send {
    /// The base URL this connector serves.
    fn url(&self) -> &PicUrl;

    fn is_connected(&self) -> bool;

    /// Establish the connection. Transport failures surface as
    /// `connection-error`.
    fn connect(&mut self) -> Result<()>;

    /// Tear down the connection. No-op when already disconnected.
    fn disconnect(&mut self);

    /// Whether a file or directory exists under the base.
    fn exists(&mut self, path: &Path) -> Result<bool>;

    /// Open a file under the base for reading.
    fn open_read(&mut self, path: &Path) -> Result<BoxRead>;

    /// Create or truncate a file under the base for writing.
    fn open_write(&mut self, path: &Path) -> Result<BoxWrite>;

    /// Create a directory (and missing parents) under the base.
    fn mkdir(&mut self, path: &Path, mode: u32) -> Result<()>;

    /// Delete one file under the base.
    fn remove(&mut self, path: &Path) -> Result<()>;

    /// Base directory on the local filesystem, if this connector is local.
    /// Workers and subprocesses need a real working directory; remote
    /// repos return `None`.
    fn local_root(&self) -> Option<&Path> {
        None
    }

    /// Copy file bytes from this connector to another.
    ///
    /// Connects the destination if needed and disconnects it on return.
    fn copy_to(
        &mut self,
        src: &Path,
        dst: &mut dyn Connector,
        dst_path: &Path,
    ) -> Result<()> {
        let was_connected = dst.is_connected();
        if !was_connected {
            dst.connect()?;
        }
        let result = (|| {
            let mut reader = self.open_read(src)?;
            let mut writer = dst.open_write(dst_path)?;
            std::io::copy(&mut reader, &mut writer)?;
            writer.flush()?;
            Ok(())
        })();
        if !was_connected {
            dst.disconnect();
        }
        result
    }
}

/// Build a connector for a repository location.
///
/// Local paths and `file://` URLs get a [`LocalConnector`]; `ssh://` URLs
/// and `host:path` shorthands get an [`SshConnector`]. Any other scheme is
/// `url-not-supported`.
pub fn connector_for(url: &str) -> Result<Box<dyn Connector>> {
    let parsed = PicUrl::parse(url)?;
    if parsed.is_local {
        return Ok(Box::new(LocalConnector::new(parsed)));
    }
    match parsed.scheme.as_str() {
        "ssh" | "sftp" => Ok(Box::new(SshConnector::new(parsed))),
        scheme => Err(PicError::UrlNotSupported(scheme.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_picks_connector_by_scheme() {
        assert!(connector_for("/tmp/repo").unwrap().url().is_local);
        assert!(!connector_for("ssh://nas/repo").unwrap().url().is_local);
        assert!(!connector_for("nas:repo").unwrap().url().is_local);
        assert!(matches!(
            connector_for("ftp://nas/repo"),
            Err(PicError::UrlNotSupported(_))
        ));
    }

    #[test]
    fn test_copy_to_manages_destination_connection() {
        let tmp = tempfile::tempdir().unwrap();
        let src_dir = tmp.path().join("src");
        let dst_dir = tmp.path().join("dst");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::create_dir_all(&dst_dir).unwrap();
        std::fs::write(src_dir.join("A.NEF"), b"raw bytes").unwrap();

        let mut src = connector_for(src_dir.to_str().unwrap()).unwrap();
        let mut dst = connector_for(dst_dir.to_str().unwrap()).unwrap();
        src.connect().unwrap();

        src.copy_to(Path::new("A.NEF"), dst.as_mut(), Path::new("A.NEF"))
            .unwrap();
        // Destination was connected on demand and released again.
        assert!(!dst.is_connected());
        assert_eq!(
            std::fs::read(dst_dir.join("A.NEF")).unwrap(),
            b"raw bytes"
        );
    }
}
