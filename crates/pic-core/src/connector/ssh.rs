//! SSH/SFTP connector.
//!
//! Host keys are verified against the standard `~/.ssh/known_hosts`;
//! authentication tries the SSH agent first, then the usual key files.
//! No ssh2 type leaks out of this module: the rest of the crate sees only
//! the [`Connector`] trait.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};

use ssh2::{CheckResult, ErrorCode, KnownHostFileKind, Session, Sftp};

use crate::error::{PicError, Result};
use crate::vurl::PicUrl;

use super::Connector;

const DEFAULT_SSH_PORT: u16 = 22;
const KEY_FILES: &[&str] = &["~/.ssh/id_ed25519", "~/.ssh/id_rsa"];

// SFTP status codes (RFC draft-ietf-secsh-filexfer).
const SFTP_NO_SUCH_FILE: i32 = 2;
const SFTP_NO_SUCH_PATH: i32 = 10;

/// Whether an SFTP error means "the path does not exist", as opposed to a
/// transport or permission failure.
fn is_missing(err: &ssh2::Error) -> bool {
    matches!(
        err.code(),
        ErrorCode::SFTP(SFTP_NO_SUCH_FILE) | ErrorCode::SFTP(SFTP_NO_SUCH_PATH)
    )
}

/// Connector over a remote base directory reached via SSH, with file
/// access through SFTP. Non-absolute base paths are relative to the
/// remote home directory, as usual for SFTP.
pub struct SshConnector {
    url: PicUrl,
    base: PathBuf,
    session: Option<Session>,
    sftp: Option<Sftp>,
}

impl SshConnector {
    pub fn new(url: PicUrl) -> Self {
        let base = PathBuf::from(&url.path);
        Self {
            url,
            base,
            session: None,
            sftp: None,
        }
    }

    fn connection_error(&self, reason: impl std::fmt::Display) -> PicError {
        PicError::ConnectionError {
            url: self.url.to_string(),
            reason: reason.to_string(),
        }
    }

    fn sftp(&mut self) -> Result<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| PicError::NotConnected(self.url.to_string()))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        self.base.join(path)
    }

    fn username(&self) -> String {
        self.url
            .user
            .clone()
            .or_else(|| std::env::var("USER").ok())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Verify the server's host key against `~/.ssh/known_hosts`.
    fn check_host_key(&self, session: &Session, host: &str, port: u16) -> Result<()> {
        let mut known_hosts = session
            .known_hosts()
            .map_err(|e| self.connection_error(e))?;
        let path = PathBuf::from(shellexpand::tilde("~/.ssh/known_hosts").into_owned());
        known_hosts
            .read_file(&path, KnownHostFileKind::OpenSSH)
            .map_err(|e| self.connection_error(format!("cannot read known_hosts: {e}")))?;

        let (key, _key_type) = session
            .host_key()
            .ok_or_else(|| self.connection_error("server sent no host key"))?;
        match known_hosts.check_port(host, port, key) {
            CheckResult::Match => Ok(()),
            CheckResult::Mismatch => {
                Err(self.connection_error(format!("host key mismatch for '{host}'")))
            }
            CheckResult::NotFound | CheckResult::Failure => {
                Err(self.connection_error(format!("no known host key for '{host}'")))
            }
        }
    }

    /// Authenticate with the agent, then fall back to the usual key files.
    fn authenticate(&self, session: &Session, user: &str) -> Result<()> {
        if session.userauth_agent(user).is_ok() {
            return Ok(());
        }
        for key in KEY_FILES {
            let key_path = PathBuf::from(shellexpand::tilde(key).into_owned());
            if !key_path.exists() {
                continue;
            }
            if session
                .userauth_pubkey_file(user, None, &key_path, None)
                .is_ok()
            {
                return Ok(());
            }
        }
        Err(self.connection_error(format!("authentication failed for user '{user}'")))
    }
}

impl Connector for SshConnector {
    fn url(&self) -> &PicUrl {
        &self.url
    }

    fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    fn connect(&mut self) -> Result<()> {
        if self.session.is_some() {
            return Err(PicError::AlreadyConnected(self.url.to_string()));
        }
        let host = self
            .url
            .host
            .clone()
            .ok_or_else(|| self.connection_error("no host in URL"))?;
        let port = self.url.port.unwrap_or(DEFAULT_SSH_PORT);

        tracing::debug!(host, port, "connecting");
        let tcp = TcpStream::connect((host.as_str(), port))
            .map_err(|e| self.connection_error(e))?;
        let mut session = Session::new().map_err(|e| self.connection_error(e))?;
        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| self.connection_error(e))?;

        self.check_host_key(&session, &host, port)?;
        self.authenticate(&session, &self.username())?;

        let sftp = session.sftp().map_err(|e| self.connection_error(e))?;
        self.session = Some(session);
        self.sftp = Some(sftp);
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.disconnect(None, "closing", None);
        }
        self.sftp = None;
    }

    fn exists(&mut self, path: &Path) -> Result<bool> {
        let target = self.resolve(path);
        match self.sftp()?.stat(&target) {
            Ok(_) => Ok(true),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(std::io::Error::from(e).into()),
        }
    }

    fn open_read(&mut self, path: &Path) -> Result<Box<dyn Read + Send>> {
        let target = self.resolve(path);
        let file = self
            .sftp()?
            .open(&target)
            .map_err(std::io::Error::from)?;
        Ok(Box::new(file))
    }

    fn open_write(&mut self, path: &Path) -> Result<Box<dyn Write + Send>> {
        let target = self.resolve(path);
        let file = self
            .sftp()?
            .create(&target)
            .map_err(std::io::Error::from)?;
        Ok(Box::new(file))
    }

    fn mkdir(&mut self, path: &Path, mode: u32) -> Result<()> {
        // SFTP mkdir is not recursive; walk the components.
        let target = self.resolve(path);
        let sftp = self.sftp()?;
        let mut current = PathBuf::new();
        for component in target.components() {
            current.push(component);
            match sftp.stat(&current) {
                Ok(_) => {}
                Err(e) if is_missing(&e) => {
                    sftp.mkdir(&current, mode as i32)
                        .map_err(std::io::Error::from)?;
                }
                Err(e) => return Err(std::io::Error::from(e).into()),
            }
        }
        Ok(())
    }

    fn remove(&mut self, path: &Path) -> Result<()> {
        let target = self.resolve(path);
        self.sftp()?
            .unlink(&target)
            .map_err(std::io::Error::from)?;
        Ok(())
    }
}

impl Drop for SshConnector {
    fn drop(&mut self) {
        self.disconnect();
    }
}
