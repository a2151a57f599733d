//! Parsing of repository locations.
//!
//! Three spellings are accepted: a full URL
//! (`scheme://[user@]host[:port]/path`), a bare local path (absolute or
//! relative), and the scp-style `host:path` shorthand, understood as SSH.

use serde::{Deserialize, Serialize};

use crate::error::{PicError, Result};

/// A parsed repository location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PicUrl {
    pub scheme: String,
    pub host: Option<String>,
    pub user: Option<String>,
    pub port: Option<u16>,
    pub path: String,
    pub is_local: bool,
}

impl PicUrl {
    /// Parse a repository location.
    pub fn parse(input: &str) -> Result<Self> {
        if input.is_empty() {
            return Err(invalid(input, "empty URL"));
        }

        if let Some((scheme, rest)) = input.split_once("://") {
            if scheme.is_empty() {
                return Err(invalid(input, "empty scheme"));
            }
            if scheme == "file" {
                return Ok(Self::local(rest));
            }
            let (authority, path) = match rest.find('/') {
                Some(pos) => (&rest[..pos], &rest[pos + 1..]),
                None => (rest, ""),
            };
            let (user, hostport) = match authority.split_once('@') {
                Some((user, hostport)) => (Some(user.to_string()), hostport),
                None => (None, authority),
            };
            let (host, port) = match hostport.split_once(':') {
                Some((host, port)) => {
                    let port: u16 = port
                        .parse()
                        .map_err(|_| invalid(input, "invalid port number"))?;
                    (host, Some(port))
                }
                None => (hostport, None),
            };
            if host.is_empty() {
                return Err(invalid(input, "empty host"));
            }
            return Ok(Self {
                scheme: scheme.to_string(),
                host: Some(host.to_string()),
                user,
                port,
                path: path.to_string(),
                is_local: false,
            });
        }

        // scp-style shorthand: host:path, with no slash before the colon.
        // A single-character prefix is a Windows drive letter, not a host.
        if let Some(pos) = input.find(':') {
            if pos > 1 && !input[..pos].contains('/') && !input[..pos].contains('\\') {
                let (hostpart, path) = (&input[..pos], &input[pos + 1..]);
                let (user, host) = match hostpart.split_once('@') {
                    Some((user, host)) => (Some(user.to_string()), host),
                    None => (None, hostpart),
                };
                if host.is_empty() {
                    return Err(invalid(input, "empty host"));
                }
                return Ok(Self {
                    scheme: "ssh".to_string(),
                    host: Some(host.to_string()),
                    user,
                    port: None,
                    path: path.to_string(),
                    is_local: false,
                });
            }
        }

        Ok(Self::local(input))
    }

    fn local(path: &str) -> Self {
        Self {
            scheme: "file".to_string(),
            host: None,
            user: None,
            port: None,
            path: path.to_string(),
            is_local: true,
        }
    }
}

impl std::fmt::Display for PicUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_local {
            return write!(f, "{}", self.path);
        }
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = &self.user {
            write!(f, "{user}@")?;
        }
        if let Some(host) = &self.host {
            write!(f, "{host}")?;
        }
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        write!(f, "/{}", self.path)
    }
}

fn invalid(input: &str, reason: &str) -> PicError {
    PicError::InvalidUri {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
