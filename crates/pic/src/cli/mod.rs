//! Command implementations.

pub mod add;
pub mod check;
pub mod init;
pub mod list;
pub mod migrate;
pub mod remove;
pub mod view;

use std::path::PathBuf;

use anyhow::Context;
use pic_core::{connector_for, Connector, Repo};

/// Connect to the repository location and load it.
fn open(repo: &str) -> anyhow::Result<(Repo, Box<dyn Connector>)> {
    let mut conn = connector_for(repo)?;
    conn.connect()?;
    let loaded = Repo::load(conn.as_mut())?;
    Ok((loaded, conn))
}

/// As [`open`], for commands that run workers or subprocesses: those need
/// a real working directory, so the repo must be local.
fn open_local(repo: &str) -> anyhow::Result<(Repo, Box<dyn Connector>, PathBuf)> {
    let (loaded, conn) = open(repo)?;
    let root = conn
        .local_root()
        .context("this command requires a local repository")?
        .to_path_buf();
    Ok((loaded, conn, root))
}
