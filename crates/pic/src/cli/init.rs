//! The `pic init` command.

use pic_core::{connector_for, Repo, RepoConfig};

pub fn execute(repo: &str) -> anyhow::Result<()> {
    let mut conn = connector_for(repo)?;
    conn.connect()?;
    Repo::init(conn.as_mut(), RepoConfig::default())?;
    println!("Initialized empty repository at {}", conn.url());
    Ok(())
}
