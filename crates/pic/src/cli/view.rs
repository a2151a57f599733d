//! The `pic view` command: hand thumbnails to an external viewer.

use std::process::Command;

use anyhow::{bail, Context};
use clap::Args;

#[derive(Args, Debug)]
pub struct ViewArgs {
    /// Viewer command line, overriding the configured one
    #[arg(long)]
    pub viewer: Option<String>,
}

pub fn execute(repo: &str, args: &ViewArgs) -> anyhow::Result<()> {
    let (loaded, _conn, root) = super::open_local(repo)?;
    if loaded.index.is_empty() {
        println!("Nothing to view");
        return Ok(());
    }

    let command_line = args
        .viewer
        .as_deref()
        .unwrap_or(&loaded.config.viewer.prog);
    let mut words = command_line.split_whitespace();
    let program = words.next().context("empty viewer command line")?;

    // Negatives without a thumbnail are shown as-is; most viewers can
    // at least name what they cannot decode.
    let files = loaded
        .index
        .iter()
        .map(|p| p.thumbnail().unwrap_or(p.filename()).to_string());

    let status = Command::new(program)
        .args(words)
        .args(files)
        .current_dir(&root)
        .status()
        .with_context(|| format!("failed to run viewer {program}"))?;
    if !status.success() {
        bail!("viewer {program} exited with {status}");
    }
    Ok(())
}
