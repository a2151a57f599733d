//! The `pic remove` command: drop negatives and their derived files.

use std::path::Path;

use clap::Args;

#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Indexed filenames to remove
    #[arg(required = true)]
    pub files: Vec<String>,
}

pub fn execute(repo: &str, args: &RemoveArgs) -> anyhow::Result<()> {
    let (mut loaded, mut conn) = super::open(repo)?;

    for file in &args.files {
        let picture = loaded.index.remove(file)?;
        for sidecar in picture.sidecars() {
            let path = Path::new(&sidecar.path);
            if conn.exists(path)? {
                conn.remove(path)?;
            }
        }
        // A negative already missing from disk must still lose its index
        // entry, or it could never be removed at all.
        let negative = Path::new(picture.filename());
        if conn.exists(negative)? {
            conn.remove(negative)?;
        } else {
            tracing::warn!(file, "negative already missing on disk");
        }
        tracing::info!(file, sidecars = picture.sidecars().len(), "removed");
    }

    loaded.save_index(conn.as_mut())?;
    Ok(())
}
