//! The `pic list` command: print index contents to stdout.

use clap::{Args, ValueEnum};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum, default_value_t = ListWhat::All)]
    pub what: ListWhat,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListWhat {
    /// All indexed filenames
    All,
    /// Thumbnail paths of negatives that have one
    Thumbnails,
    /// Every sidecar path
    Sidecars,
    /// `<digest> *<filename>` lines, sha1sum-compatible
    Checksums,
}

pub fn execute(repo: &str, args: &ListArgs) -> anyhow::Result<()> {
    let (loaded, _conn) = super::open(repo)?;

    // Index iteration is filename-ordered, so output is sorted.
    for picture in loaded.index.iter() {
        match args.what {
            ListWhat::All => println!("{picture}"),
            ListWhat::Thumbnails => {
                if let Some(thumb) = picture.thumbnail() {
                    println!("{thumb}");
                }
            }
            ListWhat::Sidecars => {
                for sidecar in picture.sidecars() {
                    println!("{}", sidecar.path);
                }
            }
            ListWhat::Checksums => {
                if let Some(checksum) = &picture.checksum {
                    println!("{checksum} *{picture}");
                }
            }
        }
    }
    Ok(())
}
