//! Processing workers: one unit of transformation applied to one picture.
//!
//! Workers are built from a dispatch table keyed by kind name, so recipes
//! from configuration map directly to constructors. Each worker is pure
//! over (picture, repo root): shared state is read-only configuration
//! captured at construction.

mod external;
mod hash;
mod metadata;
mod thumbnail;

pub use self::external::ExternalWorker;
pub use self::hash::{checksum_line, sha1_of_file, HashDigest};
pub use self::metadata::MetadataReader;
pub use self::thumbnail::ThumbExtractor;

use std::path::Path;
use std::sync::Arc;

use crate::config::RepoConfig;
use crate::error::{PicError, Result};
use crate::picture::{Picture, Sidecar};

/// A single processing unit over one picture.
///
/// On success a worker returns its derived sidecar, if it produces one;
/// the stage records the history entry and attaches the sidecar. On
/// failure no mutation of the picture is required and the picture is not
/// forwarded to the next stage.
pub trait Worker: Send + Sync {
    /// Stable name recorded in the picture history.
    fn name(&self) -> &'static str;

    /// Process one picture inside the repo working directory.
    fn process(&self, picture: &mut Picture, repo_root: &Path) -> Result<Option<Sidecar>>;
}

/// The worker kinds a recipe may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerKind {
    Hash,
    Metadata,
    Thumbnail,
    DcrawThumb,
    Exiv2Xmp,
    Autorot,
    GitAdd,
}

impl WorkerKind {
    /// Canonical kind name, as used in recipes, config and history.
    pub fn name(&self) -> &'static str {
        match self {
            WorkerKind::Hash => "hash",
            WorkerKind::Metadata => "metadata",
            WorkerKind::Thumbnail => "thumbnail",
            WorkerKind::DcrawThumb => "dcraw-thumb",
            WorkerKind::Exiv2Xmp => "exiv2-xmp",
            WorkerKind::Autorot => "autorot",
            WorkerKind::GitAdd => "git-add",
        }
    }

    /// Look a kind up by name. Accepts the historical spellings too.
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "hash" | "hashdigest" => Ok(WorkerKind::Hash),
            "metadata" => Ok(WorkerKind::Metadata),
            "thumbnail" | "thumb" => Ok(WorkerKind::Thumbnail),
            "dcraw-thumb" | "dcrawthumb" => Ok(WorkerKind::DcrawThumb),
            "exiv2-xmp" | "exiv2xmp" => Ok(WorkerKind::Exiv2Xmp),
            "autorot" | "jhead-autorot" => Ok(WorkerKind::Autorot),
            "git-add" | "gitadd" => Ok(WorkerKind::GitAdd),
            other => Err(PicError::UnknownWorkerKind(other.to_string())),
        }
    }

    /// Construct a worker of this kind bound to the repo configuration.
    pub fn build(&self, config: &RepoConfig) -> Arc<dyn Worker> {
        match self {
            WorkerKind::Hash => Arc::new(HashDigest::new(&config.checksums)),
            WorkerKind::Metadata => Arc::new(MetadataReader::new()),
            WorkerKind::Thumbnail => Arc::new(ThumbExtractor::new(&config.thumbnails)),
            WorkerKind::DcrawThumb => Arc::new(ExternalWorker::dcraw_thumb(config)),
            WorkerKind::Exiv2Xmp => Arc::new(ExternalWorker::exiv2_xmp(config)),
            WorkerKind::Autorot => Arc::new(ExternalWorker::autorot(config)),
            WorkerKind::GitAdd => Arc::new(ExternalWorker::git_add(config)),
        }
    }
}
