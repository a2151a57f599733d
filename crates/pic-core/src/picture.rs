//! The in-memory record describing one negative and its derived artifacts.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PicError, Result};

/// Classification of a sidecar file derived from a negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContentType {
    Thumbnail,
    Checksum,
    #[serde(rename = "XMP Metadata")]
    XmpMetadata,
    Other(String),
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Thumbnail => write!(f, "Thumbnail"),
            ContentType::Checksum => write!(f, "Checksum"),
            ContentType::XmpMetadata => write!(f, "XMP Metadata"),
            ContentType::Other(tag) => write!(f, "{tag}"),
        }
    }
}

/// A file derived from a negative, stored relative to the repo base.
///
/// Sidecars live only inside their owning picture's sidecar set; the
/// owning picture is found by filename lookup in the index, never through
/// a stored pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sidecar {
    pub path: String,
    pub content_type: ContentType,
}

/// Container format of a negative, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Raw,
    Jpeg,
}

impl FileType {
    fn from_extension(ext: &str) -> Self {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => FileType::Jpeg,
            _ => FileType::Raw,
        }
    }
}

/// One completed processing step: which worker ran, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub worker: String,
    pub timestamp: DateTime<Utc>,
}

/// The record describing one negative, its derived artifacts and its
/// processing history.
///
/// Equality, ordering and hashing are defined purely by `filename`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Picture {
    filename: String,
    basename: String,
    extension: String,
    pub filetype: FileType,
    pub checksum: Option<String>,
    pub metadata: BTreeMap<String, String>,
    sidecars: Vec<Sidecar>,
    pub history: Vec<HistoryEntry>,
}

impl Picture {
    /// Create a picture from a bare filename.
    ///
    /// Fails with `InvalidFilename` if the name is empty or contains a
    /// directory separator.
    pub fn new(filename: &str) -> Result<Self> {
        if filename.is_empty() || filename.contains('/') || filename.contains('\\') {
            return Err(PicError::InvalidFilename(filename.to_string()));
        }
        let (basename, extension) = match filename.rfind('.') {
            // A leading dot is a hidden file, not an extension boundary.
            Some(pos) if pos > 0 => (filename[..pos].to_string(), filename[pos..].to_string()),
            _ => (filename.to_string(), String::new()),
        };
        Ok(Self {
            filename: filename.to_string(),
            filetype: FileType::from_extension(&extension),
            basename,
            extension,
            checksum: None,
            metadata: BTreeMap::new(),
            sidecars: Vec::new(),
            history: Vec::new(),
        })
    }

    /// The bare filename (no directory component).
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Filename without its extension.
    pub fn basename(&self) -> &str {
        &self.basename
    }

    /// Extension including the leading dot, or empty.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Sidecar files derived from this negative, in insertion order.
    pub fn sidecars(&self) -> &[Sidecar] {
        &self.sidecars
    }

    /// Add a sidecar record. A sidecar with the same path replaces the
    /// earlier entry (set semantics keyed by path).
    pub fn add_sidecar(&mut self, sidecar: Sidecar) {
        self.sidecars.retain(|s| s.path != sidecar.path);
        self.sidecars.push(sidecar);
    }

    /// Path of the most recently added Thumbnail sidecar, if any.
    pub fn thumbnail(&self) -> Option<&str> {
        self.sidecars
            .iter()
            .rev()
            .find(|s| s.content_type == ContentType::Thumbnail)
            .map(|s| s.path.as_str())
    }

    /// Append a processing step to the history, timestamped now.
    pub fn record_step(&mut self, worker: &str) {
        self.history.push(HistoryEntry {
            worker: worker.to_string(),
            timestamp: Utc::now(),
        });
    }
}

impl PartialEq for Picture {
    fn eq(&self, other: &Self) -> bool {
        self.filename == other.filename
    }
}

impl Eq for Picture {}

impl PartialOrd for Picture {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Picture {
    fn cmp(&self, other: &Self) -> Ordering {
        self.filename.cmp(&other.filename)
    }
}

impl Hash for Picture {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.filename.hash(state);
    }
}

impl std::fmt::Display for Picture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.filename)
    }
}
