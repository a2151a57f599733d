//! Per-repository configuration.
//!
//! Stored as a sectioned `[section]` / `key = value` text file at
//! `.pic/config` inside the repo. All sections implement `Default`, so a
//! partial file (or none at all) yields a usable configuration.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{PicError, Result};

/// Root configuration for one repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepoConfig {
    pub index: IndexConfig,
    pub recipes: RecipesConfig,
    pub thumbnails: ThumbnailsConfig,
    pub checksums: ChecksumsConfig,
    pub xmp: XmpConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
    pub viewer: ViewerConfig,
    pub tools: ToolsConfig,
    /// Worker count per worker kind; kinds not listed run one worker.
    pub workers: BTreeMap<String, usize>,
}

/// Index file location and format tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Relative path of the serialized picture index
    pub file: String,

    /// Integer version tag of the index format
    pub format_version: u32,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            file: ".pic/index".to_string(),
            format_version: 1,
        }
    }
}

/// Recipe defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipesConfig {
    /// Comma-separated default worker kinds when the caller supplies none
    pub default: String,
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            default: "hash,metadata,thumbnail,autorot".to_string(),
        }
    }
}

/// Thumbnail extraction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailsConfig {
    /// Directory under the repo for extracted thumbnails
    pub sidecar_dir: String,

    /// Copy metadata from the raw onto the extracted thumbnail
    pub copy_metadata: bool,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            sidecar_dir: "jpg".to_string(),
            copy_metadata: true,
        }
    }
}

/// Checksum sidecar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumsConfig {
    /// Also write a per-picture checksum file
    pub sidecar_enabled: bool,

    /// Directory for checksum sidecars
    pub sidecar_dir: String,
}

impl Default for ChecksumsConfig {
    fn default() -> Self {
        Self {
            sidecar_enabled: true,
            sidecar_dir: ".pic/sha1".to_string(),
        }
    }
}

/// XMP sidecar settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmpConfig {
    /// Directory for extracted XMP sidecars
    pub sidecar_dir: String,
}

impl Default for XmpConfig {
    fn default() -> Self {
        Self {
            sidecar_dir: ".pic/xmp".to_string(),
        }
    }
}

/// Pipeline tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Worker dequeue timeout in milliseconds; bounds how long a worker
    /// blocks before re-checking the stage activation flag.
    pub poll_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { poll_ms: 1000 }
    }
}

/// Logging destination and format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Optional log file path, relative to the repo
    pub file: String,

    /// warn | info | debug | trace
    pub level: String,

    /// plain | json
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            level: "warn".to_string(),
            format: "plain".to_string(),
        }
    }
}

/// External viewer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Default viewer command line
    pub prog: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            prog: "feh".to_string(),
        }
    }
}

/// External tool binaries. Bare names resolve through PATH; operators may
/// point these at absolute paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub dcraw: String,
    pub exiv2: String,
    pub jhead: String,
    pub git: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            dcraw: "dcraw".to_string(),
            exiv2: "exiv2".to_string(),
            jhead: "jhead".to_string(),
            git: "git".to_string(),
        }
    }
}

impl RepoConfig {
    /// Worker count for a stage of the given kind (default 1).
    pub fn worker_count(&self, kind: &str) -> usize {
        self.workers.get(kind).copied().unwrap_or(1).max(1)
    }

    /// Deserialize from a reader.
    pub fn read_from(reader: &mut dyn Read) -> Result<Self> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        toml::from_str(&content).map_err(|e| PicError::Config(e.to_string()))
    }

    /// Serialize into a writer.
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| PicError::Config(e.to_string()))?;
        writer.write_all(content.as_bytes())?;
        Ok(())
    }
}
