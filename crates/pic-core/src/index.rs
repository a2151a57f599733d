//! Persistent mapping from filename to picture record.
//!
//! Serialized as a versioned JSON envelope so future format revisions can
//! be detected before deserializing the records themselves.

use std::collections::BTreeMap;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PicError, Result};
use crate::picture::Picture;

/// Mapping from filename (unique key) to Picture, iterated in
/// filename-sorted order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PictureIndex {
    pictures: BTreeMap<String, Picture>,
}

/// On-disk envelope: format version tag plus the sorted picture records.
#[derive(Serialize, Deserialize)]
struct IndexFile {
    format_version: u32,
    pictures: Vec<Picture>,
}

impl PictureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a picture. Fails if the filename is already indexed.
    pub fn add(&mut self, picture: Picture) -> Result<()> {
        let key = picture.filename().to_string();
        if self.pictures.contains_key(&key) {
            return Err(PicError::PictureAlreadyIndexed(key));
        }
        self.pictures.insert(key, picture);
        Ok(())
    }

    /// Replace an existing entry. Fails if the filename is absent.
    pub fn replace(&mut self, picture: Picture) -> Result<()> {
        let key = picture.filename().to_string();
        if !self.pictures.contains_key(&key) {
            return Err(PicError::PictureNotIndexed(key));
        }
        self.pictures.insert(key, picture);
        Ok(())
    }

    /// Remove and return an entry. Fails if the filename is absent.
    pub fn remove(&mut self, filename: &str) -> Result<Picture> {
        self.pictures
            .remove(filename)
            .ok_or_else(|| PicError::PictureNotIndexed(filename.to_string()))
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.pictures.contains_key(filename)
    }

    pub fn get(&self, filename: &str) -> Option<&Picture> {
        self.pictures.get(filename)
    }

    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }

    /// Iterate pictures in filename-sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Picture> {
        self.pictures.values()
    }

    /// Serialize into a writer as the versioned JSON envelope.
    pub fn write_to(&self, writer: &mut dyn Write, format_version: u32) -> Result<()> {
        let envelope = IndexFile {
            format_version,
            pictures: self.pictures.values().cloned().collect(),
        };
        serde_json::to_writer_pretty(&mut *writer, &envelope)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Deserialize from a reader. Failures surface as `index-parse-error`
    /// carrying the index path for context.
    pub fn read_from(reader: &mut dyn Read, path: &Path) -> Result<Self> {
        let envelope: IndexFile =
            serde_json::from_reader(reader).map_err(|e| PicError::IndexParse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            version = envelope.format_version,
            pictures = envelope.pictures.len(),
            "loaded picture index"
        );
        let mut index = Self::new();
        for picture in envelope.pictures {
            let key = picture.filename().to_string();
            if index.pictures.insert(key.clone(), picture).is_some() {
                return Err(PicError::IndexParse {
                    path: path.to_path_buf(),
                    reason: format!("duplicate filename '{key}'"),
                });
            }
        }
        Ok(index)
    }
}
