//! Sidecar metadata extraction from the raw file's EXIF block.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag};

use crate::error::{PicError, Result};
use crate::picture::{Picture, Sidecar};

use super::Worker;

/// The allow-list of EXIF fields copied into the picture record, as
/// (dotted metadata key, tag) pairs. Fields missing from the file simply
/// stay absent from the map.
const ALLOW_LIST: &[(&str, Tag)] = &[
    ("Exif.Photo.ExposureTime", Tag::ExposureTime),
    ("Exif.Photo.FNumber", Tag::FNumber),
    ("Exif.Photo.ExposureProgram", Tag::ExposureProgram),
    ("Exif.Photo.ISOSpeedRatings", Tag::PhotographicSensitivity),
    ("Exif.Photo.DateTimeOriginal", Tag::DateTimeOriginal),
    ("Exif.Photo.DateTimeDigitized", Tag::DateTimeDigitized),
    ("Exif.Photo.ExposureBiasValue", Tag::ExposureBiasValue),
    ("Exif.Photo.MeteringMode", Tag::MeteringMode),
    ("Exif.Photo.Flash", Tag::Flash),
    ("Exif.Photo.FocalLength", Tag::FocalLength),
    ("Exif.Photo.WhiteBalance", Tag::WhiteBalance),
    ("Exif.Photo.UserComment", Tag::UserComment),
    ("Exif.Image.DateTime", Tag::DateTime),
    ("Exif.Image.Make", Tag::Make),
    ("Exif.Image.Model", Tag::Model),
    ("Exif.Image.Orientation", Tag::Orientation),
];

/// Reads the raw file with the image-metadata reader and copies the
/// allow-listed fields into `picture.metadata`.
pub struct MetadataReader;

impl MetadataReader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one field's value as a plain string, without the quoting the
/// display form adds around ASCII values.
fn field_value(exif: &exif::Exif, tag: Tag) -> Option<String> {
    exif.get_field(tag, In::PRIMARY).map(|f| {
        f.display_value()
            .to_string()
            .trim_matches('"')
            .to_string()
    })
}

impl Worker for MetadataReader {
    fn name(&self) -> &'static str {
        "metadata"
    }

    fn process(&self, picture: &mut Picture, repo_root: &Path) -> Result<Option<Sidecar>> {
        let file = File::open(repo_root.join(picture.filename()))?;
        let mut reader = BufReader::new(file);
        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| PicError::WorkerFailed {
                worker: self.name().to_string(),
                filename: picture.filename().to_string(),
                reason: e.to_string(),
            })?;

        let mut copied = 0usize;
        for (key, tag) in ALLOW_LIST {
            if let Some(value) = field_value(&exif, *tag) {
                picture.metadata.insert((*key).to_string(), value);
                copied += 1;
            }
        }
        tracing::debug!(file = picture.filename(), copied, "metadata extracted");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // A minimal JPEG with an EXIF APP1 carrying Make = "pic".
    fn jpeg_with_make(dir: &Path) -> std::path::PathBuf {
        let tiff: Vec<u8> = [
            b"II*\x00\x08\x00\x00\x00".to_vec(), // little-endian TIFF header
            1u16.to_le_bytes().to_vec(),         // one IFD entry
            0x010fu16.to_le_bytes().to_vec(),    // Make
            2u16.to_le_bytes().to_vec(),         // ASCII
            4u32.to_le_bytes().to_vec(),         // count (fits inline)
            b"pic\x00".to_vec(),
            0u32.to_le_bytes().to_vec(), // no next IFD
        ]
        .concat();
        let mut app1 = b"Exif\x00\x00".to_vec();
        app1.extend_from_slice(&tiff);

        let mut jpeg = vec![0xFF, 0xD8]; // SOI
        jpeg.extend_from_slice(&[0xFF, 0xE1]);
        jpeg.extend_from_slice(&((app1.len() + 2) as u16).to_be_bytes());
        jpeg.extend_from_slice(&app1);
        jpeg.extend_from_slice(&[0xFF, 0xD9]); // EOI

        let path = dir.join("A.jpg");
        std::fs::write(&path, jpeg).unwrap();
        path
    }

    #[test]
    fn test_allow_listed_field_is_copied() {
        let tmp = tempfile::tempdir().unwrap();
        jpeg_with_make(tmp.path());

        let mut pic = Picture::new("A.jpg").unwrap();
        MetadataReader::new().process(&mut pic, tmp.path()).unwrap();
        assert_eq!(pic.metadata.get("Exif.Image.Make").map(String::as_str), Some("pic"));
        // Fields absent from the file stay absent from the map.
        assert!(!pic.metadata.contains_key("Exif.Photo.FNumber"));
    }

    #[test]
    fn test_file_without_exif_fails() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("A.NEF"), b"not an image").unwrap();
        let mut pic = Picture::new("A.NEF").unwrap();
        assert!(MetadataReader::new().process(&mut pic, tmp.path()).is_err());
    }
}
