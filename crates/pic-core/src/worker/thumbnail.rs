//! Embedded thumbnail extraction.
//!
//! Raw containers usually carry one or more reduced-size JPEG previews,
//! addressed by the JPEG interchange offset/length fields of their IFDs.
//! The worker extracts the largest one by pixel area and, when
//! configured, carries the raw's metadata over onto the extracted file
//! with the compression tag reset for the new container.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::ImageFormat;

use crate::config::ThumbnailsConfig;
use crate::error::{PicError, Result};
use crate::picture::{ContentType, Picture, Sidecar};

use super::Worker;

/// Old-style JPEG compression, the correct tag value for an extracted
/// JPEG preview (TIFF tag 0x0103).
const COMPRESSION_JPEG: u16 = 6;

/// Largest EXIF payload that still fits a JPEG APP1 segment.
const MAX_APP1_PAYLOAD: usize = 65533 - 6;

/// Extracts the largest embedded preview into the thumbnail sidecar dir.
pub struct ThumbExtractor {
    sidecar_dir: String,
    copy_metadata: bool,
}

struct PreviewCandidate<'a> {
    bytes: &'a [u8],
    area: u64,
    format: ImageFormat,
}

impl ThumbExtractor {
    pub fn new(config: &ThumbnailsConfig) -> Self {
        Self {
            sidecar_dir: config.sidecar_dir.clone(),
            copy_metadata: config.copy_metadata,
        }
    }

    fn failed(&self, picture: &Picture, reason: impl std::fmt::Display) -> PicError {
        PicError::WorkerFailed {
            worker: self.name().to_string(),
            filename: picture.filename().to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Pull the preview addressed by one IFD's interchange fields out of the
/// raw EXIF buffer, if present and decodable.
fn candidate_in<'a>(exif: &'a exif::Exif, ifd: In) -> Option<PreviewCandidate<'a>> {
    let offset = exif
        .get_field(Tag::JPEGInterchangeFormat, ifd)?
        .value
        .get_uint(0)? as usize;
    let length = exif
        .get_field(Tag::JPEGInterchangeFormatLength, ifd)?
        .value
        .get_uint(0)? as usize;
    let bytes = exif.buf().get(offset..offset + length)?;

    let format = image::guess_format(bytes).ok()?;
    let image = image::load_from_memory(bytes).ok()?;
    Some(PreviewCandidate {
        bytes,
        area: u64::from(image.width()) * u64::from(image.height()),
        format,
    })
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Png => "png",
        ImageFormat::Tiff => "tif",
        _ => "img",
    }
}

/// Reset the IFD0 compression tag (0x0103, SHORT) in a raw TIFF-structured
/// EXIF buffer. Leaves the buffer untouched when the tag is absent.
pub(crate) fn reset_compression_tag(buf: &mut [u8]) {
    let little = match buf.get(..2) {
        Some(b"II") => true,
        Some(b"MM") => false,
        _ => return,
    };
    let read_u16 = |b: &[u8], at: usize| -> Option<u16> {
        let raw: [u8; 2] = b.get(at..at + 2)?.try_into().ok()?;
        Some(if little {
            u16::from_le_bytes(raw)
        } else {
            u16::from_be_bytes(raw)
        })
    };
    let read_u32 = |b: &[u8], at: usize| -> Option<u32> {
        let raw: [u8; 4] = b.get(at..at + 4)?.try_into().ok()?;
        Some(if little {
            u32::from_le_bytes(raw)
        } else {
            u32::from_be_bytes(raw)
        })
    };

    let Some(ifd0) = read_u32(buf, 4).map(|v| v as usize) else {
        return;
    };
    let Some(count) = read_u16(buf, ifd0) else {
        return;
    };
    for i in 0..count as usize {
        let entry = ifd0 + 2 + i * 12;
        let (Some(tag), Some(kind)) = (read_u16(buf, entry), read_u16(buf, entry + 2)) else {
            return;
        };
        // 0x0103 Compression, type 3 = SHORT
        if tag == 0x0103 && kind == 3 {
            let value = if little {
                COMPRESSION_JPEG.to_le_bytes()
            } else {
                COMPRESSION_JPEG.to_be_bytes()
            };
            if let Some(slot) = buf.get_mut(entry + 8..entry + 10) {
                slot.copy_from_slice(&value);
            }
            return;
        }
    }
}

/// Splice an EXIF block into a JPEG as its APP1 segment, replacing any
/// existing EXIF APP1. Returns `None` if the data is not a JPEG or the
/// block does not fit a segment.
pub(crate) fn embed_exif(jpeg: &[u8], exif_buf: &[u8]) -> Option<Vec<u8>> {
    if jpeg.len() < 2 || jpeg[..2] != [0xFF, 0xD8] || exif_buf.len() > MAX_APP1_PAYLOAD {
        return None;
    }

    let mut out = Vec::with_capacity(jpeg.len() + exif_buf.len() + 10);
    out.extend_from_slice(&[0xFF, 0xD8]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((exif_buf.len() + 8) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\x00\x00");
    out.extend_from_slice(exif_buf);

    // Copy the remaining segments, dropping any pre-existing EXIF APP1.
    let mut pos = 2;
    while pos + 4 <= jpeg.len() && jpeg[pos] == 0xFF && (0xE0..=0xEF).contains(&jpeg[pos + 1]) {
        let len = u16::from_be_bytes([jpeg[pos + 2], jpeg[pos + 3]]) as usize;
        let end = (pos + 2 + len).min(jpeg.len());
        let is_exif =
            jpeg[pos + 1] == 0xE1 && jpeg.get(pos + 4..pos + 10) == Some(b"Exif\x00\x00");
        if !is_exif {
            out.extend_from_slice(&jpeg[pos..end]);
        }
        pos = end;
    }
    out.extend_from_slice(&jpeg[pos..]);
    Some(out)
}

impl Worker for ThumbExtractor {
    fn name(&self) -> &'static str {
        "thumbnail"
    }

    fn process(&self, picture: &mut Picture, repo_root: &Path) -> Result<Option<Sidecar>> {
        let file = File::open(repo_root.join(picture.filename()))?;
        let mut reader = BufReader::new(file);
        let exif = Reader::new()
            .read_from_container(&mut reader)
            .map_err(|e| self.failed(picture, e))?;

        let best = [In::PRIMARY, In::THUMBNAIL]
            .into_iter()
            .filter_map(|ifd| candidate_in(&exif, ifd))
            .max_by_key(|c| c.area)
            .ok_or_else(|| self.failed(picture, "no embedded preview"))?;

        let extension = extension_for(best.format);
        let mut output = best.bytes.to_vec();
        if self.copy_metadata && best.format == ImageFormat::Jpeg {
            let mut exif_buf = exif.buf().to_vec();
            reset_compression_tag(&mut exif_buf);
            match embed_exif(&output, &exif_buf) {
                Some(with_exif) => output = with_exif,
                None => tracing::warn!(
                    file = picture.filename(),
                    "EXIF block too large for the extracted preview, not copied"
                ),
            }
        }

        fs::create_dir_all(repo_root.join(&self.sidecar_dir))?;
        let sidecar_path = format!(
            "{}/{}.thumb.{}",
            self.sidecar_dir,
            picture.basename(),
            extension
        );
        fs::write(repo_root.join(&sidecar_path), &output)?;
        tracing::debug!(
            file = picture.filename(),
            thumb = sidecar_path,
            area = best.area,
            "extracted preview"
        );

        Ok(Some(Sidecar {
            path: sidecar_path,
            content_type: ContentType::Thumbnail,
        }))
    }
}
