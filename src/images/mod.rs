use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{GenericImageView, ImageEncoder};
use tempfile::NamedTempFile;
use thiserror::Error;

/// Every stored image is re-encoded to JPEG at this quality. The encoder
/// writes full-resolution chroma (no subsampling), which keeps text in
/// product screenshots legible.
pub const JPEG_QUALITY: u8 = 80;

/// Default bounding box for stored images.
pub const DEFAULT_MAX_DIMENSION: u32 = 1024;

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("not a decodable image: {0}")]
    Invalid(#[source] image::ImageError),
    #[error("image encoding failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A normalized upload: bounded, JPEG-encoded, ready to persist.
#[derive(Debug)]
pub struct EncodedImage {
    jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Converts uploads into normalized JPEG files named after the owning
/// item's id.
pub struct ImagePipeline {
    dir: PathBuf,
    max_dimension: u32,
}

impl ImagePipeline {
    pub fn new(dir: impl Into<PathBuf>, max_dimension: u32) -> Result<Self, ImageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_dimension })
    }

    /// Decode, bound and re-encode an upload without touching disk.
    ///
    /// Undecodable bytes fail with `Invalid` before any state changes, so
    /// callers can reject a request without cleanup.
    pub fn process(&self, bytes: &[u8]) -> Result<EncodedImage, ImageError> {
        let img = image::load_from_memory(bytes).map_err(ImageError::Invalid)?;
        let (width, height) = img.dimensions();
        let (target_w, target_h) = bounded_dimensions(width, height, self.max_dimension);
        let img = if (target_w, target_h) != (width, height) {
            img.resize_exact(target_w, target_h, FilterType::Lanczos3)
        } else {
            img
        };

        // JPEG carries no alpha channel; flatten to RGB before encoding.
        let rgb = img.to_rgb8();
        let mut jpeg = Vec::new();
        JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .write_image(rgb.as_raw(), target_w, target_h, image::ExtendedColorType::Rgb8)
            .map_err(ImageError::Encode)?;

        Ok(EncodedImage {
            jpeg,
            width: target_w,
            height: target_h,
        })
    }

    /// Persist a processed image under `<id>.jpeg`, atomically replacing
    /// any previous file for the id. The write lands in a unique temp
    /// file first, so a concurrent reader never observes a partial file.
    pub fn save(&self, encoded: &EncodedImage, id: i64) -> Result<String, ImageError> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&encoded.jpeg)?;
        tmp.persist(self.file_path(id))
            .map_err(|e| ImageError::Io(e.error))?;
        Ok(reference_path(id))
    }

    /// Normalize and persist in one step. Returns the reference path the
    /// caller stores on the owning item.
    pub fn store(&self, bytes: &[u8], id: i64) -> Result<String, ImageError> {
        let encoded = self.process(bytes)?;
        self.save(&encoded, id)
    }

    /// Best-effort removal of the file for `id`. Absence is a no-op;
    /// any other failure is logged and swallowed, since the item
    /// document remains the source of truth.
    pub fn delete(&self, id: i64) {
        match fs::remove_file(self.file_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => log::warn!("failed to delete image for item {}: {}", id, e),
        }
    }

    pub fn file_path(&self, id: i64) -> PathBuf {
        self.dir.join(format!("{id}.jpeg"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reference path clients use to fetch the image for `id`.
pub fn reference_path(id: i64) -> String {
    format!("/api/images/{id}.jpeg")
}

/// Fit `(width, height)` into a `max` square, preserving aspect ratio and
/// rounding to the nearest pixel. Images already inside the box keep
/// their dimensions; this never upscales.
pub fn bounded_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }
    if width >= height {
        let h = (height as f64 * max as f64 / width as f64).round() as u32;
        (max, h.max(1))
    } else {
        let w = (width as f64 * max as f64 / height as f64).round() as u32;
        (w.max(1), max)
    }
}
