//! Menu photo collection before submission.

use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use image::{
    metadata::Orientation, DynamicImage, GenericImageView, ImageDecoder, ImageError, ImageFormat,
    ImageReader, ImageResult,
};
use shared::{domain::ImageId, protocol::ImagePayload};
use thiserror::Error;
use tracing::{debug, info};

/// Media types the bundled decoder understands; anything else is sent untouched.
const DECODABLE_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("failed to read image '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("'{label}' is not an image (media type {media_type})")]
    NotAnImage { label: String, media_type: String },
    #[error("image '{label}' is empty")]
    Empty { label: String },
    #[error("failed to decode image '{label}': {source}")]
    Decode {
        label: String,
        source: image::ImageError,
    },
    #[error("failed to re-encode image '{label}': {source}")]
    Encode {
        label: String,
        source: image::ImageError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureOptions {
    /// Longest edge in pixels before a photo is downscaled; `0` disables resizing.
    pub max_edge: u32,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self { max_edge: 2048 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub id: ImageId,
    pub payload: ImagePayload,
    /// Where the photo came from, shown next to it in the capture list.
    pub preview: String,
    pub encoded_bytes: usize,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct ImageCapture {
    images: Vec<CapturedImage>,
    next_id: i64,
    options: CaptureOptions,
}

impl ImageCapture {
    pub fn new(options: CaptureOptions) -> Self {
        Self {
            images: Vec::new(),
            next_id: 0,
            options,
        }
    }

    /// Media type comes from the extension, or from the file's content when the
    /// extension is missing or not an image type.
    pub fn add_file(&mut self, path: &Path) -> Result<ImageId, CaptureError> {
        let label = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| CaptureError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let guessed = mime_guess::from_path(path)
            .first_raw()
            .filter(|media_type| media_type.starts_with("image/"));
        let media_type = match guessed {
            Some(media_type) => media_type,
            None => match image::guess_format(&bytes) {
                Ok(format) => format.to_mime_type(),
                Err(_) => {
                    return Err(CaptureError::NotAnImage {
                        label,
                        media_type: mime_guess::from_path(path)
                            .first_raw()
                            .unwrap_or("application/octet-stream")
                            .to_string(),
                    })
                }
            },
        };
        self.add_bytes(bytes, media_type, label)
    }

    pub fn add_bytes(
        &mut self,
        bytes: Vec<u8>,
        media_type: &str,
        preview: impl Into<String>,
    ) -> Result<ImageId, CaptureError> {
        let preview = preview.into();
        let media_type = media_type.trim().to_ascii_lowercase();
        if !media_type.starts_with("image/") {
            return Err(CaptureError::NotAnImage {
                label: preview,
                media_type,
            });
        }
        if bytes.is_empty() {
            return Err(CaptureError::Empty { label: preview });
        }

        let (bytes, media_type) =
            normalize_image(bytes, media_type, self.options.max_edge, &preview)?;

        self.next_id += 1;
        let id = ImageId(self.next_id);
        info!(
            image_id = id.0,
            media_type = %media_type,
            bytes = bytes.len(),
            preview = %preview,
            "capture: image added"
        );
        self.images.push(CapturedImage {
            id,
            payload: ImagePayload {
                media_type,
                data_b64: STANDARD.encode(&bytes),
            },
            preview,
            encoded_bytes: bytes.len(),
            captured_at: Utc::now(),
        });
        Ok(id)
    }

    pub fn remove(&mut self, id: ImageId) -> Option<CapturedImage> {
        let index = self.images.iter().position(|image| image.id == id)?;
        debug!(image_id = id.0, "capture: image removed");
        Some(self.images.remove(index))
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[CapturedImage] {
        &self.images
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Payloads in capture order, i.e. menu page order.
    pub fn payloads(&self) -> Vec<ImagePayload> {
        self.images
            .iter()
            .map(|image| image.payload.clone())
            .collect()
    }
}

/// Downscales oversized photos and re-encodes them as JPEG.
fn normalize_image(
    bytes: Vec<u8>,
    media_type: String,
    max_edge: u32,
    label: &str,
) -> Result<(Vec<u8>, String), CaptureError> {
    if max_edge == 0 || !DECODABLE_MEDIA_TYPES.contains(&media_type.as_str()) {
        return Ok((bytes, media_type));
    }

    let decoded = decode_upright(&bytes).map_err(|source| CaptureError::Decode {
        label: label.to_string(),
        source,
    })?;
    let (orig_w, orig_h) = decoded.dimensions();
    let longest = orig_w.max(orig_h);
    if longest <= max_edge {
        return Ok((bytes, media_type));
    }

    let scale = max_edge as f32 / longest as f32;
    let resized = decoded.resize(
        ((orig_w as f32 * scale).round() as u32).max(1),
        ((orig_h as f32 * scale).round() as u32).max(1),
        image::imageops::FilterType::Triangle,
    );
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut out = Cursor::new(Vec::new());
    rgb.write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|source| CaptureError::Encode {
            label: label.to_string(),
            source,
        })?;
    debug!(
        from_w = orig_w,
        from_h = orig_h,
        to_w = rgb.width(),
        to_h = rgb.height(),
        "capture: downscaled oversized photo"
    );
    Ok((out.into_inner(), "image/jpeg".to_string()))
}

/// Decodes and applies the EXIF orientation, since the JPEG we re-encode carries no EXIF.
fn decode_upright(bytes: &[u8]) -> ImageResult<DynamicImage> {
    let mut decoder = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(ImageError::IoError)?
        .into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);
    let mut decoded = DynamicImage::from_decoder(decoder)?;
    decoded.apply_orientation(orientation);
    Ok(decoded)
}

#[cfg(test)]
#[path = "tests/capture_tests.rs"]
mod tests;
