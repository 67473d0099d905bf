//! Frame encoder: raw screen-space pixels → transportable image bytes.
//!
//! Opaque frames (RGB) are JPEG-compressed at the configured quality.
//! Frames that keep their alpha channel are written as PNG, since JPEG
//! cannot carry transparency.
//!
//! The encoder holds only its validated [`Quality`], so a single instance
//! can be shared and called concurrently on distinct frames.

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::bridge::types::{PixelFormat, RawPixels};
use crate::error::BridgeError;

// ── Quality ──────────────────────────────────────────────────────

/// Compression quality, 0 (smallest) to 100 (best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quality(u8);

impl Quality {
    pub const DEFAULT: Quality = Quality(80);

    /// Validate a user-supplied quality value.
    pub fn new(value: i32) -> Result<Self, BridgeError> {
        if !(0..=100).contains(&value) {
            return Err(BridgeError::config(format!(
                "quality must be between 0 and 100, got {value}"
            )));
        }
        Ok(Quality(value as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for Quality {
    type Error = BridgeError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

// ── ImageFormat ──────────────────────────────────────────────────

/// Image container used for a delivered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageFormat {
    /// Lossy, honours [`Quality`].
    #[default]
    Jpeg,
    /// Lossless, keeps alpha.
    Png,
}

impl ImageFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageFormat::Jpeg => write!(f, "jpeg"),
            ImageFormat::Png => write!(f, "png"),
        }
    }
}

// ── EncodedImage ─────────────────────────────────────────────────

/// A compressed frame ready for the display host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    /// Sequential frame number within the session.
    pub frame_number: u64,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    pub format: ImageFormat,
    /// Encoded image bytes.
    pub data: Bytes,
}

// ── FrameEncoder ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder {
    quality: Quality,
}

impl FrameEncoder {
    pub fn new(quality: Quality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Container chosen for frames of the given layout.
    pub fn format_for(pixel_format: PixelFormat) -> ImageFormat {
        if pixel_format.has_alpha() {
            ImageFormat::Png
        } else {
            ImageFormat::Jpeg
        }
    }

    /// Compress `pixels` into a standalone image.
    pub fn encode(&self, pixels: &RawPixels) -> Result<(ImageFormat, Vec<u8>), BridgeError> {
        let expected = pixels.width as usize * pixels.height as usize * pixels.format.bytes_per_pixel();
        if pixels.data.len() != expected {
            return Err(BridgeError::EncodeFailure(format!(
                "pixel buffer is {} bytes, expected {expected}",
                pixels.data.len()
            )));
        }

        let format = Self::format_for(pixels.format);
        let mut out = Vec::new();
        match format {
            ImageFormat::Jpeg => {
                // The JPEG quantiser bottoms out at 1.
                let q = self.quality.get().max(1);
                JpegEncoder::new_with_quality(&mut out, q).write_image(
                    &pixels.data,
                    pixels.width,
                    pixels.height,
                    ExtendedColorType::Rgb8,
                )?;
            }
            ImageFormat::Png => {
                PngEncoder::new(&mut out).write_image(
                    &pixels.data,
                    pixels.width,
                    pixels.height,
                    ExtendedColorType::Rgba8,
                )?;
            }
        }
        Ok((format, out))
    }
}

// ── Tests ────────────────────────────────────────────────────────
