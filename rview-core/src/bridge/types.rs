//! Shared pixel types used between the frame source and the encoder.
//!
//! Renderers hand back RGBA rows with a bottom-left origin. Everything
//! downstream of [`RawPixels::from_bottom_up_rgba`] is top-left origin,
//! tightly packed, with no row padding.

use crate::error::BridgeError;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a [`RawPixels`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }

    pub const fn has_alpha(self) -> bool {
        matches!(self, PixelFormat::Rgba8)
    }
}

// ── RawPixels ────────────────────────────────────────────────────

/// An uncompressed frame in screen space (row 0 is the top row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPixels {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// `width * height * bpp` bytes, top row first.
    pub data: Vec<u8>,
}

impl RawPixels {
    /// Convert a renderer readback (RGBA, bottom row first) into screen
    /// space, dropping the alpha channel unless `keep_alpha` is set.
    pub fn from_bottom_up_rgba(
        width: u32,
        height: u32,
        rgba: &[u8],
        keep_alpha: bool,
    ) -> Result<Self, BridgeError> {
        let row_in = width as usize * 4;
        let expected = row_in * height as usize;
        if rgba.len() < expected {
            return Err(BridgeError::RenderFailure(format!(
                "pixel buffer too small: {} < {expected}",
                rgba.len()
            )));
        }

        let format = if keep_alpha {
            PixelFormat::Rgba8
        } else {
            PixelFormat::Rgb8
        };
        let mut data = Vec::with_capacity(width as usize * height as usize * format.bytes_per_pixel());

        for row in rgba[..expected].chunks_exact(row_in).rev() {
            if keep_alpha {
                data.extend_from_slice(row);
            } else {
                for px in row.chunks_exact(4) {
                    data.extend_from_slice(&px[..3]);
                }
            }
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Total byte size of the pixel data.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Returns the pixel bytes at `(x, y)`, or `None` when out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let bpp = self.format.bytes_per_pixel();
        let offset = (y as usize * self.width as usize + x as usize) * bpp;
        self.data.get(offset..offset + bpp)
    }
}
