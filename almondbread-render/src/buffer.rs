use image::RgbaImage;

use crate::error::RenderError;

/// Bytes per pixel: R, G, B, A.
pub const BYTES_PER_PIXEL: usize = 4;

/// An RGBA8 pixel buffer representing a rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order, alpha last.
    pub pixels: Vec<u8>,
}

impl PixelBuffer {
    /// Create a new buffer filled with opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; Self::byte_len(width, height)];
        for chunk in pixels.chunks_exact_mut(BYTES_PER_PIXEL) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// Expected byte length for a `width × height` image.
    #[inline]
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * BYTES_PER_PIXEL
    }

    /// Wrap persisted pixel bytes, rejecting any length mismatch.
    pub fn from_bytes(width: u32, height: u32, pixels: Vec<u8>) -> crate::Result<Self> {
        let expected = Self::byte_len(width, height);
        if pixels.len() != expected {
            return Err(RenderError::CorruptBuffer {
                kind: "pixel",
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// The RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let px = self.pixels.get(idx..idx + BYTES_PER_PIXEL)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Convert into an `image` RGBA image (8 bits per channel, sRGB).
    pub fn into_image(self) -> crate::Result<RgbaImage> {
        let (width, height, actual) = (self.width, self.height, self.pixels.len());
        RgbaImage::from_raw(width, height, self.pixels).ok_or(RenderError::CorruptBuffer {
            kind: "pixel",
            expected: Self::byte_len(width, height),
            actual,
        })
    }

    /// Take the pixels of a decoded RGBA image.
    pub fn from_image(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            width,
            height,
            pixels: image.into_raw(),
        }
    }
}
