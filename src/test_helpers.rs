//! Shared test utilities for the retouch test suite.
//!
//! Synthetic image fixtures built in memory, so no test depends on files
//! checked into the repository.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let mut store = ImageStore::default();
//! store.load(&png_upload(40, 30, [255, 0, 0, 255])).unwrap();
//!
//! let source = quadrant_source(4, 4);
//! assert_eq!(source.pixels().get_pixel(3, 0).0, GREEN);
//! ```

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

use crate::store::{SourceImage, Upload};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

// =========================================================================
// In-memory images
// =========================================================================

/// Single-color image.
pub fn solid_image(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}

pub fn solid_source(width: u32, height: u32, color: [u8; 4]) -> SourceImage {
    SourceImage::from_rgba(solid_image(width, height, color))
}

/// Image split into four colored quadrants: red, green on top; blue, white
/// below. Any rotation or flip moves a distinct color into each corner.
pub fn quadrant_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let right = x >= width / 2;
        let bottom = y >= height / 2;
        Rgba(match (right, bottom) {
            (false, false) => RED,
            (true, false) => GREEN,
            (false, true) => BLUE,
            (true, true) => WHITE,
        })
    })
}

pub fn quadrant_source(width: u32, height: u32) -> SourceImage {
    SourceImage::from_rgba(quadrant_image(width, height))
}

// =========================================================================
// Encoded uploads
// =========================================================================

/// Encode `image` as PNG bytes. Panics on encoder failure.
pub fn encode_png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("PNG encoding of a test fixture failed");
    bytes.into_inner()
}

pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&solid_image(width, height, color))
}

/// A valid `image/png` upload of a solid-color image.
pub fn png_upload(width: u32, height: u32, color: [u8; 4]) -> Upload {
    Upload::new(png_bytes(width, height, color), "image/png")
}

/// A valid `image/png` upload of [`quadrant_image`].
pub fn quadrant_upload(width: u32, height: u32) -> Upload {
    Upload::new(encode_png(&quadrant_image(width, height)), "image/png")
}
