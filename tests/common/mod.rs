#![allow(dead_code)]

use image::{ImageFormat, Rgba, RgbaImage};
use retouch::editor::ExportSink;
use retouch::store::Upload;
use std::io::{self, Cursor};

pub const RED: [u8; 4] = [255, 0, 0, 255];
pub const GREEN: [u8; 4] = [0, 255, 0, 255];
pub const BLUE: [u8; 4] = [0, 0, 255, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Four colored quadrants: red, green on top; blue, white below.
pub fn quadrant_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba(match (x >= width / 2, y >= height / 2) {
            (false, false) => RED,
            (true, false) => GREEN,
            (false, true) => BLUE,
            (true, true) => WHITE,
        })
    })
}

/// Encode `image` in `format`.
pub fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, format)
        .expect("encoding a test fixture failed");
    bytes.into_inner()
}

pub fn quadrant_png(width: u32, height: u32) -> Upload {
    Upload::new(encode(&quadrant_image(width, height), ImageFormat::Png), "image/png")
}

pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Upload {
    let image = RgbaImage::from_pixel(width, height, Rgba(color));
    Upload::new(encode(&image, ImageFormat::Png), "image/png")
}

/// Export sink that keeps deliveries in memory.
#[derive(Default)]
pub struct MemorySink {
    pub deliveries: Vec<(String, Vec<u8>)>,
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<()> {
        self.deliveries.push((file_name.to_string(), bytes.to_vec()));
        Ok(())
    }
}

/// Decode exported PNG bytes back to RGBA.
pub fn decode_png(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .expect("export is not a valid PNG")
        .to_rgba8()
}
