//! Software render surface on top of the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Backing store | `image::RgbaImage` (straight alpha) |
//! | Resample to fit size | `image::imageops::resize` with `Triangle` |
//! | Color effects | [`apply_chain`](super::filters::apply_chain), rayon over pixels |
//! | Blur effects | `image::imageops::blur` |
//! | Affine draw | inverse-mapped nearest sampling, rayon over rows |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |

use super::calculations::{FitRect, snapped_sin_cos};
use super::filters::{FilterChain, apply_chain};
use super::surface::{RenderSurface, SurfaceError};
use crate::viewport::Viewport;
use image::codecs::png::PngEncoder;
use image::imageops::{self, FilterType};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use rayon::prelude::*;

/// 2D affine matrix in canvas layout: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Affine {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
    e: f64,
    f: f64,
}

impl Affine {
    const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    fn translate(&mut self, tx: f64, ty: f64) {
        self.e += self.a * tx + self.c * ty;
        self.f += self.b * tx + self.d * ty;
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.a *= sx;
        self.b *= sx;
        self.c *= sy;
        self.d *= sy;
    }

    fn rotate(&mut self, radians: f64) {
        let (sin, cos) = snapped_sin_cos(radians);
        let Affine { a, b, c, d, .. } = *self;
        self.a = a * cos + c * sin;
        self.b = b * cos + d * sin;
        self.c = c * cos - a * sin;
        self.d = d * cos - b * sin;
    }

    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    fn invert(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }
}

/// CPU raster surface.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RasterSurface {
    viewport: Viewport,
    canvas: RgbaImage,
    matrix: Affine,
    saved: Vec<Affine>,
}

impl RasterSurface {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            canvas: RgbaImage::new(viewport.width(), viewport.height()),
            matrix: Affine::IDENTITY,
            saved: Vec::new(),
        }
    }

    /// Current raster contents.
    pub fn pixels(&self) -> &RgbaImage {
        &self.canvas
    }
}

impl RenderSurface for RasterSurface {
    fn size(&self) -> Viewport {
        self.viewport
    }

    fn set_size(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.canvas = RgbaImage::new(viewport.width(), viewport.height());
        self.matrix = Affine::IDENTITY;
        self.saved.clear();
    }

    fn clear(&mut self) {
        let raw: &mut [u8] = &mut self.canvas;
        raw.fill(0);
    }

    fn save(&mut self) {
        self.saved.push(self.matrix);
    }

    fn restore(&mut self) {
        if let Some(matrix) = self.saved.pop() {
            self.matrix = matrix;
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        self.matrix.translate(dx, dy);
    }

    fn rotate(&mut self, radians: f64) {
        self.matrix.rotate(radians);
    }

    fn scale(&mut self, sx: f64, sy: f64) {
        self.matrix.scale(sx, sy);
    }

    fn draw_image(
        &mut self,
        image: &RgbaImage,
        dest: FitRect,
        filters: &FilterChain,
    ) -> Result<(), SurfaceError> {
        let (target_w, target_h) = dest.pixel_size();
        if target_w == 0 || target_h == 0 || image.width() == 0 || image.height() == 0 {
            return Ok(());
        }
        let inverse = self
            .matrix
            .invert()
            .ok_or_else(|| SurfaceError::Draw("current transform is not invertible".into()))?;

        let mut layer = if image.dimensions() == (target_w, target_h) {
            image.clone()
        } else {
            imageops::resize(image, target_w, target_h, FilterType::Triangle)
        };
        apply_chain(&mut layer, filters);

        let row_len = self.canvas.width() as usize * 4;
        let step_x = target_w as f64 / dest.width;
        let step_y = target_h as f64 / dest.height;
        let raw: &mut [u8] = &mut self.canvas;

        raw.par_chunks_exact_mut(row_len)
            .enumerate()
            .for_each(|(row, pixels)| {
                let py = row as f64 + 0.5;
                for (col, px) in pixels.chunks_exact_mut(4).enumerate() {
                    let (u, v) = inverse.apply(col as f64 + 0.5, py);
                    if !dest.contains(u, v) {
                        continue;
                    }
                    let sx = (((u - dest.x) * step_x) as u32).min(target_w - 1);
                    let sy = (((v - dest.y) * step_y) as u32).min(target_h - 1);
                    blend_over(px, layer.get_pixel(sx, sy).0);
                }
            });

        Ok(())
    }

    fn encode_png(&self) -> Result<Vec<u8>, SurfaceError> {
        let mut bytes = Vec::new();
        let (w, h) = self.canvas.dimensions();
        PngEncoder::new(&mut bytes)
            .write_image(self.canvas.as_raw(), w, h, ExtendedColorType::Rgba8)
            .map_err(|e| SurfaceError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}

/// Source-over compositing of a straight-alpha pixel onto `dst`.
fn blend_over(dst: &mut [u8], src: [u8; 4]) {
    match src[3] {
        0 => {}
        255 => dst.copy_from_slice(&src),
        alpha => {
            let sa = f32::from(alpha) / 255.0;
            let da = f32::from(dst[3]) / 255.0 * (1.0 - sa);
            let out_a = sa + da;
            for i in 0..3 {
                let c = (f32::from(src[i]) * sa + f32::from(dst[i]) * da) / out_a;
                dst[i] = c.round().clamp(0.0, 255.0) as u8;
            }
            dst[3] = (out_a * 255.0).round() as u8;
        }
    }
}
