//! Render surface trait and shared types.
//!
//! The [`RenderSurface`] trait is the drawing target the renderer is handed:
//! a resizable pixel area with a 2D context that supports clearing, affine
//! transforms with save/restore, filter-tagged image draws, and PNG export.
//!
//! The production implementation is
//! [`RasterSurface`](super::raster::RasterSurface), a software rasterizer on
//! top of the `image` crate. Tests use a recording mock.

use super::calculations::FitRect;
use super::filters::FilterChain;
use crate::viewport::Viewport;
use image::RgbaImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SurfaceError {
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Drawing failed: {0}")]
    Draw(String),
}

/// Drawable target with a 2D context.
///
/// Transform calls compose onto the current matrix in call order, the same
/// way a canvas context does: the last call applies to the drawn geometry
/// first.
pub trait RenderSurface {
    /// Current pixel dimensions.
    fn size(&self) -> Viewport;

    /// Resize the pixel area. Contents are cleared and the transform state
    /// is reset.
    fn set_size(&mut self, viewport: Viewport);

    /// Clear every pixel to transparent. The transform is left alone.
    fn clear(&mut self);

    /// Push the current transform.
    fn save(&mut self);

    /// Pop the last saved transform. No-op on an empty stack.
    fn restore(&mut self);

    fn translate(&mut self, dx: f64, dy: f64);

    /// Rotate clockwise (in screen coordinates) by `radians`.
    fn rotate(&mut self, radians: f64);

    fn scale(&mut self, sx: f64, sy: f64);

    /// Draw `image` scaled into `dest` through the current transform, with
    /// `filters` applied to the drawn pixels.
    fn draw_image(
        &mut self,
        image: &RgbaImage,
        dest: FitRect,
        filters: &FilterChain,
    ) -> Result<(), SurfaceError>;

    /// Serialize the visible raster as PNG.
    fn encode_png(&self) -> Result<Vec<u8>, SurfaceError>;
}
