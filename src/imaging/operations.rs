//! High-level render and export operations.
//!
//! These functions combine calculations with surface execution. They take
//! the editing state, compute a [`RenderPlan`], and replay it onto a
//! [`RenderSurface`].

use super::calculations::{FitRect, calculate_fit_rect};
use super::filters::FilterChain;
use super::surface::{RenderSurface, SurfaceError};
use crate::adjust::AdjustmentState;
use crate::store::SourceImage;
use crate::viewport::Viewport;
use tracing::debug;

/// Result type for surface operations.
pub type Result<T> = std::result::Result<T, SurfaceError>;

/// Everything needed to draw one frame, computed without touching pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderPlan {
    pub fit: FitRect,
    /// Pivot of the geometric transform (viewport center).
    pub center: (f64, f64),
    /// Rotation in `[0, 360)`.
    pub rotation_degrees: i64,
    pub flip_x: bool,
    pub flip_y: bool,
    pub chain: FilterChain,
}

/// Plan a render without executing it.
pub fn plan_render(
    image_dims: (u32, u32),
    viewport: Viewport,
    state: &AdjustmentState,
) -> RenderPlan {
    RenderPlan {
        fit: calculate_fit_rect(image_dims, viewport.dimensions()),
        center: viewport.center(),
        rotation_degrees: state.normalized_rotation(),
        flip_x: state.flip_x(),
        flip_y: state.flip_y(),
        chain: state.filter_chain(),
    }
}

/// Draw `source` onto `surface` with every adjustment in `state` applied.
///
/// Without a source the surface is left untouched and `None` is returned.
/// Each call starts from a cleared surface and the unmodified source pixels,
/// so repeating it with the same inputs yields the same raster.
pub fn render<S: RenderSurface + ?Sized>(
    surface: &mut S,
    source: Option<&SourceImage>,
    state: &AdjustmentState,
) -> Result<Option<RenderPlan>> {
    let Some(source) = source else {
        return Ok(None);
    };
    let plan = plan_render(source.dimensions(), surface.size(), state);
    debug!(
        chain = %plan.chain,
        fit_w = plan.fit.width,
        fit_h = plan.fit.height,
        rotation = plan.rotation_degrees,
        flip_x = plan.flip_x,
        flip_y = plan.flip_y,
        "render"
    );

    let (cx, cy) = plan.center;
    surface.clear();
    surface.save();
    surface.translate(cx, cy);
    surface.rotate((plan.rotation_degrees as f64).to_radians());
    if plan.flip_x {
        surface.scale(-1.0, 1.0);
    }
    if plan.flip_y {
        surface.scale(1.0, -1.0);
    }
    surface.translate(-cx, -cy);
    let drawn = surface.draw_image(source.pixels(), plan.fit, &plan.chain);
    // Balance the save even when the draw fails.
    surface.restore();
    drawn?;

    Ok(Some(plan))
}

/// Encode whatever the surface currently shows as PNG.
pub fn export_png<S: RenderSurface + ?Sized>(surface: &S) -> Result<Vec<u8>> {
    surface.encode_png()
}
