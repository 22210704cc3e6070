//! Rendering: pure Rust, on top of the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Fit** | [`calculate_fit_rect`] (pure geometry) |
//! | **Filter chain** | [`apply_chain`]: color matrices + `image::imageops::blur` |
//! | **Transform + draw** | [`RasterSurface`] affine inverse mapping |
//! | **Export** | `image::codecs::png::PngEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry (unit testable)
//! - **Filters**: The typed [`FilterChain`] and its pixel implementation
//! - **Surface**: [`RenderSurface`] trait + [`RasterSurface`]
//! - **Operations**: [`render`] and [`export_png`], combining calculations + surface

mod calculations;
mod filters;
pub mod operations;
pub mod raster;
pub mod surface;

pub use calculations::{FitRect, calculate_fit_rect, normalize_rotation, snapped_sin_cos};
pub use filters::{FilterChain, FilterEffect, apply_chain};
pub use operations::{RenderPlan, export_png, plan_render, render};
pub use raster::RasterSurface;
pub use surface::{RenderSurface, SurfaceError};
