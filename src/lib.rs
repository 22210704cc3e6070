//! # Retouch
//!
//! The core of a raster image editor: load a local image, adjust brightness,
//! contrast, saturation, hue and blur, toggle stylistic filters, rotate or
//! flip in quarter turns, and export the result as PNG.
//!
//! # Architecture: Non-Destructive Render Loop
//!
//! Every control change re-renders from scratch:
//!
//! ```text
//! control event  →  Editor mutates AdjustmentState / ImageStore
//!                →  imaging::render(surface, source, state)
//!                →  surface shows the composed result
//! ```
//!
//! The source pixels are never modified. The adjustment state is a small
//! value object and the renderer is a function of (surface size, source,
//! state), so:
//!
//! - **Reset and revert are trivial**: clear the state and render again.
//! - **Renders are deterministic**: the same inputs produce the same raster.
//! - **Testability**: the render sequence can be asserted against a recording
//!   surface without touching pixels.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`store`] | Upload validation, decoding, current + original image, load sequencing |
//! | [`adjust`] | Sliders, toggle filters, quarter-turn transform; builds the filter chain |
//! | [`imaging`] | Fit geometry, filter chain pixels, render surface, render + export operations |
//! | [`editor`] | Facade owning store, state, surface and export sink |
//! | [`viewport`] | Validated surface dimensions |
//! | [`config`] | `config.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Typed Filter Chain
//!
//! The chain is a list of [`imaging::FilterEffect`] values, not a string.
//! The familiar CSS text (`brightness(120%) sepia(100%)`) is produced on demand
//! for logs and CLI output. The order is fixed: the five sliders first, then
//! the active toggles in declaration order, whatever order they were switched
//! on in.
//!
//! ## Injected Collaborators
//!
//! The editor never knows where pixels end up. It draws on a
//! [`imaging::RenderSurface`] and hands PNG bytes to an
//! [`editor::ExportSink`], both passed in at construction. The bundled
//! [`imaging::RasterSurface`] is a pure-Rust software canvas on top of the
//! `image` crate.
//!
//! ## Newest Upload Wins
//!
//! Decoding is the only step that may run off the calling thread. Each
//! accepted upload takes a ticket, and only the newest ticket may commit, so
//! a slow decode can never replace a newer image.

pub mod adjust;
pub mod config;
pub mod editor;
pub mod imaging;
pub mod output;
pub mod store;
pub mod viewport;

#[cfg(test)]
pub(crate) mod test_helpers;
